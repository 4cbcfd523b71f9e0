use crate::models::{Activity, ActivityPatch, NewActivity};
use sqlx::error::ErrorKind;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, SqlitePool};
use std::path::Path;
use thiserror::Error;
use tokio::fs;
use tracing::info;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS activities (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    category TEXT NOT NULL,
    title TEXT NOT NULL UNIQUE,
    description TEXT NOT NULL,
    completion_count INTEGER NOT NULL DEFAULT 0 CHECK (completion_count >= 0)
)";

const RETURNING: &str = "RETURNING id, category, title, description, completion_count";

// Primary SQLite result codes that mean the store refused the write.
const SQLITE_PERM: i32 = 3;
const SQLITE_READONLY: i32 = 8;
const SQLITE_AUTH: i32 = 23;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("query failed: {0}")]
    Query(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) => {
                if db.kind() == ErrorKind::UniqueViolation {
                    return StoreError::Conflict(db.message().to_string());
                }
                let primary = db
                    .code()
                    .and_then(|code| code.parse::<i32>().ok())
                    .map(|code| code & 0xff);
                if matches!(primary, Some(SQLITE_PERM | SQLITE_READONLY | SQLITE_AUTH)) {
                    return StoreError::PermissionDenied(db.message().to_string());
                }
                StoreError::Query(err)
            }
            sqlx::Error::Io(io) if io.kind() == std::io::ErrorKind::PermissionDenied => {
                StoreError::PermissionDenied(io.to_string())
            }
            _ => StoreError::Query(err),
        }
    }
}

#[derive(Debug, FromRow)]
struct ActivityRow {
    id: i64,
    category: String,
    title: String,
    description: String,
    completion_count: i64,
}

impl From<ActivityRow> for Activity {
    fn from(row: ActivityRow) -> Self {
        Activity {
            id: row.id.to_string(),
            category: row.category,
            title: row.title,
            description: row.description,
            completion_count: u64::try_from(row.completion_count).unwrap_or(0),
        }
    }
}

#[derive(Clone)]
pub struct ActivityStore {
    pool: SqlitePool,
}

impl ActivityStore {
    /// Opens (creating if needed) the database file at `path` and ensures the schema.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|err| StoreError::from(sqlx::Error::Io(err)))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(options)
            .await?;

        info!(path = %path.display(), "opened activity store");
        let store = Self::from_pool(pool);
        store.init_schema().await?;
        Ok(store)
    }

    /// A private in-memory store. One connection, never recycled, so the
    /// database lives as long as the store.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new().in_memory(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let store = Self::from_pool(pool);
        store.init_schema().await?;
        Ok(store)
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn init_schema(&self) -> Result<(), StoreError> {
        sqlx::query(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<Activity>, StoreError> {
        let rows = sqlx::query_as::<_, ActivityRow>(
            "SELECT id, category, title, description, completion_count \
             FROM activities ORDER BY category, title",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Activity::from).collect())
    }

    pub async fn create(&self, activity: &NewActivity) -> Result<Activity, StoreError> {
        let sql = format!(
            "INSERT INTO activities (category, title, description) VALUES (?1, ?2, ?3) {RETURNING}"
        );
        let row = sqlx::query_as::<_, ActivityRow>(&sql)
            .bind(&activity.category)
            .bind(&activity.title)
            .bind(&activity.description)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.into())
    }

    /// Coalescing update: omitted fields keep their stored values.
    /// `Ok(None)` when no activity has `id`.
    pub async fn update_fields(
        &self,
        id: i64,
        patch: &ActivityPatch,
    ) -> Result<Option<Activity>, StoreError> {
        let sql = format!(
            "UPDATE activities SET \
                category = COALESCE(?1, category), \
                title = COALESCE(?2, title), \
                description = COALESCE(?3, description) \
             WHERE id = ?4 {RETURNING}"
        );
        let row = sqlx::query_as::<_, ActivityRow>(&sql)
            .bind(patch.category.as_deref())
            .bind(patch.title.as_deref())
            .bind(patch.description.as_deref())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Activity::from))
    }

    /// Overwrites the counter with `count`.
    pub async fn update_counter(&self, id: i64, count: i64) -> Result<Option<Activity>, StoreError> {
        let sql = format!("UPDATE activities SET completion_count = ?1 WHERE id = ?2 {RETURNING}");
        let row = sqlx::query_as::<_, ActivityRow>(&sql)
            .bind(count)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Activity::from))
    }

    /// Adds one to the counter in a single statement.
    pub async fn increment_counter(&self, id: i64) -> Result<Option<Activity>, StoreError> {
        let sql = format!(
            "UPDATE activities SET completion_count = completion_count + 1 WHERE id = ?1 {RETURNING}"
        );
        let row = sqlx::query_as::<_, ActivityRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Activity::from))
    }

    /// Returns `false` when nothing was deleted.
    pub async fn delete_by_id(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM activities WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_by_title(&self, title: &str) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "DELETE FROM activities WHERE id = \
             (SELECT id FROM activities WHERE title = ?1 ORDER BY id LIMIT 1)",
        )
        .bind(title)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
