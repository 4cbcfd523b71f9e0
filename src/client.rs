use crate::models::{
    Activity, ActivityPatch, DeleteResponse, EnvCheckResponse, IdRepr, NewActivity,
    UpdateActivityRequest,
};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("no activities available")]
    EmptyCatalog,
    #[error("no activity is displayed")]
    NothingDisplayed,
    #[error("activity {0} is not in the catalog")]
    UnknownActivity(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Where a listed catalog came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogSource {
    Server,
    /// The local catalog file; its counters are not authoritative.
    Fallback,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// HTTP client for the `/activities` resource.
#[derive(Debug, Clone)]
pub struct ActivityClient {
    http: Client,
    base_url: String,
    fallback_catalog: Option<PathBuf>,
}

impl ActivityClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            fallback_catalog: None,
        }
    }

    /// Catalog file read by [`list`](Self::list) when the server cannot be reached.
    pub fn with_fallback_catalog(mut self, path: impl Into<PathBuf>) -> Self {
        self.fallback_catalog = Some(path.into());
        self
    }

    fn activities_url(&self) -> String {
        format!("{}/activities", self.base_url)
    }

    pub async fn list(&self) -> Result<Vec<Activity>, ClientError> {
        self.list_with_source().await.map(|(activities, _)| activities)
    }

    pub async fn list_with_source(&self) -> Result<(Vec<Activity>, CatalogSource), ClientError> {
        match (self.fetch_list().await, &self.fallback_catalog) {
            (Ok(activities), _) => {
                info!(count = activities.len(), "fetched activities");
                Ok((activities, CatalogSource::Server))
            }
            (Err(err), Some(path)) => {
                warn!("activity list failed ({err}), reading {}", path.display());
                match read_catalog(path).await {
                    Ok(activities) => Ok((activities, CatalogSource::Fallback)),
                    Err(fallback_err) => {
                        warn!("fallback catalog failed: {fallback_err}");
                        Err(err)
                    }
                }
            }
            (Err(err), None) => Err(err),
        }
    }

    async fn fetch_list(&self) -> Result<Vec<Activity>, ClientError> {
        let response = self
            .http
            .get(self.activities_url())
            .header("cache-control", "no-cache")
            .send()
            .await?;
        decode(response).await
    }

    pub async fn create(&self, activity: &NewActivity) -> Result<Activity, ClientError> {
        let response = self
            .http
            .post(self.activities_url())
            .json(activity)
            .send()
            .await?;
        decode(response).await
    }

    pub async fn update_fields(
        &self,
        id: &str,
        patch: &ActivityPatch,
    ) -> Result<Activity, ClientError> {
        self.put(&UpdateActivityRequest {
            id: Some(IdRepr::Text(id.to_string())),
            completion_count: None,
            patch: patch.clone(),
        })
        .await
    }

    pub async fn update_counter(&self, id: &str, count: u64) -> Result<Activity, ClientError> {
        self.put(&UpdateActivityRequest {
            id: Some(IdRepr::Text(id.to_string())),
            completion_count: Some(i64::try_from(count).unwrap_or(i64::MAX)),
            patch: ActivityPatch::default(),
        })
        .await
    }

    async fn put(&self, body: &UpdateActivityRequest) -> Result<Activity, ClientError> {
        let response = self
            .http
            .put(self.activities_url())
            .json(body)
            .send()
            .await?;
        decode(response).await
    }

    pub async fn complete(&self, id: &str) -> Result<Activity, ClientError> {
        let response = self
            .http
            .post(format!("{}/{id}/complete", self.activities_url()))
            .send()
            .await?;
        decode(response).await
    }

    pub async fn delete_by_id(&self, id: &str) -> Result<DeleteResponse, ClientError> {
        self.delete(("id", id)).await
    }

    pub async fn delete_by_title(&self, title: &str) -> Result<DeleteResponse, ClientError> {
        self.delete(("title", title)).await
    }

    async fn delete(&self, param: (&str, &str)) -> Result<DeleteResponse, ClientError> {
        let response = self
            .http
            .delete(self.activities_url())
            .query(&[param])
            .send()
            .await?;
        decode(response).await
    }

    pub async fn env_check(&self) -> Result<EnvCheckResponse, ClientError> {
        let response = self
            .http
            .get(format!("{}/env-check", self.base_url))
            .send()
            .await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or_else(|_| {
            if text.is_empty() {
                status.to_string()
            } else {
                text
            }
        });

    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}

async fn read_catalog(path: &Path) -> Result<Vec<Activity>, ClientError> {
    let bytes = fs::read(path).await?;
    Ok(serde_json::from_slice(&bytes)?)
}
