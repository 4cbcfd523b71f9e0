use crate::errors::AppError;
use crate::models::{
    Activity, ActivityPatch, CreateActivityRequest, DeleteQuery, DeleteResponse,
    EnvCheckResponse, IdRepr, NewActivity, UpdateActivityRequest,
};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use tracing::info;

pub async fn list_activities(
    State(state): State<AppState>,
) -> Result<Json<Vec<Activity>>, AppError> {
    let activities = state
        .store
        .list()
        .await
        .map_err(|err| AppError::from_store("list", "Failed to get activities", err))?;

    Ok(Json(activities))
}

pub async fn create_activity(
    State(state): State<AppState>,
    payload: Result<Json<CreateActivityRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Activity>), AppError> {
    let Json(payload) = payload.map_err(|err| AppError::bad_request(err.body_text()))?;

    let (Some(category), Some(title), Some(description)) = (
        required(payload.category),
        required(payload.title),
        required(payload.description),
    ) else {
        return Err(AppError::bad_request(
            "category, title and description are required",
        ));
    };

    let activity = state
        .store
        .create(&NewActivity {
            category,
            title,
            description,
        })
        .await
        .map_err(|err| AppError::from_store("create", "Failed to save activity", err))?;

    info!(id = %activity.id, title = %activity.title, "activity created");
    Ok((StatusCode::CREATED, Json(activity)))
}

pub async fn update_activity(
    State(state): State<AppState>,
    payload: Result<Json<UpdateActivityRequest>, JsonRejection>,
) -> Result<Json<Activity>, AppError> {
    let Json(payload) = payload.map_err(|err| AppError::bad_request(err.body_text()))?;

    let id = match payload.id {
        Some(raw) => parse_id(&raw)?,
        None => return Err(AppError::bad_request("Activity ID is required")),
    };

    // A counter overwrite ignores any other fields in the payload.
    let updated = if let Some(count) = payload.completion_count {
        if count < 0 {
            return Err(AppError::bad_request("completionCount must not be negative"));
        }
        state
            .store
            .update_counter(id, count)
            .await
            .map_err(|err| AppError::from_store("update_counter", "Failed to update activity", err))?
    } else {
        let patch = validate_patch(payload.patch)?;
        state
            .store
            .update_fields(id, &patch)
            .await
            .map_err(|err| AppError::from_store("update_fields", "Failed to update activity", err))?
    };

    let activity = updated.ok_or_else(|| AppError::not_found(format!("Activity {id} not found")))?;
    info!(id = %activity.id, "activity updated");
    Ok(Json(activity))
}

pub async fn complete_activity(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<Activity>, AppError> {
    let id = parse_id(&IdRepr::Text(raw_id))?;

    let activity = state
        .store
        .increment_counter(id)
        .await
        .map_err(|err| AppError::from_store("increment_counter", "Failed to record completion", err))?
        .ok_or_else(|| AppError::not_found(format!("Activity {id} not found")))?;

    info!(id = %activity.id, count = activity.completion_count, "activity completed");
    Ok(Json(activity))
}

pub async fn delete_activity(
    State(state): State<AppState>,
    Query(query): Query<DeleteQuery>,
) -> Result<Json<DeleteResponse>, AppError> {
    let (deleted, identifier) = match (required(query.id), required(query.title)) {
        (Some(raw), _) => {
            let id = parse_id(&IdRepr::Text(raw.clone()))?;
            let deleted = state
                .store
                .delete_by_id(id)
                .await
                .map_err(|err| AppError::from_store("delete", "Failed to delete activity", err))?;
            (deleted, raw)
        }
        (None, Some(title)) => {
            let deleted = state
                .store
                .delete_by_title(&title)
                .await
                .map_err(|err| AppError::from_store("delete", "Failed to delete activity", err))?;
            (deleted, title)
        }
        (None, None) => {
            return Err(AppError::bad_request(
                "Either id or title query parameter is required",
            ));
        }
    };

    if !deleted {
        return Err(AppError::not_found(format!("Activity {identifier} not found")));
    }

    info!(identifier = %identifier, "activity deleted");
    Ok(Json(DeleteResponse {
        success: true,
        identifier,
    }))
}

pub async fn env_check(State(state): State<AppState>) -> Json<EnvCheckResponse> {
    Json(EnvCheckResponse {
        environment: state.gate.environment.to_string(),
        allow_production_writes: state.gate.allow_production_writes,
        writes_allowed: state.gate.writes_allowed(),
        time: Utc::now().to_rfc3339(),
    })
}

fn required(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_id(raw: &IdRepr) -> Result<i64, AppError> {
    raw.parse()
        .ok_or_else(|| AppError::bad_request("Activity ID must be numeric"))
}

fn validate_patch(patch: ActivityPatch) -> Result<ActivityPatch, AppError> {
    let field = |name: &str, value: Option<String>| match value {
        None => Ok(None),
        Some(value) => required(Some(value))
            .map(Some)
            .ok_or_else(|| AppError::bad_request(format!("{name} must not be empty"))),
    };

    Ok(ActivityPatch {
        category: field("category", patch.category)?,
        title: field("title", patch.title)?,
        description: field("description", patch.description)?,
    })
}
