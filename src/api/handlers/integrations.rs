use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::response::{ApiError, AppJson, JSend};
use crate::auth::AdminSession;
use crate::clickup::{ClickUpError, Task};
use crate::storage::models::ReleaseNote;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct FetchTasksRequest {
    pub api_key: String,
    pub list_id: String,
    /// Only tasks created after this instant
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct TaskList {
    pub tasks: Vec<Task>,
}

#[derive(Debug, Deserialize)]
pub struct ImportTaskRequest {
    pub task: Task,
}

pub async fn fetch_clickup_tasks(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    AppJson(req): AppJson<FetchTasksRequest>,
) -> Result<Json<JSend<TaskList>>, ApiError> {
    let tasks = state
        .clickup
        .fetch_tasks(&req.api_key, &req.list_id, req.start_date)
        .await
        .map_err(clickup_error)?;

    tracing::debug!(list_id = %req.list_id, count = tasks.len(), "Fetched ClickUp tasks");
    Ok(JSend::success(TaskList { tasks }))
}

/// Create a release from a single task.
pub async fn import_clickup_task(
    State(state): State<Arc<AppState>>,
    admin: AdminSession,
    AppJson(req): AppJson<ImportTaskRequest>,
) -> Result<(StatusCode, Json<JSend<ReleaseNote>>), ApiError> {
    let draft = req.task.to_draft(Utc::now()).map_err(clickup_error)?;
    let release = state.db.save_release(&draft)?;

    tracing::debug!(
        task_id = %req.task.id,
        release_id = %release.id,
        user = %admin.session().username,
        "Imported ClickUp task"
    );

    Ok((StatusCode::CREATED, JSend::success(release)))
}

fn clickup_error(e: ClickUpError) -> ApiError {
    match e {
        ClickUpError::MissingCredentials
        | ClickUpError::InvalidListId(_)
        | ClickUpError::UntitledTask => ApiError::bad_request(e.to_string()),
        ClickUpError::Api { .. } | ClickUpError::Request(_) => {
            tracing::warn!(error = %e, "ClickUp request failed");
            ApiError::bad_gateway(e.to_string())
        }
    }
}
