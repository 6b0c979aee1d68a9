use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

use crate::api::response::{ApiError, JSend};
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct PurgeResponse {
    pub releases_deleted: u64,
    pub tags_deleted: u64,
    pub labels_deleted: u64,
    pub users_deleted: u64,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn health() -> Json<JSend<HealthResponse>> {
    JSend::success(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Only routed when `TEST_MODE` is on.
pub async fn admin_purge(
    State(state): State<Arc<AppState>>,
) -> Result<Json<JSend<PurgeResponse>>, ApiError> {
    let stats = state.db.purge_all()?;

    tracing::warn!(
        releases = stats.releases,
        tags = stats.tags,
        labels = stats.labels,
        users = stats.users,
        "Purged all data"
    );

    Ok(JSend::success(PurgeResponse {
        releases_deleted: stats.releases,
        tags_deleted: stats.tags,
        labels_deleted: stats.labels,
        users_deleted: stats.users,
    }))
}
