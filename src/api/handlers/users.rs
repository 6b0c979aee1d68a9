use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::auth::{user_to_response, UserResponse};
use crate::api::response::{ApiError, AppJson, JSend};
use crate::auth::AdminSession;
use crate::storage::models::Role;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct DeletedUser {
    pub id: String,
}

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
) -> Result<Json<JSend<Vec<UserResponse>>>, ApiError> {
    let users = state.db.list_users()?;
    Ok(JSend::success(users.iter().map(user_to_response).collect()))
}

pub async fn update_user_role(
    State(state): State<Arc<AppState>>,
    admin: AdminSession,
    Path(id): Path<String>,
    AppJson(req): AppJson<UpdateRoleRequest>,
) -> Result<Json<JSend<UserResponse>>, ApiError> {
    if admin.session().user_id == id {
        return Err(ApiError::bad_request("You cannot change your own role"));
    }

    let user = state
        .db
        .set_user_role(&id, req.role)?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    tracing::info!(user_id = %id, role = ?req.role, by = %admin.session().username, "Changed user role");
    Ok(JSend::success(user_to_response(&user)))
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    admin: AdminSession,
    Path(id): Path<String>,
) -> Result<Json<JSend<DeletedUser>>, ApiError> {
    if admin.session().user_id == id {
        return Err(ApiError::bad_request("You cannot delete your own account"));
    }

    if !state.db.delete_user(&id)? {
        return Err(ApiError::not_found("User not found"));
    }

    tracing::info!(user_id = %id, by = %admin.session().username, "Deleted user");
    Ok(JSend::success(DeletedUser { id }))
}
