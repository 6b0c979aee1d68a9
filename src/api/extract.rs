//! Session extractors. Handlers name the capability they need in their
//! signature; the role is read from the user record on every request.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::Utc;

use crate::api::response::ApiError;
use crate::auth::{token_hash, AdminSession, Session};
use crate::AppState;

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, ApiError> {
        let token = bearer_token(parts)
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;
        let hash = token_hash(token);

        let record = state
            .db
            .get_session(&hash)?
            .ok_or_else(|| ApiError::unauthorized("Invalid or expired session"))?;

        if record.is_expired(Utc::now()) {
            state.db.delete_session(&hash)?;
            tracing::debug!(user_id = %record.user_id, "Removed expired session");
            return Err(ApiError::unauthorized("Invalid or expired session"));
        }

        let user = state
            .db
            .get_user(&record.user_id)?
            .ok_or_else(|| ApiError::unauthorized("Invalid or expired session"))?;

        Ok(Session {
            user_id: user.id,
            username: user.username,
            role: user.role,
            token_hash: hash,
        })
    }
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for AdminSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, ApiError> {
        Session::from_request_parts(parts, state)
            .await?
            .into_admin()
            .ok_or_else(|| ApiError::forbidden("Admin role required"))
    }
}
