use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::api::response::{ApiError, AppJson, JSend};
use crate::auth::{self, PasswordHash, Session, MIN_PASSWORD_LEN};
use crate::storage::models::{Role, SessionRecord, UserRecord};
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub admin_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub revoked: bool,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn register(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<JSend<UserResponse>>), ApiError> {
    let email = req.email.trim().to_string();
    let username = req.username.trim().to_string();

    if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
        return Err(ApiError::bad_request("email must be a valid address"));
    }
    if !(3..=32).contains(&username.chars().count())
        || !username
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ApiError::bad_request(
            "username must be 3-32 characters of letters, digits, '_' or '-'",
        ));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let role = req.role.unwrap_or(Role::User);
    // Without a configured code only the first account may be admin; the
    // count here is a fast path, `create_first_user` enforces it atomically.
    let bootstrap = role.is_admin() && state.config.auth.admin_registration_code.is_none();
    if role.is_admin() {
        let allowed = match state.config.auth.admin_registration_code.as_deref() {
            Some(code) => req.admin_code.as_deref() == Some(code),
            None => state.db.user_count()? == 0,
        };
        if !allowed {
            return Err(ApiError::forbidden("Not allowed to register as admin"));
        }
    }

    if state.db.username_exists(&username)? {
        return Err(ApiError::conflict(format!(
            "username '{username}' is already taken"
        )));
    }

    let iterations = state.config.auth.password_iterations;
    let password = req.password;
    let hashed = tokio::task::spawn_blocking(move || auth::hash_password(&password, iterations))
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?
        .map_err(|e| ApiError::internal(e.to_string()))?;

    let user = UserRecord {
        id: uuid::Uuid::new_v4().to_string(),
        username,
        email,
        password_hash: hashed.hash,
        password_salt: hashed.salt,
        password_iterations: hashed.iterations,
        role,
        created_at: Utc::now(),
    };
    if bootstrap {
        state.db.create_first_user(&user)?;
    } else {
        state.db.create_user(&user)?;
    }

    tracing::info!(user_id = %user.id, username = %user.username, role = ?user.role, "Registered user");

    Ok((StatusCode::CREATED, JSend::success(user_to_response(&user))))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<Json<JSend<LoginResponse>>, ApiError> {
    let invalid = || ApiError::unauthorized("Invalid email or password");

    let user = state
        .db
        .find_user_by_email(&req.email)?
        .ok_or_else(invalid)?;

    let stored = PasswordHash {
        hash: user.password_hash.clone(),
        salt: user.password_salt.clone(),
        iterations: user.password_iterations,
    };
    let password = req.password;
    let verified = tokio::task::spawn_blocking(move || auth::verify_password(&password, &stored))
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?
        .map_err(|e| ApiError::internal(e.to_string()))?;

    if !verified {
        tracing::debug!(user_id = %user.id, "Rejected login");
        return Err(invalid());
    }

    let token = auth::generate_token().map_err(|e| ApiError::internal(e.to_string()))?;
    let now = Utc::now();
    let expires_at = Duration::try_hours(state.config.auth.session_ttl_hours)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or_else(|| ApiError::internal("Session lifetime is out of range"))?;

    state.db.put_session(
        &auth::token_hash(&token),
        &SessionRecord {
            user_id: user.id.clone(),
            created_at: now,
            expires_at,
        },
    )?;

    tracing::debug!(user_id = %user.id, "Opened session");

    Ok(JSend::success(LoginResponse {
        token,
        expires_at,
        user: user_to_response(&user),
    }))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<JSend<LogoutResponse>>, ApiError> {
    let revoked = state.db.delete_session(&session.token_hash)?;
    tracing::debug!(user_id = %session.user_id, "Closed session");
    Ok(JSend::success(LogoutResponse { revoked }))
}

pub async fn me(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<JSend<UserResponse>>, ApiError> {
    let user = state
        .db
        .get_user(&session.user_id)?
        .ok_or_else(|| ApiError::unauthorized("Invalid or expired session"))?;
    Ok(JSend::success(user_to_response(&user)))
}

// ============================================================================
// Helpers
// ============================================================================

pub(crate) fn user_to_response(user: &UserRecord) -> UserResponse {
    UserResponse {
        id: user.id.clone(),
        username: user.username.clone(),
        email: user.email.clone(),
        role: user.role,
        created_at: user.created_at.to_rfc3339(),
    }
}
