use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let upload_limit = state.config.storage.max_upload_size as usize;

    let mut router = Router::new()
        // Auth
        .route("/auth/login", post(handlers::login))
        .route("/auth/logout", post(handlers::logout))
        .route("/auth/me", get(handlers::me))
        .route("/auth/register", post(handlers::register))
        // Releases
        .route("/releases", get(handlers::list_releases))
        .route("/releases", post(handlers::create_release))
        .route("/releases/export.csv", get(handlers::export_releases))
        .route("/releases/:release", delete(handlers::delete_release))
        .route("/releases/:release", get(handlers::get_release))
        .route("/releases/:release", put(handlers::update_release))
        // Vocabularies
        .route("/labels", get(handlers::list_labels))
        .route("/tags", get(handlers::list_tags))
        // Media
        .route(
            "/media",
            post(handlers::upload_media).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/media/:key", get(handlers::serve_media))
        // Users
        .route("/users", get(handlers::list_users))
        .route("/users/:id", delete(handlers::delete_user))
        .route("/users/:id/role", put(handlers::update_user_role))
        // Integrations
        .route(
            "/integrations/clickup/import",
            post(handlers::import_clickup_task),
        )
        .route(
            "/integrations/clickup/tasks",
            post(handlers::fetch_clickup_tasks),
        )
        // Internal
        .route("/_internal/health", get(handlers::health));

    // Test-only routes
    if state.config.test_mode {
        tracing::warn!("Test mode enabled, purge route is available.");
        router = router.route("/admin/purge", delete(handlers::admin_purge));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}
