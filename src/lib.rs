//! release-notes - Publish and browse product release notes
//!
//! This crate provides the release-notes service with:
//! - Release notes with category, tags, labels and media, stored in redb
//! - Filter/sort/paginate pipeline for the browsing view
//! - Role-gated editing (admin) and reading (any signed-in user)
//! - CSV export and import of tasks from ClickUp lists
//! - REST API with multipart media upload

pub mod api;
pub mod auth;
pub mod clickup;
pub mod config;
pub mod export;
pub mod object_store;
pub mod query;
pub mod slug;
pub mod storage;
#[cfg(test)]
pub mod testutil;

use std::sync::Arc;

use clickup::ClickUpClient;
use config::Config;
use storage::Database;

/// Shared application state
pub struct AppState {
    pub clickup: ClickUpClient,
    pub config: Config,
    pub db: Database,
    pub object_store: Arc<dyn object_store::ObjectStore>,
}
