//! Shared test helpers for release-notes handler tests.

use std::sync::Arc;

use crate::clickup::ClickUpClient;
use crate::config::{AuthConfig, ClickUpConfig, Config, NodeConfig, ReleasesConfig, StorageConfig};
use crate::object_store::LocalStore;
use crate::storage::Database;
use crate::AppState;

/// Create a test AppState with a temporary database and local object store.
pub fn test_state(temp_dir: &tempfile::TempDir) -> Arc<AppState> {
    test_state_with(temp_dir, |_| {})
}

/// Same as `test_state`, with the ClickUp client pointed at `clickup_url`.
pub fn test_state_with_clickup(temp_dir: &tempfile::TempDir, clickup_url: &str) -> Arc<AppState> {
    test_state_with(temp_dir, |config| {
        config.clickup.api_url = clickup_url.to_string();
    })
}

/// Same as `test_state`, with `configure` applied to the config first.
pub fn test_state_with(
    temp_dir: &tempfile::TempDir,
    configure: impl FnOnce(&mut Config),
) -> Arc<AppState> {
    let data_dir = temp_dir.path().join("data");
    let media_dir = temp_dir.path().join("media");

    let mut config = Config {
        auth: AuthConfig {
            admin_registration_code: Some("letmein".to_string()),
            password_iterations: 1_000,
            session_ttl_hours: 1,
        },
        clickup: ClickUpConfig {
            api_url: ClickUpConfig::default().api_url,
            max_pages: 3,
        },
        node: NodeConfig {
            bind_address: "127.0.0.1:0".to_string(),
            data_dir: data_dir.to_string_lossy().to_string(),
        },
        releases: ReleasesConfig { page_size: 2 },
        storage: StorageConfig {
            media_storage_path: media_dir.to_string_lossy().to_string(),
            max_upload_size: 1024 * 1024, // 1MB for tests
        },
        test_mode: true,
    };
    configure(&mut config);

    let db = Database::open(&data_dir).expect("Failed to open test database");
    let object_store = LocalStore::new(&media_dir).expect("Failed to create test object store");
    let clickup = ClickUpClient::new(&config.clickup.api_url, config.clickup.max_pages)
        .expect("Failed to build ClickUp client");

    Arc::new(AppState {
        clickup,
        config,
        db,
        object_store: Arc::new(object_store),
    })
}
