mod admin;
mod auth;
mod integrations;
mod media;
mod releases;
mod users;

pub use admin::{admin_purge, health};
pub use auth::{login, logout, me, register};
pub use integrations::{fetch_clickup_tasks, import_clickup_task};
pub use media::{serve_media, upload_media};
pub use releases::{
    create_release, delete_release, export_releases, get_release, list_labels, list_releases,
    list_tags, update_release,
};
pub use users::{delete_user, list_users, update_user_role};
