pub mod db;
pub mod models;
mod releases;
mod tables;
mod users;

pub use db::{Database, DatabaseError, PurgeStats};
pub use releases::{JoinRows, Vocabulary};
pub use tables::*;
