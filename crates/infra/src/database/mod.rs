//! SQLite storage for the offline queue

pub mod manager;
pub mod offline_queue_repository;

pub use manager::{DbConnection, DbManager};
pub use offline_queue_repository::SqliteOfflineQueue;
