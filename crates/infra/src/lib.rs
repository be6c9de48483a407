//! # SensorLink Infrastructure
//!
//! Infrastructure implementations of the delivery core's ports.
//!
//! This crate contains:
//! - The reqwest HTTP transport
//! - The SQLite offline queue (r2d2 pooled, WAL mode)
//! - Credential providers (in-memory and OS keychain)
//! - Configuration loading, tracing setup, and the background replay worker
//!
//! ## Architecture
//! - Implements traits defined in `sensorlink-core`
//! - Depends on `sensorlink-domain` and `sensorlink-core`
//! - Contains all "impure" code (I/O, keychain, network)

pub mod auth;
pub mod config;
pub mod context;
pub mod database;
pub mod errors;
pub mod http;
pub mod observability;
pub mod sync;

// Re-export commonly used items
pub use auth::{KeychainTokenProvider, SharedTokenStore};
pub use context::SensorLink;
pub use database::{DbManager, SqliteOfflineQueue};
pub use errors::InfraError;
pub use http::{HttpClient, ReqwestTransport};
pub use sync::{ReplayWorker, ReplayWorkerConfig};
