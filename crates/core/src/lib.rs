//! # SensorLink Core
//!
//! Pure delivery logic - no infrastructure dependencies.
//!
//! This crate contains:
//! - The JSON codec and HTTP status classifier
//! - The delivery gateway and its per-operation caching policy
//! - Port interfaces (traits) for transport, credentials, and the offline
//!   queue
//! - The replay service that drains the offline queue
//!
//! ## Architecture Principles
//! - Only depends on `sensorlink-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits

pub mod delivery;
pub mod replay;

pub use delivery::{
    classify, drain, pending_entries, CredentialProvider, DeliveryGateway, OfflineQueue,
    Transport, TransportOutcome,
};
pub use replay::ReplayService;
