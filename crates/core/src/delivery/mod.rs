//! Outbound delivery: codec, error classification, gateway, and the offline
//! queue port.

pub mod classifier;
pub mod codec;
pub mod drain;
pub mod gateway;
pub mod ports;

#[cfg(test)]
pub(crate) mod testing;

pub use classifier::{classify, is_success};
pub use drain::{drain, pending_entries};
pub use gateway::DeliveryGateway;
pub use ports::{CredentialProvider, OfflineQueue, Transport, TransportOutcome};
