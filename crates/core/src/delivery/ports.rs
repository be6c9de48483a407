//! Port interfaces for outbound delivery

use async_trait::async_trait;
use sensorlink_domain::{CachedEntry, Result};

/// What a single POST produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportOutcome {
    /// The peer answered. `status` may be any HTTP status, including errors.
    Response { status: u16, body: String },
    /// No response was obtained (DNS, timeout, refused, TLS, truncated body).
    /// `reason` is diagnostic only.
    ConnectivityFailure { reason: String },
}

impl TransportOutcome {
    /// Shorthand for [`TransportOutcome::Response`].
    pub fn response(status: u16, body: impl Into<String>) -> Self {
        Self::Response { status, body: body.into() }
    }

    /// Shorthand for [`TransportOutcome::ConnectivityFailure`].
    pub fn connectivity_failure(reason: impl Into<String>) -> Self {
        Self::ConnectivityFailure { reason: reason.into() }
    }
}

/// Performs one authenticated POST round trip.
///
/// Implementations must resolve every call, either with a response or with
/// `ConnectivityFailure`, and must not retry internally.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `body` to `endpoint` (a path relative to the service base URL).
    /// An empty `token` means the request is sent unauthenticated.
    async fn post(&self, endpoint: &str, body: &str, token: &str) -> TransportOutcome;
}

/// Source of the bearer token used for outgoing requests.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Current token, or an empty string when no one is signed in.
    async fn current_token(&self) -> Result<String>;
}

/// Durable FIFO of requests that could not be delivered.
#[async_trait]
pub trait OfflineQueue: Send + Sync {
    /// Append an entry at the tail. Fails only when the store is unusable.
    async fn enqueue(&self, endpoint: &str, body: &str, token: &str) -> Result<CachedEntry>;

    /// Up to `limit` entries with `id > after_id`, in ascending id order.
    async fn list_after(&self, after_id: i64, limit: usize) -> Result<Vec<CachedEntry>>;

    /// Remove a replayed entry. Returns `false` if it was already gone.
    async fn acknowledge(&self, id: i64) -> Result<bool>;

    /// Number of entries currently queued.
    async fn len(&self) -> Result<usize>;

    /// Whether nothing is waiting for replay.
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }
}
