//! Replay of cached requests - the drain side of the offline queue

use std::sync::Arc;

use futures::StreamExt;
use sensorlink_domain::constants::DEFAULT_DRAIN_PAGE_SIZE;
use sensorlink_domain::{CachedEntry, ProtocolError, ReplayReport, Result};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::delivery::classifier::{classify, is_success};
use crate::delivery::drain::drain;
use crate::delivery::ports::{CredentialProvider, OfflineQueue, Transport, TransportOutcome};

enum Redelivery {
    Delivered,
    Rejected(ProtocolError),
    Deferred(ProtocolError),
    Unreachable(String),
}

/// Re-sends cached requests in FIFO order and acknowledges the ones that
/// reached a final state.
pub struct ReplayService {
    transport: Arc<dyn Transport>,
    credentials: Arc<dyn CredentialProvider>,
    queue: Arc<dyn OfflineQueue>,
    page_size: usize,
    pass: Mutex<()>,
}

impl ReplayService {
    /// Create a new replay service
    pub fn new(
        transport: Arc<dyn Transport>,
        credentials: Arc<dyn CredentialProvider>,
        queue: Arc<dyn OfflineQueue>,
    ) -> Self {
        Self { transport, credentials, queue, page_size: DEFAULT_DRAIN_PAGE_SIZE, pass: Mutex::new(()) }
    }

    /// Number of entries fetched per store query
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Run one pass over the queue.
    ///
    /// - 2xx: the entry is acknowledged
    /// - definitive 4xx: the server rejected the payload, so it is acknowledged
    ///   and counted as rejected. A 401 is first retried once with the current
    ///   token if that differs from the one stored with the entry.
    /// - 5xx, 408 or 429: the server is failing temporarily; the pass stops
    ///   and the entry stays queued
    /// - connectivity failure: the pass stops, leaving the entry and everything
    ///   behind it queued
    ///
    /// Overlapping calls do not replay twice: a call made while a pass is
    /// running returns immediately with only `remaining` filled in.
    ///
    /// # Errors
    ///
    /// Storage and credential errors abort the pass.
    #[instrument(skip(self))]
    pub async fn replay_once(&self) -> Result<ReplayReport> {
        let Ok(_pass) = self.pass.try_lock() else {
            debug!("replay pass already in progress");
            return Ok(ReplayReport { remaining: self.queue.len().await?, ..ReplayReport::default() });
        };

        let mut report = ReplayReport::default();
        let mut entries = drain(Arc::clone(&self.queue), self.page_size);

        while let Some(entry) = entries.next().await {
            let entry = entry?;
            match self.redeliver(&entry).await? {
                Redelivery::Delivered => {
                    self.queue.acknowledge(entry.id).await?;
                    report.delivered += 1;
                    debug!(entry_id = entry.id, endpoint = %entry.endpoint, "cached entry delivered");
                }
                Redelivery::Rejected(error) => {
                    self.queue.acknowledge(entry.id).await?;
                    report.rejected += 1;
                    warn!(
                        entry_id = entry.id,
                        endpoint = %entry.endpoint,
                        status = error.status_code(),
                        error = %error,
                        "cached entry rejected by server, dropping"
                    );
                }
                Redelivery::Deferred(error) => {
                    report.interrupted = true;
                    info!(
                        entry_id = entry.id,
                        status = error.status_code(),
                        error = %error,
                        "server unavailable, pausing replay"
                    );
                    break;
                }
                Redelivery::Unreachable(reason) => {
                    report.interrupted = true;
                    info!(entry_id = entry.id, reason = %reason, "peer unreachable, pausing replay");
                    break;
                }
            }
        }

        report.remaining = self.queue.len().await?;
        info!(
            delivered = report.delivered,
            rejected = report.rejected,
            remaining = report.remaining,
            interrupted = report.interrupted,
            "replay pass finished"
        );
        Ok(report)
    }

    async fn redeliver(&self, entry: &CachedEntry) -> Result<Redelivery> {
        let outcome = self.transport.post(&entry.endpoint, &entry.body, &entry.token).await;

        if let TransportOutcome::Response { status: 401, .. } = outcome {
            let current = self.credentials.current_token().await?;
            if !current.is_empty() && current != entry.token {
                debug!(entry_id = entry.id, "retrying with rotated token");
                let retried = self.transport.post(&entry.endpoint, &entry.body, &current).await;
                return Ok(interpret(retried));
            }
        }

        Ok(interpret(outcome))
    }
}

fn interpret(outcome: TransportOutcome) -> Redelivery {
    match outcome {
        TransportOutcome::Response { status, .. } if is_success(status) => Redelivery::Delivered,
        TransportOutcome::Response { status, body } if is_transient(status) => {
            Redelivery::Deferred(classify(status, &body))
        }
        TransportOutcome::Response { status, body } => Redelivery::Rejected(classify(status, &body)),
        TransportOutcome::ConnectivityFailure { reason } => Redelivery::Unreachable(reason),
    }
}

/// Statuses after which the same request may succeed later.
fn is_transient(status: u16) -> bool {
    status >= 500 || status == 408 || status == 429
}
