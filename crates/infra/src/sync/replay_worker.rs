//! Background worker that periodically replays the offline queue.
//!
//! Each tick runs one [`ReplayService::replay_once`] pass under a processing
//! timeout. The worker's lifecycle is explicit: the join handle is tracked,
//! cancellation goes through a [`CancellationToken`], and `stop` waits for
//! the task with a bounded join timeout.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use sensorlink_core::ReplayService;
//! use sensorlink_infra::sync::{ReplayWorker, ReplayWorkerConfig};
//!
//! # async fn example(service: Arc<ReplayService>) -> sensorlink_domain::Result<()> {
//! let mut worker = ReplayWorker::new(
//!     service,
//!     ReplayWorkerConfig { interval: Duration::from_secs(60), ..Default::default() },
//! );
//!
//! worker.start()?;
//! // ... network comes back ...
//! worker.trigger();
//! // ... application runs ...
//! worker.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use sensorlink_core::ReplayService;
use sensorlink_domain::constants::DEFAULT_REPLAY_INTERVAL_SECS;
use sensorlink_domain::{ReplayConfig, Result, SensorLinkError};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// Configuration for the replay worker.
#[derive(Debug, Clone)]
pub struct ReplayWorkerConfig {
    /// Delay between replay passes
    pub interval: Duration,
    /// Upper bound for a single pass
    pub processing_timeout: Duration,
    /// Join timeout when stopping
    pub join_timeout: Duration,
}

impl Default for ReplayWorkerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_REPLAY_INTERVAL_SECS),
            processing_timeout: Duration::from_secs(300),
            join_timeout: Duration::from_secs(5),
        }
    }
}

impl From<&ReplayConfig> for ReplayWorkerConfig {
    fn from(config: &ReplayConfig) -> Self {
        Self { interval: config.interval(), ..Self::default() }
    }
}

/// Replay worker with explicit lifecycle management.
pub struct ReplayWorker {
    service: Arc<ReplayService>,
    config: ReplayWorkerConfig,
    cancellation: CancellationToken,
    wake: Arc<Notify>,
    task_handle: Option<JoinHandle<()>>,
}

impl ReplayWorker {
    pub fn new(service: Arc<ReplayService>, config: ReplayWorkerConfig) -> Self {
        Self {
            service,
            config,
            cancellation: CancellationToken::new(),
            wake: Arc::new(Notify::new()),
            task_handle: None,
        }
    }

    /// Start the worker, spawning the background replay task.
    ///
    /// Must be called from within a Tokio runtime.
    #[instrument(skip(self))]
    pub fn start(&mut self) -> Result<()> {
        if self.is_running() {
            return Err(SensorLinkError::Internal("Replay worker already running".into()));
        }

        info!(interval_secs = self.config.interval.as_secs(), "Starting replay worker");

        self.cancellation = CancellationToken::new();

        let service = Arc::clone(&self.service);
        let wake = Arc::clone(&self.wake);
        let interval = self.config.interval;
        let processing_timeout = self.config.processing_timeout;
        let cancel = self.cancellation.clone();

        let handle = tokio::spawn(async move {
            Self::process_loop(service, wake, interval, processing_timeout, cancel).await;
        });

        self.task_handle = Some(handle);
        Ok(())
    }

    /// Stop the worker and wait for the replay task to finish.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> Result<()> {
        if !self.is_running() {
            return Err(SensorLinkError::Internal("Replay worker not running".into()));
        }

        info!("Stopping replay worker");
        self.cancellation.cancel();

        if let Some(handle) = self.task_handle.take() {
            match tokio::time::timeout(self.config.join_timeout, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!("Replay worker task panicked: {}", e);
                    return Err(SensorLinkError::Internal("Replay worker task panicked".into()));
                }
                Err(_) => {
                    warn!("Replay worker task did not complete within timeout");
                    return Err(SensorLinkError::Internal("Replay worker task timeout".into()));
                }
            }
        }

        info!("Replay worker stopped");
        self.cancellation = CancellationToken::new();
        Ok(())
    }

    /// Returns true when a worker task is active.
    pub fn is_running(&self) -> bool {
        self.task_handle.is_some()
    }

    /// Run a pass now instead of waiting for the next tick, e.g. when the
    /// host learns the network is back. A trigger while a pass is already
    /// running schedules one more pass right after it.
    pub fn trigger(&self) {
        self.wake.notify_one();
    }

    async fn process_loop(
        service: Arc<ReplayService>,
        wake: Arc<Notify>,
        interval: Duration,
        processing_timeout: Duration,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Replay worker loop cancelled");
                    break;
                }
                _ = tokio::time::sleep(interval) => {}
                _ = wake.notified() => {
                    debug!("Replay pass triggered");
                }
            }

            Self::run_pass(&service, processing_timeout, &cancel).await;
        }
    }

    async fn run_pass(
        service: &ReplayService,
        processing_timeout: Duration,
        cancel: &CancellationToken,
    ) {
        let started = Instant::now();

        let outcome = tokio::select! {
            _ = cancel.cancelled() => return,
            outcome = tokio::time::timeout(processing_timeout, service.replay_once()) => outcome,
        };

        match outcome {
            Ok(Ok(report)) => {
                if report.delivered > 0 || report.rejected > 0 {
                    info!(
                        delivered = report.delivered,
                        rejected = report.rejected,
                        remaining = report.remaining,
                        interrupted = report.interrupted,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Replay pass finished"
                    );
                } else {
                    debug!(
                        remaining = report.remaining,
                        interrupted = report.interrupted,
                        "Replay pass found nothing to deliver"
                    );
                }
            }
            Ok(Err(e)) => {
                error!(error = %e, kind = e.label(), "Replay pass failed");
            }
            Err(_) => {
                warn!(timeout_secs = processing_timeout.as_secs(), "Replay pass timed out");
            }
        }
    }
}

impl Drop for ReplayWorker {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("ReplayWorker dropped while running; cancelling task");
            self.cancellation.cancel();
        }
    }
}
