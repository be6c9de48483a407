//! Wiring of the delivery stack from configuration

use std::sync::Arc;

use sensorlink_core::{CredentialProvider, DeliveryGateway, OfflineQueue, ReplayService};
use sensorlink_domain::{
    Config, DeliveryStatus, DetectionBatch, LoginRequest, LoginResult, Ping, RegisterRequest,
    ReplayReport, Result,
};
use tracing::info;

use crate::config::{self, validate};
use crate::database::{DbManager, SqliteOfflineQueue};
use crate::http::ReqwestTransport;
use crate::sync::{ReplayWorker, ReplayWorkerConfig};

/// Fully wired bridge: reqwest transport, SQLite offline queue, replay
/// service, and (optionally) the background replay worker.
pub struct SensorLink {
    config: Config,
    gateway: DeliveryGateway,
    replay: Arc<ReplayService>,
    queue: Arc<SqliteOfflineQueue>,
    worker: ReplayWorker,
}

impl SensorLink {
    /// Build the stack from `config`. Opens (creating if needed) the queue
    /// database and applies the schema. The replay worker is not started.
    ///
    /// # Errors
    ///
    /// `Config` for invalid settings, `Storage` if the queue cannot be
    /// opened.
    pub fn open(config: Config, credentials: Arc<dyn CredentialProvider>) -> Result<Self> {
        validate(&config)?;

        let transport: Arc<ReqwestTransport> = Arc::new(ReqwestTransport::from_config(&config.api)?);

        let db = DbManager::new(&config.queue.path, config.queue.pool_size)?;
        db.run_migrations()?;
        let queue = Arc::new(SqliteOfflineQueue::new(Arc::new(db)));

        let gateway =
            DeliveryGateway::new(transport.clone(), Arc::clone(&credentials), queue.clone());
        let replay = Arc::new(
            ReplayService::new(transport, credentials, queue.clone())
                .with_page_size(config.replay.batch_size),
        );
        let worker =
            ReplayWorker::new(Arc::clone(&replay), ReplayWorkerConfig::from(&config.replay));

        info!(
            base_url = %config.api.base_url,
            queue_path = %config.queue.path,
            "sensorlink initialised"
        );

        Ok(Self { config, gateway, replay, queue, worker })
    }

    /// [`SensorLink::open`] with configuration from [`config::load`].
    pub fn from_environment(credentials: Arc<dyn CredentialProvider>) -> Result<Self> {
        Self::open(config::load()?, credentials)
    }

    /// Configuration the bridge was opened with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Gateway used for live requests.
    pub fn gateway(&self) -> &DeliveryGateway {
        &self.gateway
    }

    /// Replay service shared with the background worker.
    pub fn replay_service(&self) -> &Arc<ReplayService> {
        &self.replay
    }

    /// See [`DeliveryGateway::login`].
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResult> {
        self.gateway.login(request).await
    }

    /// See [`DeliveryGateway::register`].
    pub async fn register(&self, request: &RegisterRequest) -> Result<()> {
        self.gateway.register(request).await
    }

    /// Send a heartbeat, caching it when the service is unreachable.
    pub async fn ping(&self, ping: &Ping) -> Result<DeliveryStatus> {
        self.gateway.ping(ping).await
    }

    /// Send a detection batch, caching it when the service is unreachable.
    pub async fn send_detections(&self, batch: &DetectionBatch) -> Result<DeliveryStatus> {
        self.gateway.send_detections(batch).await
    }

    /// Number of requests waiting in the offline queue.
    pub async fn pending(&self) -> Result<usize> {
        self.queue.len().await
    }

    /// Run one replay pass in the caller's task.
    pub async fn replay_now(&self) -> Result<ReplayReport> {
        self.replay.replay_once().await
    }

    /// Start the background replay worker if `replay.enabled`. Returns
    /// whether the worker is running afterwards.
    pub fn start_background_replay(&mut self) -> Result<bool> {
        if !self.config.replay.enabled {
            info!("background replay disabled by configuration");
            return Ok(false);
        }
        if !self.worker.is_running() {
            self.worker.start()?;
        }
        Ok(true)
    }

    /// Ask the running worker for an immediate pass. No effect when the
    /// worker is not running.
    pub fn trigger_replay(&self) {
        if self.worker.is_running() {
            self.worker.trigger();
        }
    }

    /// Whether the background replay worker is running.
    pub fn is_replaying_in_background(&self) -> bool {
        self.worker.is_running()
    }

    /// Stop the background worker if it is running.
    pub async fn shutdown(&mut self) -> Result<()> {
        if self.worker.is_running() {
            self.worker.stop().await?;
        }
        Ok(())
    }
}
