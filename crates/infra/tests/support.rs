//! Shared fixtures for the infra integration tests.
#![allow(dead_code)]

use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use sensorlink_core::{DeliveryGateway, ReplayService};
use sensorlink_infra::database::{DbManager, SqliteOfflineQueue};
use sensorlink_infra::http::{HttpClient, ReqwestTransport};
use sensorlink_infra::SharedTokenStore;
use tempfile::TempDir;

/// Offline queue on a temporary database that lives as long as the fixture.
pub struct QueueFixture {
    pub queue: Arc<SqliteOfflineQueue>,
    _temp_dir: TempDir,
}

impl QueueFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir should be created");
        let manager = DbManager::new(temp_dir.path().join("queue.db"), 4)
            .expect("db manager should be created");
        manager.run_migrations().expect("schema should be applied");

        Self { queue: Arc::new(SqliteOfflineQueue::new(Arc::new(manager))), _temp_dir: temp_dir }
    }
}

impl Default for QueueFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Base URL of a local port nothing listens on.
pub fn unreachable_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{addr}")
}

pub fn transport(base_url: &str) -> Arc<ReqwestTransport> {
    let client = HttpClient::builder()
        .timeout(Duration::from_secs(2))
        .no_proxy(true)
        .build()
        .expect("http client should build");
    Arc::new(ReqwestTransport::new(client, base_url).expect("transport should build"))
}

pub fn gateway(base_url: &str, tokens: &SharedTokenStore, fixture: &QueueFixture) -> DeliveryGateway {
    DeliveryGateway::new(transport(base_url), Arc::new(tokens.clone()), fixture.queue.clone())
}

pub fn replay_service(
    base_url: &str,
    tokens: &SharedTokenStore,
    fixture: &QueueFixture,
) -> ReplayService {
    ReplayService::new(transport(base_url), Arc::new(tokens.clone()), fixture.queue.clone())
}
