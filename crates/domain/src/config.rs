//! Configuration structures

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_QUEUE_POOL_SIZE, DEFAULT_REPLAY_BATCH_SIZE, DEFAULT_REPLAY_INTERVAL_SECS,
    DEFAULT_REQUEST_TIMEOUT_SECS,
};

/// Top-level bridge configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub queue: QueueConfig,
    #[serde(default)]
    pub replay: ReplayConfig,
}

/// Collection service endpoint settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// e.g. `https://collector.example.com/api`
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            user_agent: None,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Offline queue storage settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueConfig {
    pub path: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

impl QueueConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into(), pool_size: DEFAULT_QUEUE_POOL_SIZE }
    }
}

/// Background replay of cached requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_replay_interval")]
    pub interval_seconds: u64,
    #[serde(default = "default_replay_batch_size")]
    pub batch_size: usize,
}

impl ReplayConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_seconds: DEFAULT_REPLAY_INTERVAL_SECS,
            batch_size: DEFAULT_REPLAY_BATCH_SIZE,
        }
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_pool_size() -> u32 {
    DEFAULT_QUEUE_POOL_SIZE
}

fn default_true() -> bool {
    true
}

fn default_replay_interval() -> u64 {
    DEFAULT_REPLAY_INTERVAL_SECS
}

fn default_replay_batch_size() -> usize {
    DEFAULT_REPLAY_BATCH_SIZE
}
