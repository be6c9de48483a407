//! Protocol and configuration constants

// Endpoint paths, relative to the configured base URL
pub const LOGIN_ENDPOINT: &str = "/user/login";
pub const REGISTER_ENDPOINT: &str = "/user/register";
pub const PING_ENDPOINT: &str = "/ping";
pub const DETECTION_ENDPOINT: &str = "/detection";

// Transport defaults
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_USER_AGENT: &str = concat!("sensorlink/", env!("CARGO_PKG_VERSION"));

// Offline queue defaults
pub const DEFAULT_QUEUE_POOL_SIZE: u32 = 4;
pub const DEFAULT_DRAIN_PAGE_SIZE: usize = 50;

// Replay worker defaults
pub const DEFAULT_REPLAY_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_REPLAY_BATCH_SIZE: usize = 50;
