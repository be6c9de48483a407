//! Configuration loader
//!
//! Loads bridge configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! Whatever the source, the result is validated before it is returned.
//!
//! ## Environment Variables
//! - `SENSORLINK_API_BASE_URL`: Collection service base URL (required)
//! - `SENSORLINK_API_TIMEOUT_SECS`: Per-request timeout in seconds
//! - `SENSORLINK_API_USER_AGENT`: `User-Agent` sent with every request
//! - `SENSORLINK_QUEUE_PATH`: Offline queue database path (required)
//! - `SENSORLINK_QUEUE_POOL_SIZE`: Connection pool size
//! - `SENSORLINK_REPLAY_ENABLED`: Whether background replay runs
//!   (true/false)
//! - `SENSORLINK_REPLAY_INTERVAL`: Replay interval in seconds
//! - `SENSORLINK_REPLAY_BATCH_SIZE`: Entries fetched per queue page during
//!   replay
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./sensorlink.json` or `./sensorlink.toml` (current working directory)
//! 2. `./config.json` or `./config.toml` (current working directory)
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};
use std::str::FromStr;

use sensorlink_domain::{ApiConfig, Config, QueueConfig, ReplayConfig, Result, SensorLinkError};
use url::Url;

const CONFIG_FILE_NAMES: [&str; 4] =
    ["sensorlink.json", "sensorlink.toml", "config.json", "config.toml"];

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `SensorLinkError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - Required fields are missing or invalid
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// `SENSORLINK_API_BASE_URL` and `SENSORLINK_QUEUE_PATH` are required; the
/// remaining variables fall back to their defaults when unset.
///
/// # Errors
/// Returns `SensorLinkError::Config` if required variables are missing
/// or any variable has an invalid value.
pub fn load_from_env() -> Result<Config> {
    let base_url = env_var("SENSORLINK_API_BASE_URL")?;
    let queue_path = env_var("SENSORLINK_QUEUE_PATH")?;

    let mut api = ApiConfig::new(base_url);
    if let Some(timeout_secs) = env_parse::<u64>("SENSORLINK_API_TIMEOUT_SECS", "timeout")? {
        api.timeout_secs = timeout_secs;
    }
    if let Some(agent) = std::env::var("SENSORLINK_API_USER_AGENT")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
    {
        api.user_agent = Some(agent);
    }

    let mut queue = QueueConfig::new(queue_path);
    if let Some(pool_size) = env_parse::<u32>("SENSORLINK_QUEUE_POOL_SIZE", "pool size")? {
        queue.pool_size = pool_size;
    }

    let mut replay = ReplayConfig {
        enabled: env_bool("SENSORLINK_REPLAY_ENABLED", true),
        ..ReplayConfig::default()
    };
    if let Some(interval) = env_parse::<u64>("SENSORLINK_REPLAY_INTERVAL", "replay interval")? {
        replay.interval_seconds = interval;
    }
    if let Some(batch_size) = env_parse::<usize>("SENSORLINK_REPLAY_BATCH_SIZE", "batch size")? {
        replay.batch_size = batch_size;
    }

    let config = Config { api, queue, replay };
    validate(&config)?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `SensorLinkError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - Required fields are missing or invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(SensorLinkError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            SensorLinkError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| SensorLinkError::Config(format!("Failed to read config file: {}", e)))?;

    let config = parse_config(&contents, &config_path)?;
    validate(&config)?;
    Ok(config)
}

/// Parse configuration from string content. Format is detected by file
/// extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| SensorLinkError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| SensorLinkError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(SensorLinkError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Check values serde cannot: URL shape and non-zero sizes.
///
/// # Errors
/// Returns `SensorLinkError::Config` naming the first offending field.
pub fn validate(config: &Config) -> Result<()> {
    validate_base_url(&config.api.base_url)?;

    if config.api.timeout_secs == 0 {
        return Err(SensorLinkError::Config("api.timeout_secs must be greater than zero".into()));
    }
    if config.queue.path.trim().is_empty() {
        return Err(SensorLinkError::Config("queue.path must not be empty".into()));
    }
    if config.queue.pool_size == 0 {
        return Err(SensorLinkError::Config("queue.pool_size must be greater than zero".into()));
    }
    if config.replay.enabled && config.replay.interval_seconds == 0 {
        return Err(SensorLinkError::Config(
            "replay.interval_seconds must be greater than zero".into(),
        ));
    }
    if config.replay.batch_size == 0 {
        return Err(SensorLinkError::Config("replay.batch_size must be greater than zero".into()));
    }

    Ok(())
}

/// Parse a service base URL, accepting only `http` and `https`.
///
/// # Errors
/// Returns `SensorLinkError::Config` if the URL is malformed or uses another
/// scheme.
pub fn validate_base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw)
        .map_err(|e| SensorLinkError::Config(format!("Invalid base URL '{raw}': {e}")))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(SensorLinkError::Config(format!(
            "Unsupported base URL scheme '{other}', expected http or https"
        ))),
    }
}

/// Probe multiple paths for configuration files
///
/// Searches the current working directory first, then the directory holding
/// the executable.
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(CONFIG_FILE_NAMES.iter().map(|name| cwd.join(name)));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(CONFIG_FILE_NAMES.iter().map(|name| exe_dir.join(name)));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        SensorLinkError::Config(format!("Missing required environment variable: {}", key))
    })
}

/// Parse an optional environment variable. Unset means `None`; set but
/// unparseable is an error.
fn env_parse<T>(key: &str, what: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| SensorLinkError::Config(format!("Invalid {what} in {key}: {e}"))),
        Err(_) => Ok(None),
    }
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
