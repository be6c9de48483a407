//! Logging setup for hosts embedding the bridge
//!
//! Library code only emits `tracing` events; installing a subscriber is the
//! host's call. Both initialisers honour `RUST_LOG` and fall back to
//! `default_filter` when it is unset or invalid. They use `try_init`, so
//! calling either more than once (or after the host installed its own
//! subscriber) is a no-op that returns `false`.

use tracing_subscriber::EnvFilter;

/// Default directive used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info,sensorlink_core=info,sensorlink_infra=info";

fn env_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install a human-readable fmt subscriber. Returns `true` if this call
/// installed it.
pub fn init_tracing(default_filter: &str) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_filter))
        .with_target(true)
        .compact()
        .try_init()
        .is_ok()
}

/// Install a JSON-lines subscriber for log shipping. Returns `true` if this
/// call installed it.
pub fn init_json_tracing(default_filter: &str) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_filter))
        .json()
        .with_current_span(true)
        .try_init()
        .is_ok()
}
