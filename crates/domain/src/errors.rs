//! Error types used throughout the bridge

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Typed rejection returned by the collection service.
///
/// Produced only for non-2xx responses. Every variant carries the
/// human-readable message extracted from the error body, or the raw body
/// when no structured message could be found.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProtocolError {
    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Internal server error: {message}")]
    InternalServerError { message: String },

    #[error("Server returned status {code}: {message}")]
    GenericServerError { code: u16, message: String },
}

impl ProtocolError {
    /// Message extracted from the response body.
    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest { message }
            | Self::Unauthorized { message }
            | Self::Forbidden { message }
            | Self::NotFound { message }
            | Self::InternalServerError { message }
            | Self::GenericServerError { message, .. } => message,
        }
    }

    /// HTTP status code this error was classified from.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest { .. } => 400,
            Self::Unauthorized { .. } => 401,
            Self::Forbidden { .. } => 403,
            Self::NotFound { .. } => 404,
            Self::InternalServerError { .. } => 500,
            Self::GenericServerError { code, .. } => *code,
        }
    }
}

/// Main error type for SensorLink
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum SensorLinkError {
    /// The transport never obtained a response from the peer.
    #[error("Connectivity error: {0}")]
    Connectivity(String),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// A 2xx body did not match the expected response shape.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The offline queue could not be read or written.
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Credential error: {0}")]
    Credential(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SensorLinkError {
    /// Stable label suitable for structured logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Connectivity(_) => "connectivity",
            Self::Protocol(_) => "protocol",
            Self::Decode(_) => "decode",
            Self::Storage(_) => "storage",
            Self::Config(_) => "config",
            Self::Credential(_) => "credential",
            Self::Internal(_) => "internal",
        }
    }

    /// Whether this error means no response was obtained at all.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Connectivity(_))
    }

    /// Returns the typed rejection when the server answered with a non-2xx.
    pub fn as_protocol(&self) -> Option<&ProtocolError> {
        match self {
            Self::Protocol(err) => Some(err),
            _ => None,
        }
    }
}

/// Result type alias for SensorLink operations
pub type Result<T> = std::result::Result<T, SensorLinkError>;
