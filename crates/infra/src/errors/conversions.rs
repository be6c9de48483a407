//! Conversions from external infrastructure errors into domain errors.

use keyring::Error as KeyringError;
use r2d2::Error as PoolError;
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;
use sensorlink_domain::SensorLinkError;
use tokio::task::JoinError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub SensorLinkError);

impl From<InfraError> for SensorLinkError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<SensorLinkError> for InfraError {
    fn from(value: SensorLinkError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoSensorLinkError {
    fn into_sensorlink(self) -> SensorLinkError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → SensorLinkError */
/* -------------------------------------------------------------------------- */

impl IntoSensorLinkError for SqlError {
    fn into_sensorlink(self) -> SensorLinkError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match err.code {
                    ErrorCode::DatabaseBusy => SensorLinkError::Storage("database is busy".into()),
                    ErrorCode::DatabaseLocked => {
                        SensorLinkError::Storage("database is locked".into())
                    }
                    ErrorCode::DiskFull => SensorLinkError::Storage("disk is full".into()),
                    ErrorCode::ReadOnly => {
                        SensorLinkError::Storage("database is read-only".into())
                    }
                    ErrorCode::CannotOpen => {
                        SensorLinkError::Storage(format!("unable to open database: {message}"))
                    }
                    ErrorCode::NotADatabase | ErrorCode::DatabaseCorrupt => {
                        SensorLinkError::Storage("queue file is not a valid database".into())
                    }
                    _ => SensorLinkError::Storage(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => SensorLinkError::Storage("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                SensorLinkError::Storage(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                SensorLinkError::Storage(format!("invalid column type: {ty}"))
            }
            RE::InvalidPath(path) => SensorLinkError::Storage(format!(
                "invalid database path: {}",
                path.to_string_lossy()
            )),
            other => SensorLinkError::Storage(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_sensorlink())
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2::Error → SensorLinkError */
/* -------------------------------------------------------------------------- */

impl IntoSensorLinkError for PoolError {
    fn into_sensorlink(self) -> SensorLinkError {
        SensorLinkError::Storage(format!("connection pool unavailable: {self}"))
    }
}

impl From<PoolError> for InfraError {
    fn from(value: PoolError) -> Self {
        InfraError(value.into_sensorlink())
    }
}

/* -------------------------------------------------------------------------- */
/* tokio JoinError → SensorLinkError */
/* -------------------------------------------------------------------------- */

impl IntoSensorLinkError for JoinError {
    fn into_sensorlink(self) -> SensorLinkError {
        if self.is_cancelled() {
            SensorLinkError::Internal("blocking storage task cancelled".into())
        } else {
            SensorLinkError::Internal(format!("blocking storage task panicked: {self}"))
        }
    }
}

impl From<JoinError> for InfraError {
    fn from(value: JoinError) -> Self {
        InfraError(value.into_sensorlink())
    }
}

/* -------------------------------------------------------------------------- */
/* keyring::Error → SensorLinkError */
/* -------------------------------------------------------------------------- */

impl IntoSensorLinkError for KeyringError {
    fn into_sensorlink(self) -> SensorLinkError {
        use KeyringError::*;

        let description = self.to_string();

        match self {
            NoEntry => SensorLinkError::Credential("keychain entry not found".into()),
            BadEncoding(_) => {
                SensorLinkError::Credential("token in keychain is not valid UTF-8".into())
            }
            PlatformFailure(err) => {
                SensorLinkError::Credential(format!("keychain platform error: {err}"))
            }
            NoStorageAccess(err) => {
                SensorLinkError::Credential(format!("unable to access secure storage: {err}"))
            }
            _ => SensorLinkError::Credential(description),
        }
    }
}

impl From<KeyringError> for InfraError {
    fn from(value: KeyringError) -> Self {
        InfraError(value.into_sensorlink())
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → SensorLinkError */
/* -------------------------------------------------------------------------- */

impl IntoSensorLinkError for HttpError {
    fn into_sensorlink(self) -> SensorLinkError {
        if self.is_builder() {
            return SensorLinkError::Config(format!("invalid HTTP client setup: {self}"));
        }
        // Everything else means no usable response came back.
        SensorLinkError::Connectivity(describe_http_failure(&self))
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_sensorlink())
    }
}

/// Short, stable description of a transport-level reqwest failure.
pub fn describe_http_failure(err: &HttpError) -> String {
    if err.is_timeout() {
        return "HTTP request timed out".into();
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        if err.is_connect() {
            return format!("HTTP connection failure: {err}");
        }
    }

    if err.is_body() || err.is_decode() {
        return format!("HTTP response body interrupted: {err}");
    }

    format!("HTTP request failed: {err}")
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
