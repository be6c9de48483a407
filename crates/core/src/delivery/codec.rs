//! JSON codec for request, response, and error bodies

use sensorlink_domain::{ErrorBody, Result, SensorLinkError};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Serialize a typed request into its wire body.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string(value)
        .map_err(|e| SensorLinkError::Internal(format!("Failed to serialize body: {e}")))
}

/// Deserialize a wire body into `T`.
///
/// An empty (or whitespace-only) body is treated as JSON `null`, so
/// no-content responses decode into `()` or `Option<_>`.
pub fn decode<T: DeserializeOwned>(body: &str) -> Result<T> {
    let result = if body.trim().is_empty() {
        serde_json::from_value(serde_json::Value::Null)
    } else {
        serde_json::from_str(body)
    };

    result.map_err(|e| SensorLinkError::Decode(format!("Failed to parse response: {e}")))
}

/// Extract `message` from a `{"message": "..."}` error body.
pub fn decode_error_body(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body).ok().map(|err| err.message)
}
