//! Maps non-2xx responses onto the typed protocol error taxonomy.

use sensorlink_domain::ProtocolError;

use super::codec::decode_error_body;

/// Whether `status` is in the success range `200..=299`.
pub fn is_success(status: u16) -> bool {
    (200..=299).contains(&status)
}

/// Classify a non-2xx response.
///
/// The message is taken from a `{"message": ...}` body when present,
/// otherwise the raw body is used verbatim.
pub fn classify(status: u16, raw_body: &str) -> ProtocolError {
    let message = decode_error_body(raw_body).unwrap_or_else(|| raw_body.to_string());

    match status {
        400 => ProtocolError::BadRequest { message },
        401 => ProtocolError::Unauthorized { message },
        403 => ProtocolError::Forbidden { message },
        404 => ProtocolError::NotFound { message },
        500 => ProtocolError::InternalServerError { message },
        code => ProtocolError::GenericServerError { code, message },
    }
}
