//! Shared API plumbing: the error-to-response mapping and payload helpers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use thiserror::Error;

/// API error type mapping to HTTP status codes.
///
/// The outermost handlers convert every unrecoverable failure into one of
/// these; the body is always a `{"error": message}` JSON object.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

/// Decodes an audio/image payload that may arrive as a data URI or bare
/// base64.
pub fn decode_media_payload(payload: &str) -> Result<Vec<u8>, ApiError> {
    let encoded = match payload.split_once(',') {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => payload,
    };
    BASE64
        .decode(encoded.trim())
        .map_err(|e| ApiError::BadRequest(format!("undecodable media payload: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_bare_base64() {
        assert_eq!(decode_media_payload("QUJD").unwrap(), b"ABC");
    }

    #[test]
    fn decodes_data_uri() {
        assert_eq!(
            decode_media_payload("data:audio/webm;base64,QUJD").unwrap(),
            b"ABC"
        );
    }

    #[test]
    fn garbage_is_a_bad_request() {
        assert!(matches!(
            decode_media_payload("!!not base64!!"),
            Err(ApiError::BadRequest(_))
        ));
    }
}
