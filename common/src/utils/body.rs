//! Request body decoding.
//!
//! Handlers that must run checks before the body is interpreted take the raw
//! bytes and decode them here, so a bad body maps to the same error envelope
//! as any other validation failure.

use serde::de::DeserializeOwned;

use crate::errors::{AppError, AppResult};

/// Decodes a JSON request body.
///
/// # Errors
/// Returns `AppError::Validation` when the body is empty or is not valid JSON
/// for `T`.
pub fn parse_json<T: DeserializeOwned>(body: &[u8]) -> AppResult<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(AppError::Validation("request body required".to_string()));
    }
    serde_json::from_slice(body).map_err(|e| AppError::Validation(format!("invalid JSON body: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Payload {
        title: String,
    }

    #[test]
    fn test_parses_valid_body() {
        let parsed: Payload = parse_json(br#"{"title":"hi"}"#).unwrap();
        assert_eq!(parsed, Payload { title: "hi".into() });
    }

    #[test]
    fn test_empty_body_is_validation_error() {
        let err = parse_json::<Payload>(b"  ").unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m == "request body required"));
    }

    #[test]
    fn test_malformed_body_is_validation_error() {
        let err = parse_json::<Payload>(b"{\"title\":").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(err.status(), axum::http::StatusCode::UNPROCESSABLE_ENTITY);
    }
}
