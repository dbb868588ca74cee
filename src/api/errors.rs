//! API client error types
//!
//! Every client operation returns `ApiResult<T>`. Business rejections sent
//! by the backend (`{"error": ...}` and friends) are a separate variant from
//! transport failures and shape mismatches.

use thiserror::Error;

use super::types::ServerMessage;

/// Error taxonomy for the remote health/loyalty API
#[derive(Error, Debug)]
pub enum ApiError {
    /// No credential is available (never logged in, or signed out)
    #[error("No active session")]
    MissingSession,

    /// Transport-level failure, no response received
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// HTTP 401/403
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Any other non-2xx response
    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    /// Response body did not match the expected shape
    #[error("Decode error ({reason}): {snippet}")]
    Decode { reason: String, snippet: String },

    /// Backend answered with a flat message object where data was expected
    #[error("Rejected by server: {0}")]
    Rejected(ServerMessage),

    /// Login rejected; message is the server text, unmodified
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// An identifier that must be an integer was not
    #[error("Invalid id format: {0:?}")]
    InvalidIdFormat(String),

    /// A string-encoded numeric field could not be parsed
    #[error("Invalid numeric format for {field}: {value:?}")]
    InvalidNumericFormat { field: &'static str, value: String },

    /// Request body could not be encoded as JSON
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Base URL and endpoint path do not form a valid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A header name or value cannot be sent (bad configured name, or a
    /// session token with characters not allowed in headers)
    #[error("Invalid header: {0}")]
    InvalidHeader(String),
}

impl ApiError {
    /// True for failures where no HTTP response was received
    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Network(_))
    }

    /// True for shape mismatches between backend and client
    pub fn is_decode(&self) -> bool {
        matches!(self, ApiError::Decode { .. })
    }
}

/// Result type alias for API operations
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Failure kinds of the purchased-bonos listing
///
/// The bonos screen maps each kind to its own message, so they are kept as a
/// dedicated enum instead of being folded into `ApiError`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BonosError {
    #[error("Invalid session key")]
    InvalidSessionKey,

    #[error("No purchased bonos found")]
    NoBonosFound,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Invalid response from server")]
    InvalidResponse,

    #[error("Decoding error: {0}")]
    DecodingError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_session_display() {
        assert_eq!(ApiError::MissingSession.to_string(), "No active session");
    }

    #[test]
    fn test_http_status_display() {
        let err = ApiError::HttpStatus {
            status: 400,
            message: "Llave de sesión inválida.".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 400: Llave de sesión inválida.");
    }

    #[test]
    fn test_invalid_numeric_format_display() {
        let err = ApiError::InvalidNumericFormat {
            field: "PUNTOS",
            value: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid numeric format for PUNTOS: \"abc\"");
    }

    #[test]
    fn test_rejected_and_decode_are_distinct() {
        let rejected = ApiError::Rejected(ServerMessage::Error("x".into()));
        let decode = ApiError::Decode {
            reason: "expected value".into(),
            snippet: "<html>".into(),
        };
        assert!(!rejected.is_decode());
        assert!(decode.is_decode());
        assert!(!rejected.is_network());
    }

    #[test]
    fn test_serde_error_converts() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: ApiError = serde_err.into();
        assert!(err.to_string().starts_with("Serialization error"));
    }

    #[test]
    fn test_bonos_error_kinds_distinct() {
        assert_ne!(BonosError::InvalidSessionKey, BonosError::NoBonosFound);
        assert_eq!(
            BonosError::ServerError("boom".into()).to_string(),
            "Server error: boom"
        );
        assert_eq!(
            BonosError::DecodingError("missing field".into()).to_string(),
            "Decoding error: missing field"
        );
    }
}
