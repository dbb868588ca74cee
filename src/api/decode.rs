//! Response decoding
//!
//! Strict decoding into the expected shape comes first. Callers that need
//! to tell a business rejection from a shape mismatch use
//! [`decode_or_rejection`], which falls back to the flat
//! `{error|conflict|message}` object before giving up.

use serde::de::DeserializeOwned;

use super::errors::{ApiError, ApiResult};
use super::types::ServerMessage;

/// Maximum characters of a raw body echoed back in a decode error
pub const SNIPPET_MAX_CHARS: usize = 200;

/// Outcome of decoding a body that may carry a rejection instead of data
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded<T> {
    Data(T),
    Rejected(ServerMessage),
}

impl<T> Decoded<T> {
    /// Data as `Ok`, rejection as `ApiError::Rejected`
    pub fn into_result(self) -> ApiResult<T> {
        match self {
            Decoded::Data(value) => Ok(value),
            Decoded::Rejected(message) => Err(ApiError::Rejected(message)),
        }
    }
}

/// Printable prefix of a raw body
pub fn snippet(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .chars()
        .take(SNIPPET_MAX_CHARS)
        .collect()
}

fn decode_error(err: serde_json::Error, raw: &[u8]) -> ApiError {
    ApiError::Decode {
        reason: err.to_string(),
        snippet: snippet(raw),
    }
}

/// Strictly decode `raw` into `T`
pub fn decode<T: DeserializeOwned>(raw: &[u8]) -> ApiResult<T> {
    serde_json::from_slice(raw).map_err(|e| decode_error(e, raw))
}

/// Decode `raw` into `T`, or recognize a flat server message
pub fn decode_or_rejection<T: DeserializeOwned>(raw: &[u8]) -> ApiResult<Decoded<T>> {
    match serde_json::from_slice::<T>(raw) {
        Ok(value) => Ok(Decoded::Data(value)),
        Err(strict_err) => match serde_json::from_slice::<ServerMessage>(raw) {
            Ok(message) => Ok(Decoded::Rejected(message)),
            Err(_) => Err(decode_error(strict_err, raw)),
        },
    }
}

/// Decode a mutation endpoint's flat message object
pub fn decode_message(raw: &[u8]) -> ApiResult<ServerMessage> {
    decode(raw)
}

/// Human-readable message for a non-2xx body
///
/// The embedded server message if there is one, else a generic status line.
pub fn message_from_body(status: u16, raw: &[u8]) -> String {
    match serde_json::from_slice::<ServerMessage>(raw) {
        Ok(message) => message.text().to_string(),
        Err(_) => format!("Request failed with status {}", status),
    }
}

/// Like [`message_from_body`], but a plain-text body is passed through
///
/// For endpoints whose error bodies are known to be user-facing text.
pub fn text_from_body(status: u16, raw: &[u8]) -> String {
    if let Ok(message) = serde_json::from_slice::<ServerMessage>(raw) {
        return message.text().to_string();
    }
    let text = snippet(raw);
    let text = text.trim();
    if text.is_empty() {
        format!("Request failed with status {}", status)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::CatalogItem;

    #[test]
    fn test_decode_list() {
        let raw = br#"[{"ID_BENEFICIO":"1","NOMBRE":"Cafe","DESCRIPCION":"","PUNTOS":"10"}]"#;
        let items: Vec<CatalogItem> = decode(raw).unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_empty_list_is_data_not_error() {
        let decoded: Decoded<Vec<CatalogItem>> = decode_or_rejection(b"[]").unwrap();
        assert_eq!(decoded, Decoded::Data(vec![]));
    }

    #[test]
    fn test_error_object_vs_malformed_body_not_conflated() {
        let rejected = decode_or_rejection::<Vec<CatalogItem>>(br#"{"error": "x"}"#)
            .unwrap()
            .into_result();
        let malformed = decode_or_rejection::<Vec<CatalogItem>>(b"<html>oops</html>");

        match rejected {
            Err(ApiError::Rejected(ServerMessage::Error(text))) => assert_eq!(text, "x"),
            other => panic!("Expected Rejected, got {:?}", other),
        }
        match malformed {
            Err(ApiError::Decode { snippet, .. }) => assert_eq!(snippet, "<html>oops</html>"),
            other => panic!("Expected Decode, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_shape_json_is_decode_error() {
        let result = decode_or_rejection::<Vec<CatalogItem>>(br#"{"unexpected": true}"#);
        assert!(matches!(result, Err(ApiError::Decode { .. })));
    }

    #[test]
    fn test_strict_decode_does_not_accept_rejection() {
        let result = decode::<Vec<CatalogItem>>(br#"{"error": "x"}"#);
        assert!(matches!(result, Err(ApiError::Decode { .. })));
    }

    #[test]
    fn test_snippet_is_truncated() {
        let raw = vec![b'a'; 1000];
        assert_eq!(snippet(&raw).len(), SNIPPET_MAX_CHARS);
    }

    #[test]
    fn test_message_from_body() {
        assert_eq!(
            message_from_body(400, r#"{"error":"Llave de sesión inválida."}"#.as_bytes()),
            "Llave de sesión inválida."
        );
        assert_eq!(message_from_body(502, b""), "Request failed with status 502");
    }

    #[test]
    fn test_message_from_body_hides_non_json_bodies() {
        let html = b"<html><body><h1>502 Bad Gateway</h1></body></html>";
        assert_eq!(message_from_body(502, html), "Request failed with status 502");
        assert_eq!(
            message_from_body(500, b"Internal Server Error"),
            "Request failed with status 500"
        );
    }

    #[test]
    fn test_text_from_body_passes_plain_text() {
        assert_eq!(text_from_body(404, b"Evento no encontrado\n"), "Evento no encontrado");
        assert_eq!(text_from_body(400, br#"{"error":"x"}"#), "x");
        assert_eq!(text_from_body(500, b"  "), "Request failed with status 500");
    }
}
