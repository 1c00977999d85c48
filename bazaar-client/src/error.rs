//! Error types for the client.

use bazaar_core::{FetchError, FALLBACK_ERROR_MESSAGE};
use serde::Deserialize;

use crate::transport::ApiResponse;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Transport error: {0}")]
    Transport(String),
    /// Non-success response, carrying the server's message or the fallback.
    #[error("{message}")]
    Api { status: u16, message: String },
    #[error("Session expired: {reason}")]
    SessionExpired { reason: String, redirect_to: String },
    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ClientError {
    /// Build the normalized error for a non-success response.
    pub fn from_response(response: &ApiResponse) -> Self {
        ClientError::Api {
            status: response.status.as_u16(),
            message: error_message(&response.body),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::SessionExpired { .. } => Some(401),
            ClientError::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(self, ClientError::SessionExpired { .. })
    }
}

impl From<ClientError> for FetchError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Api { status, message } => FetchError::with_status(status, message),
            other => FetchError {
                status: other.status(),
                message: other.to_string(),
            },
        }
    }
}

/// Storage layer errors for persisted session keys.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Extract `message` from an error body, or fall back to the generic text.
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_ERROR_MESSAGE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_uses_server_message() {
        assert_eq!(
            error_message(r#"{"message": "Voucher already redeemed"}"#),
            "Voucher already redeemed"
        );
    }

    #[test]
    fn test_error_message_falls_back() {
        assert_eq!(error_message(""), FALLBACK_ERROR_MESSAGE);
        assert_eq!(error_message("<html>502</html>"), FALLBACK_ERROR_MESSAGE);
        assert_eq!(error_message(r#"{"error": "nope"}"#), FALLBACK_ERROR_MESSAGE);
        assert_eq!(error_message(r#"{"message": "  "}"#), FALLBACK_ERROR_MESSAGE);
        assert_eq!(error_message(r#"{"message": 12}"#), FALLBACK_ERROR_MESSAGE);
    }

    #[test]
    fn test_fetch_error_keeps_api_message() {
        let err = ClientError::Api {
            status: 404,
            message: "Product not found".to_string(),
        };
        let fetch: FetchError = err.into();
        assert_eq!(fetch, FetchError::with_status(404, "Product not found"));
    }

    #[test]
    fn test_session_expired_reports_401() {
        let err = ClientError::SessionExpired {
            reason: "refresh rejected".to_string(),
            redirect_to: "/login".to_string(),
        };
        assert_eq!(err.status(), Some(401));
        assert!(err.is_session_expired());
    }
}
