//! Access-token refresh.
//!
//! The refresher is handed to [`AuthClient`](crate::AuthClient) at
//! construction. The HTTP implementation talks to the transport directly so
//! a refresh call can never trigger another refresh.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::{error_message, StorageError};
use crate::transport::{ApiRequest, HttpTransport};

/// Tokens issued by a successful refresh.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshedTokens {
    pub access_token: String,
    /// Present only when the server rotates refresh tokens.
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    #[error("no token refresher configured")]
    NotConfigured,
    #[error("no refresh token stored")]
    MissingRefreshToken,
    #[error("refresh rejected (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("refresh request failed: {0}")]
    Request(String),
    #[error("invalid refresh response: {0}")]
    InvalidResponse(String),
    #[error("could not store refreshed tokens: {0}")]
    Storage(#[from] StorageError),
}

/// Exchanges a refresh token for a new access token.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshedTokens, RefreshError>;
}

/// Refresher that POSTs `{ "refreshToken": ... }` to the refresh endpoint.
#[derive(Clone)]
pub struct HttpTokenRefresher {
    transport: Arc<dyn HttpTransport>,
    refresh_path: String,
}

impl HttpTokenRefresher {
    pub fn new(transport: Arc<dyn HttpTransport>, refresh_path: impl Into<String>) -> Self {
        Self {
            transport,
            refresh_path: refresh_path.into(),
        }
    }
}

#[async_trait]
impl TokenRefresher for HttpTokenRefresher {
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshedTokens, RefreshError> {
        let request = ApiRequest::post(
            self.refresh_path.clone(),
            json!({ "refreshToken": refresh_token }),
        );
        debug!(path = %self.refresh_path, "requesting new access token");

        let response = self
            .transport
            .execute(&request)
            .await
            .map_err(|err| RefreshError::Request(err.to_string()))?;

        if !response.is_success() {
            return Err(RefreshError::Rejected {
                status: response.status.as_u16(),
                message: error_message(&response.body),
            });
        }

        let tokens: RefreshedTokens = serde_json::from_str(&response.body)
            .map_err(|err| RefreshError::InvalidResponse(err.to_string()))?;
        if tokens.access_token.is_empty() {
            return Err(RefreshError::InvalidResponse(
                "empty access token".to_string(),
            ));
        }
        Ok(tokens)
    }
}
