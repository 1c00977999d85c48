//! Request/response types and the HTTP transport seam.

use async_trait::async_trait;
use bazaar_core::ClientConfig;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::ClientResult;

/// An outgoing request. `path` is relative to the configured base URL.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
    pub headers: HeaderMap,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            headers: HeaderMap::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self::new(Method::POST, path).with_body(body)
    }

    pub fn put(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self::new(Method::PUT, path).with_body(body)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// The bearer token carried in `Authorization`, if any.
    pub fn bearer_token(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
    }
}

/// A fully read response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Response with a JSON body.
    pub fn json_body(status: StatusCode, body: &serde_json::Value) -> Self {
        Self::new(status, body.to_string())
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Decode the body. An empty body decodes as JSON `null`.
    pub fn json<T: DeserializeOwned>(&self) -> ClientResult<T> {
        if self.body.trim().is_empty() {
            return Ok(serde_json::from_value(serde_json::Value::Null)?);
        }
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Executes a single request against the backend.
///
/// Implementations do no auth handling of their own; that is the job of
/// [`AuthClient`](crate::AuthClient).
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: &ApiRequest) -> ClientResult<ApiResponse>;
}

/// Transport backed by `reqwest`.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: &ApiRequest) -> ClientResult<ApiResponse> {
        let url = self.url_for(&request.path);
        debug!(method = %request.method, %url, "sending request");

        let mut builder = self
            .client
            .request(request.method.clone(), url)
            .headers(request.headers.clone());
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;
        debug!(status = status.as_u16(), "received response");

        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bearer_token_reads_header() {
        let request = ApiRequest::get("/orders")
            .with_header(AUTHORIZATION, HeaderValue::from_static("Bearer A1"));
        assert_eq!(request.bearer_token(), Some("A1"));
        assert_eq!(ApiRequest::get("/orders").bearer_token(), None);
    }

    #[test]
    fn test_request_builders() {
        let request = ApiRequest::post("/cart/items", json!({"productId": "42", "qty": 2}))
            .with_query("dryRun", "true");
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.query, vec![("dryRun".to_string(), "true".to_string())]);
        assert_eq!(request.body.as_ref().unwrap()["qty"], json!(2));
    }

    #[test]
    fn test_empty_body_decodes_as_null() {
        let response = ApiResponse::new(StatusCode::NO_CONTENT, "");
        let value: serde_json::Value = response.json().unwrap();
        assert!(value.is_null());
        let unit: Option<u32> = response.json().unwrap();
        assert!(unit.is_none());
    }

    #[test]
    fn test_url_for_joins_base() {
        let config = ClientConfig::new("http://localhost:5000/api/", "s.json");
        let transport = ReqwestTransport::new(&config).unwrap();
        assert_eq!(transport.url_for("/orders"), "http://localhost:5000/api/orders");
        assert_eq!(transport.url_for("orders"), "http://localhost:5000/api/orders");
        assert_eq!(transport.url_for("https://cdn.example/x"), "https://cdn.example/x");
    }
}
