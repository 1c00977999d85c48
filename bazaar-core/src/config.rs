//! Configuration loading for the Bazaar client.
//!
//! `api_base_url` and `session_path` are required. The remaining sections
//! fall back to the marketplace defaults when omitted.

use crate::error::ConfigError;
use crate::Role;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Origin all API paths are resolved against.
    pub api_base_url: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Path fragments that are sent without credentials (substring match).
    #[serde(default = "default_public_endpoints")]
    pub public_endpoints: Vec<String>,
    #[serde(default)]
    pub auth: AuthEndpoints,
    #[serde(default)]
    pub routes: LoginRoutes,
    #[serde(default)]
    pub cache: CacheSettings,
    /// File backing the persisted session keys.
    pub session_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct AuthEndpoints {
    pub login_path: String,
    pub refresh_path: String,
}

impl Default for AuthEndpoints {
    fn default() -> Self {
        Self {
            login_path: "/auth/login".to_string(),
            refresh_path: "/auth/refresh-token".to_string(),
        }
    }
}

/// Where to send the user once the session can no longer be recovered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct LoginRoutes {
    pub customer_login: String,
    pub seller_login: String,
}

impl Default for LoginRoutes {
    fn default() -> Self {
        Self {
            customer_login: "/login".to_string(),
            seller_login: "/seller/login".to_string(),
        }
    }
}

impl LoginRoutes {
    /// Sellers go back to the dashboard login, everyone else to the storefront one.
    pub fn for_role(&self, role: Option<Role>) -> &str {
        match role {
            Some(Role::Seller) => &self.seller_login,
            _ => &self.customer_login,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct CacheSettings {
    pub freshness_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            freshness_secs: 5 * 60,
        }
    }
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_public_endpoints() -> Vec<String> {
    ["/products", "/categories", "/auth/login", "/sellers"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl ClientConfig {
    /// Config with every optional section at its default.
    pub fn new(api_base_url: impl Into<String>, session_path: impl Into<PathBuf>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            request_timeout_ms: default_request_timeout_ms(),
            public_endpoints: default_public_endpoints(),
            auth: AuthEndpoints::default(),
            routes: LoginRoutes::default(),
            cache: CacheSettings::default(),
            session_path: session_path.into(),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig = toml::from_str(contents)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let base = self.api_base_url.trim();
        if base.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "api_base_url",
                reason: "must not be empty".to_string(),
            });
        }
        if !base.starts_with("http://") && !base.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                field: "api_base_url",
                reason: "must start with http:// or https://".to_string(),
            });
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.public_endpoints.iter().any(|p| p.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "public_endpoints",
                reason: "entries must not be empty".to_string(),
            });
        }
        if !self.auth.login_path.starts_with('/') {
            return Err(ConfigError::InvalidValue {
                field: "auth.login_path",
                reason: "must start with '/'".to_string(),
            });
        }
        if !self.auth.refresh_path.starts_with('/') {
            return Err(ConfigError::InvalidValue {
                field: "auth.refresh_path",
                reason: "must start with '/'".to_string(),
            });
        }
        if self.routes.customer_login.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "routes.customer_login",
                reason: "must not be empty".to_string(),
            });
        }
        if self.routes.seller_login.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "routes.seller_login",
                reason: "must not be empty".to_string(),
            });
        }
        if self.cache.freshness_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "cache.freshness_secs",
                reason: "must be > 0".to_string(),
            });
        }
        if self.session_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "session_path",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// True when `path` contains one of the public endpoint fragments. The
    /// login path is always public, whatever the allowlist says.
    pub fn is_public_endpoint(&self, path: &str) -> bool {
        path.contains(self.auth.login_path.as_str())
            || self
                .public_endpoints
                .iter()
                .any(|endpoint| path.contains(endpoint.as_str()))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn freshness_window(&self) -> Duration {
        Duration::from_secs(self.cache.freshness_secs)
    }
}
