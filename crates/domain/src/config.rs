//! Configuration structures
//!
//! Every field has a default so partial config files and environment
//! overrides can be layered on top of [`Config::default`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_API_BASE_URL, DEFAULT_KEYCHAIN_SERVICE, DEFAULT_REFRESH_TIMEOUT_SECS,
    DEFAULT_REQUEST_TIMEOUT_SECS, MIN_PASSWORD_LENGTH,
};

/// Root application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub auth: AuthConfig,
    pub keychain: KeychainConfig,
}

/// Backend connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL every route is joined onto (e.g. "https://api.example.com/api")
    pub base_url: String,
    /// Per-request timeout
    pub timeout_secs: u64,
    /// Optional User-Agent header
    pub user_agent: Option<String>,
    pub routes: ApiRoutes,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            user_agent: None,
            routes: ApiRoutes::default(),
        }
    }
}

impl ApiConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Join a relative route onto the base URL.
    ///
    /// Absolute `http(s)://` paths are passed through untouched.
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }
}

/// Relative paths of the backend endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiRoutes {
    pub login: String,
    pub register: String,
    pub refresh: String,
    /// Remote logout is optional; most deployments only clear local state.
    pub logout: Option<String>,
    pub current_user: String,
    pub clock_in: String,
    pub clock_out: String,
    pub has_in_time_today: String,
    pub has_out_time_today: String,
}

impl Default for ApiRoutes {
    fn default() -> Self {
        Self {
            login: "auth/login".to_string(),
            register: "auth/register".to_string(),
            refresh: "auth/refresh".to_string(),
            logout: None,
            current_user: "users/me".to_string(),
            clock_in: "attendance/inlog".to_string(),
            clock_out: "attendance/outlog".to_string(),
            has_in_time_today: "attendance/hasInTimeToday".to_string(),
            has_out_time_today: "attendance/hasOutTimeToday".to_string(),
        }
    }
}

/// Session and credential policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Upper bound on a single refresh call; a hung refresh would otherwise
    /// starve every queued request.
    pub refresh_timeout_secs: u64,
    pub min_password_length: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            refresh_timeout_secs: DEFAULT_REFRESH_TIMEOUT_SECS,
            min_password_length: MIN_PASSWORD_LENGTH,
        }
    }
}

impl AuthConfig {
    #[must_use]
    pub fn refresh_timeout(&self) -> Duration {
        Duration::from_secs(self.refresh_timeout_secs)
    }
}

/// Platform keychain settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeychainConfig {
    pub service_name: String,
}

impl Default for KeychainConfig {
    fn default() -> Self {
        Self { service_name: DEFAULT_KEYCHAIN_SERVICE.to_string() }
    }
}
