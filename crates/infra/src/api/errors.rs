//! API-specific error types
//!
//! Classifies failed API calls. Retry policy is left to the caller: the
//! pipeline never retries on its own beyond the single replay after a
//! token refresh.

use std::time::Duration;

use rollcall_domain::RollcallError;
use thiserror::Error;

/// Coarse grouping of [`ApiError`]s
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiErrorCategory {
    /// 401 that survived the refresh cycle, or 403
    Authentication,
    /// 429
    RateLimit,
    /// 5xx
    Server,
    /// Other 4xx
    Client,
    /// Transport failures and timeouts
    Network,
    /// Invalid client configuration
    Config,
    /// Response body did not match the expected shape
    Decode,
    /// Refresh failed and the session was discarded - sign in again
    SessionExpired,
}

/// API operation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Client error: {0}")]
    Client(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Session expired, sign in again")]
    SessionExpired,
}

impl ApiError {
    /// Get the error category for this error
    pub fn category(&self) -> ApiErrorCategory {
        match self {
            Self::Auth(_) => ApiErrorCategory::Authentication,
            Self::RateLimit(_) => ApiErrorCategory::RateLimit,
            Self::Server(_) => ApiErrorCategory::Server,
            Self::Client(_) => ApiErrorCategory::Client,
            Self::Network(_) | Self::Timeout(_) => ApiErrorCategory::Network,
            Self::Config(_) => ApiErrorCategory::Config,
            Self::Decode(_) => ApiErrorCategory::Decode,
            Self::SessionExpired => ApiErrorCategory::SessionExpired,
        }
    }
}

impl From<RollcallError> for ApiError {
    fn from(err: RollcallError) -> Self {
        match err {
            RollcallError::Network(message) => Self::Network(message),
            RollcallError::Auth(message) => Self::Auth(message),
            RollcallError::Config(message) => Self::Config(message),
            RollcallError::InvalidInput(message) => Self::Client(message),
            RollcallError::Storage(message) | RollcallError::Internal(message) => {
                Self::Server(message)
            }
        }
    }
}

impl From<ApiError> for RollcallError {
    fn from(err: ApiError) -> Self {
        match err.category() {
            ApiErrorCategory::Authentication | ApiErrorCategory::SessionExpired => {
                Self::Auth(err.to_string())
            }
            ApiErrorCategory::Config => Self::Config(err.to_string()),
            ApiErrorCategory::Client => Self::InvalidInput(err.to_string()),
            ApiErrorCategory::Decode => Self::Internal(err.to_string()),
            ApiErrorCategory::RateLimit | ApiErrorCategory::Server | ApiErrorCategory::Network => {
                Self::Network(err.to_string())
            }
        }
    }
}
