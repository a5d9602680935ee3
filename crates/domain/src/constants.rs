//! Application constants
//!
//! Centralized location for domain-level constants used throughout the
//! application.

// Secure storage
pub const DEFAULT_KEYCHAIN_SERVICE: &str = "Rollcall.session";
pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

// HTTP
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_REFRESH_TIMEOUT_SECS: u64 = 15;
pub const BEARER_PREFIX: &str = "Bearer ";

// Credentials
pub const MIN_PASSWORD_LENGTH: usize = 6;

// Session events
pub const SESSION_EVENT_CAPACITY: usize = 32;
