//! Error type shared by every session operation
//!
//! `AuthError` is `Clone` because a single refresh outcome is fanned out to
//! every caller queued behind it.

use std::time::Duration;

use rollcall_domain::RollcallError;
use thiserror::Error;

use crate::security::KeychainError;
use crate::validation::ValidationError;

/// Coarse classification used by callers to pick a user-facing reaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorCategory {
    /// Bad user input, caught before any network call
    Validation,
    /// Server refused credentials or refresh token; session is over
    AuthRejected,
    /// Transport or server trouble; the caller may retry
    Network,
    /// Secure storage unavailable; treated as "no session"
    Storage,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("Rejected by server ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("No refresh token available")]
    MissingRefreshToken,

    #[error("Token storage error: {0}")]
    Storage(String),

    #[error("Token refresh abandoned before completion")]
    RefreshAbandoned,

    /// A login or logout replaced the session while its refresh was in flight
    #[error("Session changed during token refresh")]
    SessionChanged,
}

impl AuthError {
    #[must_use]
    pub fn category(&self) -> AuthErrorCategory {
        match self {
            Self::Validation(_) => AuthErrorCategory::Validation,
            Self::Rejected { .. } | Self::MissingRefreshToken => AuthErrorCategory::AuthRejected,
            Self::Server { .. }
            | Self::Network(_)
            | Self::Timeout(_)
            | Self::MalformedResponse(_)
            | Self::RefreshAbandoned
            | Self::SessionChanged => AuthErrorCategory::Network,
            Self::Storage(_) => AuthErrorCategory::Storage,
        }
    }

    /// Whether the server has definitively refused this session.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.category() == AuthErrorCategory::AuthRejected
    }
}

impl From<KeychainError> for AuthError {
    fn from(err: KeychainError) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<AuthError> for RollcallError {
    fn from(err: AuthError) -> Self {
        match err.category() {
            AuthErrorCategory::Validation => Self::InvalidInput(err.to_string()),
            AuthErrorCategory::AuthRejected => Self::Auth(err.to_string()),
            AuthErrorCategory::Network => Self::Network(err.to_string()),
            AuthErrorCategory::Storage => Self::Storage(err.to_string()),
        }
    }
}
