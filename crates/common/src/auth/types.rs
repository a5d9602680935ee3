//! Session token types
//!
//! Tokens are opaque bearer strings. Expiry is never derived from their
//! contents; the server signals it with a 401.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::AuthError;

/// Access/refresh token pair
///
/// Both halves are persisted together or not at all.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenPair {
    /// Bearer token attached to API requests
    pub access_token: String,

    /// Long-lived token exchanged for a new pair at `auth/refresh`
    pub refresh_token: String,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self { access_token: access_token.into(), refresh_token: refresh_token.into() }
    }
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"[redacted]")
            .field("refresh_token", &"[redacted]")
            .finish()
    }
}

/// Token payload returned by the login and refresh endpoints
///
/// Fields are optional on the wire so a partial response can be reported as
/// malformed instead of failing deserialization with a generic error.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl TryFrom<TokenResponse> for TokenPair {
    type Error = AuthError;

    fn try_from(response: TokenResponse) -> Result<Self, Self::Error> {
        let access_token = response
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthError::MalformedResponse("response missing accessToken".into()))?;
        let refresh_token = response
            .refresh_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthError::MalformedResponse("response missing refreshToken".into()))?;

        Ok(Self { access_token, refresh_token })
    }
}

/// Body of `POST auth/refresh`
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}
