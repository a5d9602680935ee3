//! Traits for auth endpoints and secret storage
//!
//! These traits enable dependency injection and testing by abstracting
//! external dependencies (the backend's auth routes, the platform keychain).

use async_trait::async_trait;

use super::credentials::Credentials;
use super::error::AuthError;
use super::types::TokenPair;
use crate::security::KeychainError;

/// Backend authentication routes
///
/// Implementations must not attach the session's bearer token and must not
/// route through the refresh-aware request pipeline: a 401 from these calls
/// is a verdict, not an expiry.
#[async_trait]
pub trait AuthEndpoints: Send + Sync {
    /// Exchange credentials for a token pair
    ///
    /// # Errors
    /// `Rejected` for refused credentials, `MalformedResponse` if either token
    /// is missing, `Network`/`Server` for transport trouble
    async fn login(&self, credentials: &Credentials) -> Result<TokenPair, AuthError>;

    /// Register a new account
    ///
    /// # Returns
    /// The server's success payload, passed through untouched
    ///
    /// # Errors
    /// Same classification as [`AuthEndpoints::login`]
    async fn register(&self, credentials: &Credentials) -> Result<serde_json::Value, AuthError>;

    /// Exchange a refresh token for a new token pair
    ///
    /// # Errors
    /// `Rejected` when the refresh token is expired or revoked
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError>;

    /// Revoke the session server-side
    ///
    /// Deployments without a logout route keep the default no-op.
    ///
    /// # Errors
    /// Transport or server failures; callers treat them as advisory
    async fn logout(&self, _access_token: &str) -> Result<(), AuthError> {
        Ok(())
    }
}

/// Encrypted-at-rest string storage
///
/// This trait abstracts keychain/credential storage to enable testing with
/// mock implementations and to support different storage backends.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Store a secret under `key`, replacing any previous value
    ///
    /// # Errors
    /// Returns error if storage fails
    async fn set_secret(&self, key: &str, value: &str) -> Result<(), KeychainError>;

    /// Retrieve the secret stored under `key`
    ///
    /// # Errors
    /// `KeychainError::NotFound` if nothing is stored, other variants if the
    /// store could not be read
    async fn get_secret(&self, key: &str) -> Result<String, KeychainError>;

    /// Delete the secret under `key`; deleting a missing key succeeds
    ///
    /// # Errors
    /// Returns error if deletion fails
    async fn delete_secret(&self, key: &str) -> Result<(), KeychainError>;
}
