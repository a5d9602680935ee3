//! Generic keychain provider for secure credential storage
//!
//! Thin wrapper over the platform keychain (iOS/macOS Keychain, Android
//! Keystore-backed stores, Windows Credential Manager, Linux Secret Service)
//! for storing arbitrary string secrets under a service namespace.
//!
//! ## Module Relationships
//!
//! - This module (`security::keychain`): generic secret storage
//! - `auth::keychain`: async [`SecretStore`](crate::auth::SecretStore)
//!   adapter used by the token store
//!
//! ## Usage
//!
//! ```no_run
//! use rollcall_common::security::KeychainProvider;
//!
//! let keychain = KeychainProvider::new("Rollcall.session");
//! keychain.set_secret("accessToken", "opaque-token")?;
//! let secret = keychain.get_secret("accessToken")?;
//! assert_eq!(secret, "opaque-token");
//! # Ok::<(), rollcall_common::security::KeychainError>(())
//! ```

use keyring::Entry;
use thiserror::Error;
use tracing::debug;

/// Keychain provider scoped to one service name
#[derive(Debug, Clone)]
pub struct KeychainProvider {
    service_name: String,
}

impl KeychainProvider {
    /// Create a new keychain provider for a specific service
    ///
    /// # Examples
    /// ```
    /// use rollcall_common::security::KeychainProvider;
    ///
    /// let keychain = KeychainProvider::new("Rollcall.session");
    /// assert_eq!(keychain.service_name(), "Rollcall.session");
    /// ```
    pub fn new(service_name: impl Into<String>) -> Self {
        Self { service_name: service_name.into() }
    }

    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Store a secret value in the platform keychain
    ///
    /// # Errors
    /// Returns `KeychainError::AccessFailed` if keychain access fails
    pub fn set_secret(&self, key: &str, value: &str) -> Result<(), KeychainError> {
        debug!(service = %self.service_name, key = %key, "Storing secret in keychain");

        let entry = self.create_entry(key)?;
        entry.set_password(value).map_err(|e| {
            KeychainError::AccessFailed(format!("Failed to store secret for {key}: {e}"))
        })?;

        Ok(())
    }

    /// Retrieve a secret value from the platform keychain
    ///
    /// # Errors
    /// Returns `KeychainError::NotFound` if secret doesn't exist
    /// Returns `KeychainError::AccessFailed` if keychain access fails
    pub fn get_secret(&self, key: &str) -> Result<String, KeychainError> {
        debug!(service = %self.service_name, key = %key, "Retrieving secret from keychain");

        let entry = self.create_entry(key)?;
        entry.get_password().map_err(|e| {
            if matches!(e, keyring::Error::NoEntry) {
                KeychainError::NotFound
            } else {
                KeychainError::AccessFailed(format!("Failed to retrieve secret for {key}: {e}"))
            }
        })
    }

    /// Delete a secret from the platform keychain (idempotent)
    ///
    /// # Errors
    /// Returns `KeychainError::AccessFailed` if the entry exists but cannot
    /// be removed
    pub fn delete_secret(&self, key: &str) -> Result<(), KeychainError> {
        debug!(service = %self.service_name, key = %key, "Deleting secret from keychain");

        let entry = self.create_entry(key)?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(KeychainError::AccessFailed(format!(
                "Failed to delete secret for {key}: {e}"
            ))),
        }
    }

    fn create_entry(&self, account: &str) -> Result<Entry, KeychainError> {
        Entry::new(&self.service_name, account).map_err(|e| {
            KeychainError::AccessFailed(format!("Failed to create keychain entry: {e}"))
        })
    }
}

/// Keychain error types
#[derive(Debug, Error)]
pub enum KeychainError {
    /// Keychain access failed (permission denied, not available, etc.)
    #[error("Keychain access failed: {0}")]
    AccessFailed(String),

    /// Entry not found in keychain
    #[error("Entry not found")]
    NotFound,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_keeps_service_name() {
        let keychain = KeychainProvider::new("RollcallTest.session");
        assert_eq!(keychain.service_name(), "RollcallTest.session");
    }

    #[test]
    fn not_found_has_stable_message() {
        assert_eq!(KeychainError::NotFound.to_string(), "Entry not found");
    }
}
