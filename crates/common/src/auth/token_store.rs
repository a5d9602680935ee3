//! Persistent token pair storage
//!
//! Wraps a [`SecretStore`] with token-pair semantics: both halves are written
//! together or not at all, and a half pair reads back as "no session".

use std::sync::Arc;

use rollcall_domain::constants::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use tracing::{debug, info, warn};

use super::error::AuthError;
use super::traits::SecretStore;
use super::types::TokenPair;
use crate::security::KeychainError;

/// Durable home of the session's token pair
pub struct TokenStore {
    backend: Arc<dyn SecretStore>,
}

impl TokenStore {
    pub fn new(backend: Arc<dyn SecretStore>) -> Self {
        Self { backend }
    }

    /// Read the stored pair, distinguishing "absent" from "unreadable".
    ///
    /// # Returns
    /// `Ok(None)` when either half is missing
    ///
    /// # Errors
    /// `AuthError::Storage` if the backend could not be read
    pub async fn load(&self) -> Result<Option<TokenPair>, AuthError> {
        let access = read_optional(self.backend.as_ref(), ACCESS_TOKEN_KEY).await?;
        let refresh = read_optional(self.backend.as_ref(), REFRESH_TOKEN_KEY).await?;

        match (access, refresh) {
            (Some(access_token), Some(refresh_token)) => {
                Ok(Some(TokenPair { access_token, refresh_token }))
            }
            (None, None) => Ok(None),
            (access, refresh) => {
                warn!(
                    has_access = access.is_some(),
                    has_refresh = refresh.is_some(),
                    "Ignoring incomplete token pair in secure storage"
                );
                Ok(None)
            }
        }
    }

    /// Read the stored pair; storage failures are logged and read as `None`.
    pub async fn get(&self) -> Option<TokenPair> {
        match self.load().await {
            Ok(pair) => pair,
            Err(e) => {
                warn!(error = %e, "Token store unreadable, treating as signed out");
                None
            }
        }
    }

    /// Persist both halves of `pair`.
    ///
    /// A failed write removes whatever was written so storage never holds a
    /// mixed or half pair.
    ///
    /// # Errors
    /// `AuthError::Storage` with the failing write's cause
    pub async fn set(&self, pair: &TokenPair) -> Result<(), AuthError> {
        let written = async {
            self.backend.set_secret(ACCESS_TOKEN_KEY, &pair.access_token).await?;
            self.backend.set_secret(REFRESH_TOKEN_KEY, &pair.refresh_token).await
        }
        .await;

        if let Err(e) = written {
            warn!(error = %e, "Token write failed, rolling back");
            if let Err(rollback) = self.clear().await {
                warn!(error = %rollback, "Token rollback incomplete");
            }
            return Err(e.into());
        }

        debug!("Token pair persisted");
        Ok(())
    }

    /// Delete both halves.
    ///
    /// Both deletions are attempted even if the first fails. Clearing an
    /// empty store succeeds.
    ///
    /// # Errors
    /// The first deletion error
    pub async fn clear(&self) -> Result<(), AuthError> {
        let access = self.backend.delete_secret(ACCESS_TOKEN_KEY).await;
        let refresh = self.backend.delete_secret(REFRESH_TOKEN_KEY).await;

        access.and(refresh)?;
        info!("Token store cleared");
        Ok(())
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore").finish_non_exhaustive()
    }
}

async fn read_optional(store: &dyn SecretStore, key: &str) -> Result<Option<String>, AuthError> {
    match store.get_secret(key).await {
        Ok(value) if value.is_empty() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(KeychainError::NotFound) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockKeychainProvider;

    fn store_over(keychain: &MockKeychainProvider) -> TokenStore {
        TokenStore::new(Arc::new(keychain.clone()))
    }

    #[tokio::test]
    async fn empty_store_reads_none() {
        let store = store_over(&MockKeychainProvider::new());
        assert_eq!(store.load().await.unwrap(), None);
        assert_eq!(store.get().await, None);
    }

    #[tokio::test]
    async fn set_then_get_returns_pair() {
        let keychain = MockKeychainProvider::new();
        let store = store_over(&keychain);

        store.set(&TokenPair::new("A1", "R1")).await.unwrap();

        assert_eq!(store.get().await, Some(TokenPair::new("A1", "R1")));
        assert_eq!(keychain.secret(ACCESS_TOKEN_KEY).as_deref(), Some("A1"));
        assert_eq!(keychain.secret(REFRESH_TOKEN_KEY).as_deref(), Some("R1"));
    }

    #[tokio::test]
    async fn half_pair_reads_as_none() {
        let keychain = MockKeychainProvider::new();
        keychain.insert(ACCESS_TOKEN_KEY, "A1");

        assert_eq!(store_over(&keychain).get().await, None);
    }

    #[tokio::test]
    async fn failed_second_write_leaves_nothing_behind() {
        let keychain = MockKeychainProvider::with_tokens("old-a", "old-r");
        keychain.fail_writes_for(REFRESH_TOKEN_KEY);
        let store = store_over(&keychain);

        let err = store.set(&TokenPair::new("A2", "R2")).await.unwrap_err();

        assert!(matches!(err, AuthError::Storage(_)));
        assert!(keychain.is_empty());
        assert_eq!(store.get().await, None);
    }

    #[tokio::test]
    async fn unreadable_store_is_an_error_for_load_but_none_for_get() {
        let keychain = MockKeychainProvider::with_tokens("A1", "R1");
        keychain.set_fail_reads(true);
        let store = store_over(&keychain);

        assert!(matches!(store.load().await, Err(AuthError::Storage(_))));
        assert_eq!(store.get().await, None);
    }

    #[tokio::test]
    async fn clear_is_idempotent() {
        let keychain = MockKeychainProvider::with_tokens("A1", "R1");
        let store = store_over(&keychain);

        store.clear().await.unwrap();
        store.clear().await.unwrap();

        assert!(keychain.is_empty());
    }

    #[tokio::test]
    async fn clear_reports_delete_failure() {
        let keychain = MockKeychainProvider::with_tokens("A1", "R1");
        keychain.set_fail_deletes(true);

        let err = store_over(&keychain).clear().await.unwrap_err();
        assert!(matches!(err, AuthError::Storage(_)));
    }
}
