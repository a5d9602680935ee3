//! Async [`SecretStore`] adapter over the platform keychain.
//!
//! # Module Layering
//!
//! - **`security::keychain`**: blocking secret storage via the platform
//!   keychain
//! - **`auth::keychain`** (this module): runs those calls on tokio's blocking
//!   pool so keychain prompts and IPC never stall the async runtime
//! - **`auth::token_store`**: token-pair semantics on top of any
//!   [`SecretStore`]

use async_trait::async_trait;

use crate::auth::traits::SecretStore;
use crate::security::{KeychainError, KeychainProvider};

async fn run_blocking<T, F>(op: F) -> Result<T, KeychainError>
where
    F: FnOnce() -> Result<T, KeychainError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(op)
        .await
        .map_err(|e| KeychainError::AccessFailed(format!("Keychain task failed: {e}")))?
}

#[async_trait]
impl SecretStore for KeychainProvider {
    async fn set_secret(&self, key: &str, value: &str) -> Result<(), KeychainError> {
        let provider = self.clone();
        let (key, value) = (key.to_owned(), value.to_owned());
        run_blocking(move || provider.set_secret(&key, &value)).await
    }

    async fn get_secret(&self, key: &str) -> Result<String, KeychainError> {
        let provider = self.clone();
        let key = key.to_owned();
        run_blocking(move || provider.get_secret(&key)).await
    }

    async fn delete_secret(&self, key: &str) -> Result<(), KeychainError> {
        let provider = self.clone();
        let key = key.to_owned();
        run_blocking(move || provider.delete_secret(&key)).await
    }
}
