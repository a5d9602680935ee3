//! Mock implementations of the session seams
//!
//! Both mocks are cheap to clone and every clone shares state, so a test can
//! hand one clone to the code under test and keep another to inspect it.

// Allow missing error/panic docs for test mocks - they are designed to be simple
// and errors are clearly indicated by their return types
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rollcall_domain::constants::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use serde_json::{json, Value};

use crate::auth::{AuthEndpoints, AuthError, Credentials, SecretStore, TokenPair};
use crate::security::KeychainError;

#[derive(Debug, Default)]
struct KeychainState {
    secrets: HashMap<String, String>,
    failing_writes: HashSet<String>,
    fail_reads: bool,
    fail_deletes: bool,
}

/// In-memory keychain for testing
///
/// # Examples
///
/// ```
/// use rollcall_common::testing::MockKeychainProvider;
///
/// let keychain = MockKeychainProvider::new();
/// keychain.insert("accessToken", "abc");
///
/// assert_eq!(keychain.secret("accessToken").as_deref(), Some("abc"));
/// assert!(keychain.contains("accessToken"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockKeychainProvider {
    state: Arc<Mutex<KeychainState>>,
}

impl MockKeychainProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// A keychain that already holds a persisted session.
    pub fn with_tokens(access_token: &str, refresh_token: &str) -> Self {
        let keychain = Self::new();
        keychain.insert(ACCESS_TOKEN_KEY, access_token);
        keychain.insert(REFRESH_TOKEN_KEY, refresh_token);
        keychain
    }

    /// Store a value directly, bypassing failure injection.
    pub fn insert(&self, key: &str, value: &str) {
        self.state.lock().secrets.insert(key.to_string(), value.to_string());
    }

    #[must_use]
    pub fn secret(&self, key: &str) -> Option<String> {
        self.state.lock().secrets.get(key).cloned()
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.state.lock().secrets.contains_key(key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().secrets.is_empty()
    }

    /// Make every write to `key` fail until [`Self::heal`] is called.
    pub fn fail_writes_for(&self, key: &str) {
        self.state.lock().failing_writes.insert(key.to_string());
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.state.lock().fail_reads = fail;
    }

    pub fn set_fail_deletes(&self, fail: bool) {
        self.state.lock().fail_deletes = fail;
    }

    /// Remove all injected failures.
    pub fn heal(&self) {
        let mut state = self.state.lock();
        state.failing_writes.clear();
        state.fail_reads = false;
        state.fail_deletes = false;
    }
}

#[async_trait]
impl SecretStore for MockKeychainProvider {
    async fn set_secret(&self, key: &str, value: &str) -> Result<(), KeychainError> {
        let mut state = self.state.lock();
        if state.failing_writes.contains(key) {
            return Err(KeychainError::AccessFailed(format!("write to {key} refused")));
        }
        state.secrets.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get_secret(&self, key: &str) -> Result<String, KeychainError> {
        let state = self.state.lock();
        if state.fail_reads {
            return Err(KeychainError::AccessFailed("keychain locked".to_string()));
        }
        state.secrets.get(key).cloned().ok_or(KeychainError::NotFound)
    }

    async fn delete_secret(&self, key: &str) -> Result<(), KeychainError> {
        let mut state = self.state.lock();
        if state.fail_deletes {
            return Err(KeychainError::AccessFailed(format!("delete of {key} refused")));
        }
        state.secrets.remove(key);
        Ok(())
    }
}

#[derive(Debug)]
struct EndpointScript {
    login: Result<TokenPair, AuthError>,
    register: Result<Value, AuthError>,
    refresh: Result<TokenPair, AuthError>,
    logout: Result<(), AuthError>,
    refresh_delay: Duration,
    last_login: Option<Credentials>,
    last_refresh_token: Option<String>,
}

impl Default for EndpointScript {
    fn default() -> Self {
        Self {
            login: Ok(TokenPair::new("access-1", "refresh-1")),
            register: Ok(json!({ "message": "registered" })),
            refresh: Ok(TokenPair::new("access-2", "refresh-2")),
            logout: Ok(()),
            refresh_delay: Duration::ZERO,
            last_login: None,
            last_refresh_token: None,
        }
    }
}

#[derive(Debug, Default)]
struct CallCounts {
    login: AtomicUsize,
    register: AtomicUsize,
    refresh: AtomicUsize,
    logout: AtomicUsize,
}

/// Scripted auth backend that never touches the network.
///
/// Defaults: login returns `access-1`/`refresh-1`, refresh returns
/// `access-2`/`refresh-2`, register and logout succeed.
#[derive(Debug, Clone, Default)]
pub struct MockAuthEndpoints {
    script: Arc<Mutex<EndpointScript>>,
    calls: Arc<CallCounts>,
}

impl MockAuthEndpoints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_login(&self, outcome: Result<TokenPair, AuthError>) {
        self.script.lock().login = outcome;
    }

    pub fn set_register(&self, outcome: Result<Value, AuthError>) {
        self.script.lock().register = outcome;
    }

    pub fn set_refresh(&self, outcome: Result<TokenPair, AuthError>) {
        self.script.lock().refresh = outcome;
    }

    pub fn set_logout(&self, outcome: Result<(), AuthError>) {
        self.script.lock().logout = outcome;
    }

    /// Hold every refresh call for `delay` before answering.
    pub fn set_refresh_delay(&self, delay: Duration) {
        self.script.lock().refresh_delay = delay;
    }

    #[must_use]
    pub fn login_calls(&self) -> usize {
        self.calls.login.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn register_calls(&self) -> usize {
        self.calls.register.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn refresh_calls(&self) -> usize {
        self.calls.refresh.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn logout_calls(&self) -> usize {
        self.calls.logout.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn last_login(&self) -> Option<Credentials> {
        self.script.lock().last_login.clone()
    }

    #[must_use]
    pub fn last_refresh_token(&self) -> Option<String> {
        self.script.lock().last_refresh_token.clone()
    }
}

#[async_trait]
impl AuthEndpoints for MockAuthEndpoints {
    async fn login(&self, credentials: &Credentials) -> Result<TokenPair, AuthError> {
        self.calls.login.fetch_add(1, Ordering::SeqCst);
        let mut script = self.script.lock();
        script.last_login = Some(credentials.clone());
        script.login.clone()
    }

    async fn register(&self, _credentials: &Credentials) -> Result<Value, AuthError> {
        self.calls.register.fetch_add(1, Ordering::SeqCst);
        self.script.lock().register.clone()
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        self.calls.refresh.fetch_add(1, Ordering::SeqCst);
        let (delay, outcome) = {
            let mut script = self.script.lock();
            script.last_refresh_token = Some(refresh_token.to_string());
            (script.refresh_delay, script.refresh.clone())
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        outcome
    }

    async fn logout(&self, _access_token: &str) -> Result<(), AuthError> {
        self.calls.logout.fetch_add(1, Ordering::SeqCst);
        self.script.lock().logout.clone()
    }
}
