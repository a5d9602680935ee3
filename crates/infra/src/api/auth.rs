//! Session lifecycle façade
//!
//! [`SessionService`] is what the app's UI talks to: bootstrap at start-up,
//! login, signup, logout, and the authenticated API client for everything
//! else. Login and signup go straight to the auth routes; they never pass
//! through the refresh-aware pipeline.

use std::sync::Arc;

use rollcall_common::auth::{
    AuthEndpoints, AuthError, Credentials, RefreshCoordinator, SecretStore, SessionEvent,
    SessionSnapshot, SessionState, SignupForm, TokenStore,
};
use rollcall_common::security::KeychainProvider;
use rollcall_domain::{Config, CurrentUser, RollcallError};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::client::ApiClient;
use super::endpoints::HttpAuthEndpoints;
use super::errors::ApiError;
use crate::attendance::AttendanceClient;

pub struct SessionService {
    endpoints: Arc<dyn AuthEndpoints>,
    store: Arc<TokenStore>,
    session: Arc<SessionState>,
    refresher: Arc<RefreshCoordinator>,
    api: ApiClient,
    min_password_length: usize,
}

impl SessionService {
    /// Production wiring: HTTP auth routes and the platform keychain.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP clients cannot be built
    pub fn new(config: &Config) -> Result<Self, RollcallError> {
        let endpoints = Arc::new(HttpAuthEndpoints::new(&config.api)?);
        let secrets = Arc::new(KeychainProvider::new(config.keychain.service_name.clone()));
        Self::with_backends(config, endpoints, secrets)
    }

    /// Wire the service over caller-supplied auth routes and secret storage.
    ///
    /// # Errors
    ///
    /// Returns error if the API client cannot be built
    pub fn with_backends(
        config: &Config,
        endpoints: Arc<dyn AuthEndpoints>,
        secrets: Arc<dyn SecretStore>,
    ) -> Result<Self, RollcallError> {
        let store = Arc::new(TokenStore::new(secrets));
        let session = Arc::new(SessionState::new());
        let refresher = Arc::new(
            RefreshCoordinator::new(
                Arc::clone(&endpoints),
                Arc::clone(&store),
                Arc::clone(&session),
            )
            .with_timeout(config.auth.refresh_timeout()),
        );
        let api = ApiClient::new(config.api.clone(), Arc::clone(&session), Arc::clone(&refresher))?;

        Ok(Self {
            endpoints,
            store,
            session,
            refresher,
            api,
            min_password_length: config.auth.min_password_length,
        })
    }

    /// Restore a persisted session. Call once at start-up, before showing
    /// any protected screen.
    ///
    /// # Returns
    ///
    /// `true` if a complete token pair was found
    pub async fn bootstrap(&self) -> bool {
        match self.store.load().await {
            Ok(Some(pair)) => {
                self.session.restore(pair.access_token);
                info!("Restored persisted session");
                true
            }
            Ok(None) => {
                self.session.reset();
                debug!("No persisted session");
                false
            }
            Err(e) => {
                warn!(error = %e, "Token store unreadable at start-up, clearing it");
                if let Err(e) = self.store.clear().await {
                    warn!(error = %e, "Failed to clear unreadable token store");
                }
                self.session.reset();
                false
            }
        }
    }

    /// Sign in; every failure is logged and reported as `false`.
    pub async fn login(&self, email: &str, password: &str) -> bool {
        match self.try_login(email, password).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Login failed");
                false
            }
        }
    }

    /// Sign in, reporting why it failed.
    ///
    /// On any failure the stored tokens are cleared and the session ends.
    ///
    /// # Errors
    ///
    /// `Validation` before any network call, otherwise whatever the auth
    /// route or token store reported
    pub async fn try_login(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let credentials = Credentials::new(email, password);

        let pair = match credentials.validate() {
            Ok(()) => self.endpoints.login(&credentials).await,
            Err(e) => Err(e.into()),
        };

        let _writes = self.session.lock_writes().await;
        let committed = match pair {
            Ok(pair) => self.store.set(&pair).await.map(|()| pair.access_token),
            Err(e) => Err(e),
        };

        match committed {
            Ok(access_token) => {
                self.session.sign_in(access_token);
                info!("Login succeeded");
                Ok(())
            }
            Err(e) => {
                self.clear_local().await;
                Err(e)
            }
        }
    }

    /// Register an account; every failure is logged and reported as `false`.
    ///
    /// Registration does not sign the user in.
    pub async fn signup(&self, email: &str, password: &str, confirm_password: &str) -> bool {
        match self.try_signup(email, password, confirm_password).await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "Signup failed");
                false
            }
        }
    }

    /// Register an account, returning the backend's payload.
    ///
    /// # Errors
    ///
    /// `Validation` before any network call, otherwise whatever the
    /// register route reported
    pub async fn try_signup(
        &self,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<Value, AuthError> {
        let credentials = SignupForm::new(email, password, confirm_password)
            .validate(self.min_password_length)?;

        let payload = self.endpoints.register(&credentials).await?;
        info!("Signup succeeded");
        Ok(payload)
    }

    /// Sign out. Local state is always cleared; a configured remote logout
    /// is attempted first and its failure only logged.
    pub async fn logout(&self) {
        if let Some(token) = self.session.access_token() {
            if let Err(e) = self.endpoints.logout(&token).await {
                warn!(error = %e, "Remote logout failed, clearing local session anyway");
            }
        }
        self.end_session().await;
        info!("Logged out");
    }

    /// Profile of the signed-in user
    ///
    /// # Errors
    ///
    /// Any [`ApiError`] from the request pipeline
    pub async fn current_user(&self) -> Result<CurrentUser, ApiError> {
        self.api.get(&self.api.config().routes.current_user).await
    }

    #[must_use]
    pub fn current_access_token(&self) -> Option<String> {
        self.session.access_token()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    /// Session transitions, including `Invalidated` when a refresh fails
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.session.subscribe()
    }

    /// The authenticated request pipeline
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    #[must_use]
    pub fn attendance(&self) -> AttendanceClient {
        AttendanceClient::new(self.api.clone())
    }

    #[must_use]
    pub fn refresh_count(&self) -> usize {
        self.refresher.refresh_count()
    }

    async fn end_session(&self) {
        let _writes = self.session.lock_writes().await;
        self.clear_local().await;
    }

    /// Caller holds the session write guard.
    async fn clear_local(&self) {
        self.session.sign_out();
        if let Err(e) = self.store.clear().await {
            warn!(error = %e, "Failed to clear token store");
        }
    }
}

impl std::fmt::Debug for SessionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionService")
            .field("session", &self.session)
            .field("refresher", &self.refresher)
            .finish_non_exhaustive()
    }
}
