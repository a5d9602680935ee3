//! Single-flight token refresh
//!
//! Any number of requests may discover an expired access token at once.
//! The first caller becomes the leader and performs the one refresh call;
//! everyone arriving while it is in flight parks on a oneshot channel and
//! receives the leader's outcome, success or failure alike.
//!
//! ```text
//!        Idle ──first caller──► Refreshing { waiters }
//!         ▲                            │
//!         └──── settle (ok / err / leader dropped) ◄┘
//! ```
//!
//! The state lock is a `parking_lot::Mutex` and is never held across an
//! await. A leader future dropped mid-refresh settles its waiters with
//! [`AuthError::RefreshAbandoned`] from a drop guard, so the coordinator
//! cannot get stuck in `Refreshing`.
//!
//! The leader remembers the session epoch it refreshes for. If a login or
//! logout replaces the session while the refresh call is in flight, the
//! outcome is dropped with [`AuthError::SessionChanged`]: nothing is
//! persisted, rotated, cleared or invalidated.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rollcall_domain::constants::DEFAULT_REFRESH_TIMEOUT_SECS;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use super::error::AuthError;
use super::session::SessionState;
use super::token_store::TokenStore;
use super::traits::AuthEndpoints;
use super::types::TokenPair;

type RefreshOutcome = Result<String, AuthError>;

enum RefreshState {
    Idle,
    Refreshing { waiters: Vec<oneshot::Sender<RefreshOutcome>> },
}

enum Role {
    /// Runs the refresh on behalf of the session identified by the epoch
    Leader(u64),
    Waiter(oneshot::Receiver<RefreshOutcome>),
    /// Someone already replaced the rejected token
    Current(String),
    /// The session ended while the rejected request was in flight
    Ended,
}

pub struct RefreshCoordinator {
    endpoints: Arc<dyn AuthEndpoints>,
    store: Arc<TokenStore>,
    session: Arc<SessionState>,
    state: Mutex<RefreshState>,
    timeout: Duration,
    refresh_calls: AtomicUsize,
}

impl RefreshCoordinator {
    pub fn new(
        endpoints: Arc<dyn AuthEndpoints>,
        store: Arc<TokenStore>,
        session: Arc<SessionState>,
    ) -> Self {
        Self {
            endpoints,
            store,
            session,
            state: Mutex::new(RefreshState::Idle),
            timeout: Duration::from_secs(DEFAULT_REFRESH_TIMEOUT_SECS),
            refresh_calls: AtomicUsize::new(0),
        }
    }

    /// Bound each refresh call by `timeout`
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Obtain a freshly refreshed access token.
    ///
    /// Joins the in-flight refresh if there is one, otherwise starts it.
    ///
    /// # Errors
    /// The refresh outcome shared by every concurrent caller. On failure the
    /// token store has been cleared and the session invalidated.
    pub async fn ensure_fresh_token(&self) -> Result<String, AuthError> {
        let role = self.join(None);
        self.resolve(role).await
    }

    /// Like [`Self::ensure_fresh_token`], for a caller whose request was
    /// rejected while carrying `rejected`.
    ///
    /// If the session already holds a different token (a refresh completed
    /// after the request was sent) that token is returned without another
    /// refresh call.
    ///
    /// # Errors
    /// As [`Self::ensure_fresh_token`]; `MissingRefreshToken` if the session
    /// ended while the request was in flight
    pub async fn ensure_fresh_token_after(&self, rejected: &str) -> Result<String, AuthError> {
        let role = self.join(Some(rejected));
        self.resolve(role).await
    }

    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        matches!(*self.state.lock(), RefreshState::Refreshing { .. })
    }

    /// Number of refresh calls issued to the backend
    #[must_use]
    pub fn refresh_count(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    fn join(&self, rejected: Option<&str>) -> Role {
        let mut state = self.state.lock();
        match &mut *state {
            RefreshState::Refreshing { waiters } => {
                let (tx, rx) = oneshot::channel();
                waiters.push(tx);
                Role::Waiter(rx)
            }
            RefreshState::Idle => {
                if let Some(rejected) = rejected {
                    match self.session.access_token() {
                        Some(current) if current != rejected => return Role::Current(current),
                        None => return Role::Ended,
                        Some(_) => {}
                    }
                }
                *state = RefreshState::Refreshing { waiters: Vec::new() };
                Role::Leader(self.session.epoch())
            }
        }
    }

    async fn resolve(&self, role: Role) -> RefreshOutcome {
        match role {
            Role::Leader(epoch) => {
                let guard = SettleGuard { state: &self.state, armed: true };
                let outcome = self.run_refresh(epoch).await;
                guard.finish(outcome.clone());
                outcome
            }
            Role::Waiter(rx) => {
                debug!("Waiting for in-flight token refresh");
                rx.await.unwrap_or(Err(AuthError::RefreshAbandoned))
            }
            Role::Current(token) => {
                debug!("Token already refreshed by another request");
                Ok(token)
            }
            Role::Ended => {
                debug!("Session ended while request was in flight");
                Err(AuthError::MissingRefreshToken)
            }
        }
    }

    async fn run_refresh(&self, epoch: u64) -> RefreshOutcome {
        let refreshed = match self.store.get().await {
            Some(pair) => self.call_refresh(&pair.refresh_token).await,
            None => {
                warn!("Access token expired and no refresh token is stored");
                Err(AuthError::MissingRefreshToken)
            }
        };

        let _writes = self.session.lock_writes().await;
        if self.session.epoch() != epoch {
            info!("Session replaced during token refresh, discarding the outcome");
            return Err(AuthError::SessionChanged);
        }

        let committed = match refreshed {
            Ok(pair) => self.store.set(&pair).await.map(|()| pair.access_token),
            Err(e) => Err(e),
        };

        match committed {
            Ok(access_token) => {
                self.session.rotate(access_token.clone());
                Ok(access_token)
            }
            Err(e) => {
                error!(error = %e, "Token refresh failed");
                self.discard_session(&e).await;
                Err(e)
            }
        }
    }

    async fn call_refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        info!(timeout = ?self.timeout, "Refreshing access token");

        tokio::time::timeout(self.timeout, self.endpoints.refresh(refresh_token))
            .await
            .map_err(|_| AuthError::Timeout(self.timeout))?
    }

    /// Caller holds the session write guard.
    async fn discard_session(&self, reason: &AuthError) {
        if let Err(e) = self.store.clear().await {
            error!(error = %e, "Failed to clear token store after refresh failure");
        }
        if self.session.is_authenticated() {
            self.session.invalidate(reason.to_string());
        } else {
            debug!("No session to invalidate");
        }
    }
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("refreshing", &self.is_refreshing())
            .field("timeout", &self.timeout)
            .field("refresh_calls", &self.refresh_count())
            .finish_non_exhaustive()
    }
}

/// Returns the coordinator to `Idle` and answers every waiter exactly once
struct SettleGuard<'a> {
    state: &'a Mutex<RefreshState>,
    armed: bool,
}

impl SettleGuard<'_> {
    fn finish(mut self, outcome: RefreshOutcome) {
        self.armed = false;
        settle(self.state, &outcome);
    }
}

impl Drop for SettleGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            warn!("Token refresh dropped before completion");
            settle(self.state, &Err(AuthError::RefreshAbandoned));
        }
    }
}

fn settle(state: &Mutex<RefreshState>, outcome: &RefreshOutcome) {
    let waiters = match std::mem::replace(&mut *state.lock(), RefreshState::Idle) {
        RefreshState::Refreshing { waiters } => waiters,
        RefreshState::Idle => Vec::new(),
    };

    debug!(waiters = waiters.len(), ok = outcome.is_ok(), "Refresh settled");
    for waiter in waiters {
        // Receiver gone means that caller was cancelled
        let _ = waiter.send(outcome.clone());
    }
}

#[cfg(test)]
mod tests {
    use futures::future::join_all;
    use rollcall_domain::constants::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};

    use super::*;
    use crate::auth::{SessionEvent, TokenPair};
    use crate::testing::{MockAuthEndpoints, MockKeychainProvider};

    struct Harness {
        keychain: MockKeychainProvider,
        endpoints: MockAuthEndpoints,
        session: Arc<SessionState>,
        coordinator: Arc<RefreshCoordinator>,
    }

    fn harness(keychain: MockKeychainProvider) -> Harness {
        let endpoints = MockAuthEndpoints::new();
        let session = Arc::new(SessionState::new());
        let store = Arc::new(TokenStore::new(Arc::new(keychain.clone())));
        let coordinator = Arc::new(RefreshCoordinator::new(
            Arc::new(endpoints.clone()),
            store,
            Arc::clone(&session),
        ));
        Harness { keychain, endpoints, session, coordinator }
    }

    #[tokio::test]
    async fn success_persists_and_rotates() {
        let h = harness(MockKeychainProvider::with_tokens("A1", "R1"));
        h.session.restore("A1".into());
        h.endpoints.set_refresh(Ok(TokenPair::new("A2", "R2")));
        let mut events = h.session.subscribe();

        let token = h.coordinator.ensure_fresh_token().await.unwrap();

        assert_eq!(token, "A2");
        assert_eq!(h.endpoints.last_refresh_token().as_deref(), Some("R1"));
        assert_eq!(h.keychain.secret(ACCESS_TOKEN_KEY).as_deref(), Some("A2"));
        assert_eq!(h.keychain.secret(REFRESH_TOKEN_KEY).as_deref(), Some("R2"));
        assert_eq!(h.session.access_token().as_deref(), Some("A2"));
        assert_eq!(events.try_recv().unwrap(), SessionEvent::Refreshed);
        assert!(!h.coordinator.is_refreshing());
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_refresh() {
        let h = harness(MockKeychainProvider::with_tokens("A1", "R1"));
        h.endpoints.set_refresh(Ok(TokenPair::new("A2", "R2")));
        h.endpoints.set_refresh_delay(Duration::from_millis(50));

        let results =
            join_all((0..8).map(|_| h.coordinator.ensure_fresh_token())).await;

        assert_eq!(h.endpoints.refresh_calls(), 1);
        assert_eq!(h.coordinator.refresh_count(), 1);
        assert!(results.iter().all(|r| r.as_deref() == Ok("A2")));
    }

    #[tokio::test]
    async fn failure_is_shared_and_invalidates_once() {
        let h = harness(MockKeychainProvider::with_tokens("A1", "R1"));
        h.session.restore("A1".into());
        h.endpoints.set_refresh(Err(AuthError::Rejected { status: 401, message: "expired".into() }));
        h.endpoints.set_refresh_delay(Duration::from_millis(50));
        let mut events = h.session.subscribe();

        let results =
            join_all((0..5).map(|_| h.coordinator.ensure_fresh_token())).await;

        assert_eq!(h.endpoints.refresh_calls(), 1);
        assert!(results.iter().all(|r| matches!(r, Err(AuthError::Rejected { status: 401, .. }))));
        assert!(h.keychain.is_empty());
        assert!(!h.session.is_authenticated());
        assert!(matches!(events.try_recv(), Ok(SessionEvent::Invalidated { .. })));
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn missing_refresh_token_skips_network() {
        let h = harness(MockKeychainProvider::new());
        h.session.restore("A1".into());

        let err = h.coordinator.ensure_fresh_token().await.unwrap_err();

        assert_eq!(err, AuthError::MissingRefreshToken);
        assert_eq!(h.endpoints.refresh_calls(), 0);
        assert!(!h.session.is_authenticated());
    }

    #[tokio::test]
    async fn slow_refresh_times_out() {
        let mut h = harness(MockKeychainProvider::with_tokens("A1", "R1"));
        h.endpoints.set_refresh_delay(Duration::from_millis(500));
        h.coordinator = Arc::new(
            RefreshCoordinator::new(
                Arc::new(h.endpoints.clone()),
                Arc::new(TokenStore::new(Arc::new(h.keychain.clone()))),
                Arc::clone(&h.session),
            )
            .with_timeout(Duration::from_millis(20)),
        );

        let err = h.coordinator.ensure_fresh_token().await.unwrap_err();

        assert_eq!(err, AuthError::Timeout(Duration::from_millis(20)));
        assert!(h.keychain.is_empty());
        assert!(!h.coordinator.is_refreshing());
    }

    #[tokio::test]
    async fn persist_failure_is_a_refresh_failure() {
        let h = harness(MockKeychainProvider::with_tokens("A1", "R1"));
        h.keychain.fail_writes_for(REFRESH_TOKEN_KEY);

        let err = h.coordinator.ensure_fresh_token().await.unwrap_err();

        assert!(matches!(err, AuthError::Storage(_)));
        assert!(h.keychain.is_empty());
        assert!(!h.session.is_authenticated());
    }

    #[tokio::test]
    async fn stale_rejection_reuses_current_token() {
        let h = harness(MockKeychainProvider::with_tokens("A2", "R2"));
        h.session.restore("A2".into());

        let token = h.coordinator.ensure_fresh_token_after("A1").await.unwrap();

        assert_eq!(token, "A2");
        assert_eq!(h.endpoints.refresh_calls(), 0);
    }

    #[tokio::test]
    async fn rejection_after_session_ended_does_not_refresh() {
        let h = harness(MockKeychainProvider::new());
        let mut events = h.session.subscribe();

        let err = h.coordinator.ensure_fresh_token_after("A1").await.unwrap_err();

        assert_eq!(err, AuthError::MissingRefreshToken);
        assert_eq!(h.endpoints.refresh_calls(), 0);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn dropped_leader_releases_waiters() {
        let h = harness(MockKeychainProvider::with_tokens("A1", "R1"));
        h.endpoints.set_refresh_delay(Duration::from_secs(5));

        let leader = {
            let coordinator = Arc::clone(&h.coordinator);
            tokio::spawn(async move { coordinator.ensure_fresh_token().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(h.coordinator.is_refreshing());

        let waiter = {
            let coordinator = Arc::clone(&h.coordinator);
            tokio::spawn(async move { coordinator.ensure_fresh_token().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        leader.abort();

        assert_eq!(waiter.await.unwrap(), Err(AuthError::RefreshAbandoned));
        assert!(!h.coordinator.is_refreshing());
    }

    #[tokio::test]
    async fn logout_during_refresh_is_not_undone() {
        let h = harness(MockKeychainProvider::with_tokens("A1", "R1"));
        h.session.restore("A1".into());
        h.endpoints.set_refresh_delay(Duration::from_millis(100));
        let store = TokenStore::new(Arc::new(h.keychain.clone()));

        let refresh = {
            let coordinator = Arc::clone(&h.coordinator);
            tokio::spawn(async move { coordinator.ensure_fresh_token().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        {
            let _writes = h.session.lock_writes().await;
            h.session.sign_out();
            store.clear().await.unwrap();
        }

        assert_eq!(refresh.await.unwrap(), Err(AuthError::SessionChanged));
        assert!(h.keychain.is_empty());
        assert_eq!(h.session.access_token(), None);
        assert!(!h.coordinator.is_refreshing());
    }

    #[tokio::test]
    async fn login_during_failing_refresh_survives() {
        let h = harness(MockKeychainProvider::with_tokens("A1", "R1"));
        h.session.restore("A1".into());
        h.endpoints.set_refresh(Err(AuthError::Rejected { status: 401, message: "revoked".into() }));
        h.endpoints.set_refresh_delay(Duration::from_millis(100));
        let store = TokenStore::new(Arc::new(h.keychain.clone()));
        let mut events = h.session.subscribe();

        let refresh = {
            let coordinator = Arc::clone(&h.coordinator);
            tokio::spawn(async move { coordinator.ensure_fresh_token().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        {
            let _writes = h.session.lock_writes().await;
            store.set(&TokenPair::new("L1", "LR1")).await.unwrap();
            h.session.sign_in("L1".into());
        }

        assert_eq!(refresh.await.unwrap(), Err(AuthError::SessionChanged));
        assert_eq!(h.keychain.secret(ACCESS_TOKEN_KEY).as_deref(), Some("L1"));
        assert_eq!(h.keychain.secret(REFRESH_TOKEN_KEY).as_deref(), Some("LR1"));
        assert_eq!(h.session.access_token().as_deref(), Some("L1"));
        assert_eq!(events.try_recv().unwrap(), SessionEvent::SignedIn);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn unauthenticated_rejection_stays_quiet() {
        let h = harness(MockKeychainProvider::new());
        let mut events = h.session.subscribe();

        for _ in 0..3 {
            let err = h.coordinator.ensure_fresh_token().await.unwrap_err();
            assert_eq!(err, AuthError::MissingRefreshToken);
        }

        assert_eq!(h.endpoints.refresh_calls(), 0);
        assert!(events.try_recv().is_err());
    }
}
