//! In-memory session state
//!
//! [`SessionState`] is the single owner of "the access token new requests
//! should carry". The request pipeline reads it before every call; only the
//! lifecycle façade and the refresh coordinator write it. Every transition
//! except a silent restore/reset is announced on a broadcast channel so the
//! UI can react (e.g. redirect to login on [`SessionEvent::Invalidated`]).

use std::fmt;

use parking_lot::RwLock;
use rollcall_domain::constants::SESSION_EVENT_CAPACITY;
use tokio::sync::{broadcast, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Session transition notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Login succeeded
    SignedIn,
    /// A refresh replaced the access token
    Refreshed,
    /// The user logged out
    SignedOut,
    /// The session was discarded after a failed refresh
    Invalidated { reason: String },
}

/// Point-in-time copy of the session
#[derive(Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub authenticated: bool,
    pub access_token: Option<String>,
}

impl fmt::Debug for SessionSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionSnapshot")
            .field("authenticated", &self.authenticated)
            .field("access_token", &self.access_token.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

pub struct SessionState {
    current: RwLock<Current>,
    writes: Mutex<()>,
    events: broadcast::Sender<SessionEvent>,
}

#[derive(Default)]
struct Current {
    access_token: Option<String>,
    /// Bumped whenever one session replaces another (restore, sign-in,
    /// sign-out, invalidation). A refresh never bumps it.
    epoch: u64,
}

impl Current {
    fn replace(&mut self, access_token: Option<String>) -> Option<String> {
        self.epoch += 1;
        std::mem::replace(&mut self.access_token, access_token)
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    /// Create an unauthenticated session.
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(SESSION_EVENT_CAPACITY);
        Self { current: RwLock::new(Current::default()), writes: Mutex::new(()), events }
    }

    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.current.read().access_token.clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.current.read().access_token.is_some()
    }

    /// Identity of the current session; changes on every login, logout,
    /// restore or invalidation but not on a token refresh.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.current.read().epoch
    }

    /// Serialize a token-store write with the session transition it belongs
    /// to.
    ///
    /// Login, logout and the commit phase of a refresh all hold this guard
    /// across their store write and state change, so a refresh that checks
    /// [`Self::epoch`] under it cannot resurrect or wipe a session that was
    /// replaced while its network call was in flight.
    pub async fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.writes.lock().await
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let access_token = self.access_token();
        SessionSnapshot { authenticated: access_token.is_some(), access_token }
    }

    /// Receive every transition published after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Adopt a token read back from storage at start-up. No event.
    pub fn restore(&self, access_token: String) {
        self.current.write().replace(Some(access_token));
        debug!("Session restored from storage");
    }

    pub fn sign_in(&self, access_token: String) {
        self.current.write().replace(Some(access_token));
        info!("Session signed in");
        self.publish(SessionEvent::SignedIn);
    }

    /// Swap in a refreshed token for the same session.
    pub fn rotate(&self, access_token: String) {
        self.current.write().access_token = Some(access_token);
        info!("Session token refreshed");
        self.publish(SessionEvent::Refreshed);
    }

    /// End the session at the user's request.
    ///
    /// Publishes `SignedOut` only if there was a session to end, so repeated
    /// logouts stay quiet.
    pub fn sign_out(&self) {
        if self.current.write().replace(None).is_some() {
            info!("Session signed out");
            self.publish(SessionEvent::SignedOut);
        }
    }

    /// Discard the session after a failed refresh.
    pub fn invalidate(&self, reason: impl Into<String>) {
        let reason = reason.into();
        self.current.write().replace(None);
        warn!(%reason, "Session invalidated");
        self.publish(SessionEvent::Invalidated { reason });
    }

    /// Drop the in-memory token without notifying anyone.
    pub fn reset(&self) {
        self.current.write().replace(None);
    }

    fn publish(&self, event: SessionEvent) {
        // No subscribers is not an error
        let _ = self.events.send(event);
    }
}

impl fmt::Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionState")
            .field("authenticated", &self.is_authenticated())
            .field("subscribers", &self.events.receiver_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::broadcast::error::TryRecvError;

    use super::*;

    #[test]
    fn starts_unauthenticated() {
        let session = SessionState::new();
        assert!(!session.is_authenticated());
        assert_eq!(session.snapshot(), SessionSnapshot { authenticated: false, access_token: None });
    }

    #[test]
    fn authenticated_tracks_token_presence() {
        let session = SessionState::new();

        session.sign_in("A1".into());
        assert_eq!(session.snapshot().access_token.as_deref(), Some("A1"));
        assert!(session.snapshot().authenticated);

        session.invalidate("refresh rejected");
        assert!(!session.snapshot().authenticated);
        assert_eq!(session.access_token(), None);
    }

    #[test]
    fn transitions_are_broadcast() {
        let session = SessionState::new();
        let mut rx = session.subscribe();

        session.sign_in("A1".into());
        session.rotate("A2".into());
        session.invalidate("expired");

        assert_eq!(rx.try_recv().unwrap(), SessionEvent::SignedIn);
        assert_eq!(rx.try_recv().unwrap(), SessionEvent::Refreshed);
        assert_eq!(rx.try_recv().unwrap(), SessionEvent::Invalidated { reason: "expired".into() });
    }

    #[test]
    fn restore_and_reset_are_silent() {
        let session = SessionState::new();
        let mut rx = session.subscribe();

        session.restore("A1".into());
        assert!(session.is_authenticated());
        session.reset();
        assert!(!session.is_authenticated());

        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    }

    #[test]
    fn sign_out_only_announces_once() {
        let session = SessionState::new();
        let mut rx = session.subscribe();

        session.sign_in("A1".into());
        session.sign_out();
        session.sign_out();

        assert_eq!(rx.try_recv().unwrap(), SessionEvent::SignedIn);
        assert_eq!(rx.try_recv().unwrap(), SessionEvent::SignedOut);
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    }

    #[test]
    fn epoch_tracks_session_identity() {
        let session = SessionState::new();
        let start = session.epoch();

        session.sign_in("A1".into());
        let signed_in = session.epoch();
        assert_ne!(signed_in, start);

        session.rotate("A2".into());
        assert_eq!(session.epoch(), signed_in);

        session.sign_out();
        assert_ne!(session.epoch(), signed_in);
    }

    #[test]
    fn snapshot_debug_hides_token() {
        let session = SessionState::new();
        session.restore("secret-token".into());
        assert!(!format!("{:?}", session.snapshot()).contains("secret-token"));
    }
}
