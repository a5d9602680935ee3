//! Bearer-token session infrastructure
//!
//! Everything needed to keep an authenticated session alive against a
//! backend that issues an access/refresh token pair and answers `401` once
//! the access token has expired.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │  RefreshCoordinator  │  Single-flight refresh, queued waiters
//! └─────────┬────────────┘
//!           │
//!           ├──► AuthEndpoints   (login / register / refresh routes)
//!           ├──► SessionState    (current access token + event broadcast)
//!           └──► TokenStore      (token pair persistence)
//!                     │
//!                     └──► SecretStore  (platform keychain, or a mock)
//! ```
//!
//! The HTTP implementation of [`AuthEndpoints`] and the request pipeline
//! that drives the coordinator live in `rollcall-infra`.
//!
//! # Usage Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use rollcall_common::auth::{SessionState, TokenStore};
//! use rollcall_common::security::KeychainProvider;
//!
//! # async fn example() {
//! let keychain = Arc::new(KeychainProvider::new("Rollcall.session".to_string()));
//! let store = TokenStore::new(keychain);
//! let session = SessionState::new();
//!
//! if let Some(pair) = store.get().await {
//!     session.restore(pair.access_token);
//! }
//! # }
//! ```
//!
//! # Module Organization
//!
//! - **[`types`]**: Token pair and wire payloads
//! - **[`credentials`]**: Login/signup input and its validation
//! - **[`token_store`]**: Token pair persistence over a [`SecretStore`]
//! - **[`session`]**: In-memory session state and [`SessionEvent`]s
//! - **[`refresh`]**: The single-flight [`RefreshCoordinator`]
//! - **[`traits`]**: Seams for the backend and secret storage
//!
//! # Platform Support
//!
//! - **macOS / iOS**: Keychain Services via `keyring` crate
//! - **Windows**: Windows Credential Manager via `keyring` crate
//! - **Linux**: Secret Service API via `keyring` crate

pub mod credentials;
mod error;
mod keychain;
pub mod refresh;
pub mod session;
pub mod token_store;
pub mod traits;
pub mod types;

pub use credentials::{Credentials, SignupForm};
pub use error::{AuthError, AuthErrorCategory};
pub use refresh::RefreshCoordinator;
pub use session::{SessionEvent, SessionSnapshot, SessionState};
pub use token_store::TokenStore;
pub use traits::{AuthEndpoints, SecretStore};
pub use types::{RefreshRequest, TokenPair, TokenResponse};
