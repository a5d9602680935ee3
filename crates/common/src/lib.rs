//! Session primitives shared across Rollcall crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: validation and credential rules
//! - `platform`: keychain, token store, session and refresh coordination on
//!   tokio and tracing, plus in-memory test doubles in [`testing`]

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod validation;

// Platform tier
// -------------------------------------------------------------------
#[cfg(feature = "platform")]
pub mod auth;
#[cfg(feature = "platform")]
pub mod security;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(feature = "platform")]
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "platform")]
pub use auth::{
    AuthEndpoints, AuthError, RefreshCoordinator, SecretStore, SessionEvent, SessionState,
    TokenPair, TokenStore,
};
#[cfg(feature = "platform")]
pub use security::{KeychainError, KeychainProvider};
#[cfg(feature = "foundation")]
pub use validation::{EmailValidator, FieldValidator, StringValidator, ValidationError};
