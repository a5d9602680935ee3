//! Testing utilities and helpers
//!
//! In-memory stand-ins for the two external seams of the session core:
//! - **[`MockKeychainProvider`]**: a [`SecretStore`](crate::auth::SecretStore)
//!   backed by a shared map, with failure injection
//! - **[`MockAuthEndpoints`]**: scripted
//!   [`AuthEndpoints`](crate::auth::AuthEndpoints) with call counting and an
//!   adjustable refresh delay
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use rollcall_common::auth::TokenStore;
//! use rollcall_common::testing::MockKeychainProvider;
//!
//! let keychain = MockKeychainProvider::with_tokens("access", "refresh");
//! let store = TokenStore::new(Arc::new(keychain.clone()));
//!
//! // Clones share storage, so the test can inspect what the store wrote
//! assert!(!keychain.is_empty());
//! ```

pub mod mocks;

pub use mocks::{MockAuthEndpoints, MockKeychainProvider};
