//! Security primitives
//!
//! Generic secret storage on top of the platform keychain. Token-specific
//! helpers live in [`crate::auth`].

pub mod keychain;

pub use keychain::{KeychainError, KeychainProvider};
