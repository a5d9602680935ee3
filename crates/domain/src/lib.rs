//! # Rollcall Domain
//!
//! Business domain types and models for Rollcall.
//!
//! This crate contains:
//! - Domain error types and Result definitions
//! - Configuration structures and the API route table
//! - User and attendance payloads exchanged with the backend
//! - Domain constants
//!
//! ## Architecture
//! - No dependencies on other Rollcall crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
