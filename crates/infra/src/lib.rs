//! # Rollcall Infrastructure
//!
//! I/O-facing half of the session manager.
//!
//! This crate contains:
//! - The HTTP transport and auth-route implementation of
//!   [`rollcall_common::auth::AuthEndpoints`]
//! - The authenticated request pipeline ([`ApiClient`]): bearer attachment,
//!   refresh on `401`, one replay
//! - The lifecycle façade ([`SessionService`])
//! - Typed attendance calls
//! - Configuration loading and tracing setup
//!
//! ## Architecture
//! - Token storage, session state and refresh coordination live in
//!   `rollcall-common`
//! - Configuration and payload types live in `rollcall-domain`

pub mod api;
pub mod attendance;
pub mod config;
pub mod errors;
pub mod http;
pub mod observability;

pub use api::{ApiClient, ApiError, SessionService};
pub use attendance::AttendanceClient;
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
