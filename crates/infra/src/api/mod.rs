//! Backend API access
//!
//! - [`endpoints`]: auth routes (login, register, refresh, logout) called
//!   directly, without bearer handling
//! - [`client`]: the authenticated pipeline every other call goes through
//! - [`auth`]: the [`SessionService`] façade tying both to the token store
//!   and session state
//!
//! All external calls are bounded by the configured request timeout.

pub mod auth;
pub mod client;
pub mod endpoints;
pub mod errors;

pub use auth::SessionService;
pub use client::{ApiClient, ApiClientBuilder, ApiRequest, ApiResponse};
pub use endpoints::HttpAuthEndpoints;
pub use errors::{ApiError, ApiErrorCategory};
