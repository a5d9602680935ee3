//! Tracing setup for binaries and demos
//!
//! Library code only emits `tracing` events; installing a subscriber is the
//! host application's call.

use rollcall_domain::{Result, RollcallError};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Install a global subscriber filtered by `RUST_LOG`.
///
/// `json` switches to one JSON object per line for log shippers.
///
/// # Errors
/// Returns `RollcallError::Config` if a global subscriber is already set or
/// `RUST_LOG` cannot be parsed.
pub fn init_tracing(json: bool) -> Result<()> {
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) => EnvFilter::try_new(directives)
            .map_err(|e| RollcallError::Config(format!("Invalid RUST_LOG: {e}")))?,
        Err(_) => EnvFilter::new(DEFAULT_LOG_FILTER),
    };

    let registry = tracing_subscriber::registry().with(filter);
    let result = if json {
        registry.with(fmt::layer().json().with_target(true)).try_init()
    } else {
        registry.with(fmt::layer().with_target(false)).try_init()
    };

    result.map_err(|e| RollcallError::Config(format!("Failed to install tracing subscriber: {e}")))
}
