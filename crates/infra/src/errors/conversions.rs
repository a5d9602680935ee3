//! Conversions from external infrastructure errors into domain errors.

use reqwest::Error as HttpError;
use rollcall_domain::RollcallError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub RollcallError);

impl From<InfraError> for RollcallError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<RollcallError> for InfraError {
    fn from(value: RollcallError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoRollcallError {
    fn into_rollcall(self) -> RollcallError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → RollcallError */
/* -------------------------------------------------------------------------- */

impl IntoRollcallError for HttpError {
    fn into_rollcall(self) -> RollcallError {
        if self.is_timeout() {
            return RollcallError::Network("HTTP request timed out".into());
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return RollcallError::Network("HTTP connection failure".into());
        }

        if self.is_builder() {
            return RollcallError::Config(format!("invalid HTTP request: {self}"));
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => RollcallError::Auth(message),
                400..=499 => RollcallError::InvalidInput(message),
                _ => RollcallError::Network(message),
            };
        }

        RollcallError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_rollcall())
    }
}

/* -------------------------------------------------------------------------- */
/* Config parsing errors → RollcallError */
/* -------------------------------------------------------------------------- */

impl IntoRollcallError for url::ParseError {
    fn into_rollcall(self) -> RollcallError {
        RollcallError::Config(format!("invalid URL: {self}"))
    }
}

impl From<url::ParseError> for InfraError {
    fn from(value: url::ParseError) -> Self {
        InfraError(value.into_rollcall())
    }
}

impl IntoRollcallError for toml::de::Error {
    fn into_rollcall(self) -> RollcallError {
        RollcallError::Config(format!("Invalid TOML format: {self}"))
    }
}

impl From<toml::de::Error> for InfraError {
    fn from(value: toml::de::Error) -> Self {
        InfraError(value.into_rollcall())
    }
}

impl IntoRollcallError for serde_json::Error {
    fn into_rollcall(self) -> RollcallError {
        RollcallError::Config(format!("Invalid JSON format: {self}"))
    }
}

impl From<serde_json::Error> for InfraError {
    fn from(value: serde_json::Error) -> Self {
        InfraError(value.into_rollcall())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
