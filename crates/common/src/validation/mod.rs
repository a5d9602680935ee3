//! Field validation for user-supplied input
//!
//! Validators report the first failing rule as a human-readable message;
//! [`ValidationError`] attaches the field name so the UI can render it next
//! to the offending input.

mod validators;

use thiserror::Error;
pub use validators::{EmailValidator, FieldValidator, StringValidator};

/// Type alias for validation results
pub type ValidationResult<T> = Result<T, ValidationError>;

/// A field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into() }
    }
}

/// Run `validator` against `value`, tagging failures with `field`.
///
/// # Errors
/// Returns the validator's message wrapped in a [`ValidationError`].
pub fn check<T: ?Sized, V>(field: &str, value: &T, validator: &V) -> ValidationResult<()>
where
    V: FieldValidator<T> + ?Sized,
{
    validator.validate(value).map_err(|message| ValidationError::new(field, message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_tags_field_name() {
        let err = check("email", &"nope".to_string(), &EmailValidator::new()).unwrap_err();

        assert_eq!(err.field, "email");
        assert_eq!(err.to_string(), "email: Please enter a valid email address");
    }
}
