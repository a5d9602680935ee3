//! Login and signup input
//!
//! Validation runs before any network call; a failure here never reaches
//! the backend.

use std::fmt;

use serde::Serialize;

use crate::validation::{check, EmailValidator, StringValidator, ValidationError};

/// Email/password pair sent to `auth/login` and `auth/register`
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    /// Build credentials, trimming surrounding whitespace from the email.
    pub fn new(email: impl AsRef<str>, password: impl Into<String>) -> Self {
        Self { email: email.as_ref().trim().to_string(), password: password.into() }
    }

    /// Login rules: email present and well-formed, password present.
    ///
    /// # Errors
    /// The first failing field
    pub fn validate(&self) -> Result<(), ValidationError> {
        check("email", self.email.as_str(), &EmailValidator::new())?;
        check("password", self.password.as_str(), &password_required())?;
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[redacted]")
            .finish()
    }
}

/// Registration form as entered by the user
#[derive(Clone)]
pub struct SignupForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl SignupForm {
    pub fn new(
        email: impl AsRef<str>,
        password: impl Into<String>,
        confirm_password: impl Into<String>,
    ) -> Self {
        Self {
            email: email.as_ref().trim().to_string(),
            password: password.into(),
            confirm_password: confirm_password.into(),
        }
    }

    /// Validate the form and produce the credentials to register.
    ///
    /// # Errors
    /// The first failing field: missing or malformed email, missing or short
    /// password, or a confirmation that does not match
    pub fn validate(&self, min_password_length: usize) -> Result<Credentials, ValidationError> {
        check("email", self.email.as_str(), &EmailValidator::new())?;
        check(
            "password",
            self.password.as_str(),
            &password_required().min_length(min_password_length),
        )?;

        if self.password != self.confirm_password {
            return Err(ValidationError::new("confirm_password", "Passwords do not match"));
        }

        Ok(Credentials { email: self.email.clone(), password: self.password.clone() })
    }
}

impl fmt::Debug for SignupForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignupForm").field("email", &self.email).finish_non_exhaustive()
    }
}

fn password_required() -> StringValidator {
    StringValidator::new().label("Password").not_empty()
}
