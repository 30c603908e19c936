//! Login accounts and inbound credentials.

use cardhub_core::{DomainError, FieldViolation};
use cardhub_employees::Employee;

/// A login record joined to the employee it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub username: String,
    pub employee: Employee,
    /// Opaque one-way hash, checked through a [`crate::PasswordComparator`].
    pub password_hash: String,
    pub is_hr: bool,
}

/// Validated login credentials.
///
/// `username` is trimmed; `password` keeps caller whitespace but must not be
/// empty.
#[derive(Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    username: String,
    password: String,
}

impl core::fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl LoginCredentials {
    pub fn try_from_parts(username: &str, password: &str) -> Result<Self, DomainError> {
        let username = username.trim();
        let mut violations = Vec::new();
        if username.is_empty() {
            violations.push(FieldViolation::new("username", "username must not be empty"));
        }
        if password.is_empty() {
            violations.push(FieldViolation::new("password", "password must not be empty"));
        }
        if !violations.is_empty() {
            return Err(DomainError::invalid_argument(
                "Login request is invalid.",
                violations,
            ));
        }
        Ok(Self {
            username: username.to_owned(),
            password: password.to_owned(),
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_username_and_keeps_password() {
        let creds = LoginCredentials::try_from_parts("  E042 ", " pw ").unwrap();
        assert_eq!(creds.username(), "E042");
        assert_eq!(creds.password(), " pw ");
    }

    #[test]
    fn reports_every_missing_field() {
        let err = LoginCredentials::try_from_parts("   ", "").unwrap_err();
        let fields: Vec<_> = err.violations().iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, ["username", "password"]);
    }

    #[test]
    fn debug_output_hides_password() {
        let creds = LoginCredentials::try_from_parts("E042", "hunter2").unwrap();
        assert!(!format!("{creds:?}").contains("hunter2"));
    }
}
