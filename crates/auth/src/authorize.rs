use thiserror::Error;

use cardhub_core::{DomainError, EmployeeId};

use crate::Claims;

/// Message shared by every card-scoped denial, so that "not yours" and
/// "does not exist" look the same from outside.
pub const NOT_ALLOWED_CARD: &str = "You are not allowed to access this card or (it may not exist)";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("caller is not authenticated")]
    Anonymous,

    #[error("forbidden: HR role required")]
    NotHr,

    #[error("forbidden: {0}")]
    NotAllowed(&'static str),
}

impl From<AuthzError> for DomainError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::Anonymous => DomainError::unauthenticated("Authentication is required."),
            AuthzError::NotHr => {
                DomainError::permission_denied("You do not have permission to perform this action.")
            }
            AuthzError::NotAllowed(msg) => DomainError::permission_denied(msg),
        }
    }
}

/// Policy checks over a verified snapshot.
///
/// - No IO
/// - No panics
/// - Anonymous claims fail every check
impl Claims {
    pub fn require_authenticated(&self) -> Result<(), AuthzError> {
        if self.is_authenticated() {
            Ok(())
        } else {
            Err(AuthzError::Anonymous)
        }
    }

    /// Directory-wide reads and publishing.
    pub fn require_hr(&self) -> Result<(), AuthzError> {
        self.require_authenticated()?;
        if self.is_hr { Ok(()) } else { Err(AuthzError::NotHr) }
    }

    /// Own-card reads and edits.
    pub fn require_card_owner(&self, owner: EmployeeId) -> Result<(), AuthzError> {
        self.require_same_employee(owner)
    }

    /// Approve, reject and the approval queue.
    pub fn require_card_manager(&self, manager: EmployeeId) -> Result<(), AuthzError> {
        self.require_same_employee(manager)
    }

    fn require_same_employee(&self, expected: EmployeeId) -> Result<(), AuthzError> {
        self.require_authenticated()?;
        if expected.is_unset() || expected != self.id {
            return Err(AuthzError::NotAllowed(NOT_ALLOWED_CARD));
        }
        Ok(())
    }
}
