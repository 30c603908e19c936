//! Application services.
//!
//! Each service method takes the caller's verified [`cardhub_auth::Claims`]
//! explicitly, checks the policy first, and only then touches a store.

pub mod auth;
pub mod cards;
pub mod employees;

use tracing::{error, warn};

use cardhub_core::DomainError;

use crate::store::StoreError;

pub use auth::AuthService;
pub use cards::CardService;
pub use employees::EmployeeService;

/// Log a storage failure at the level it deserves and convert it.
pub(crate) fn store_failure(operation: &'static str, err: StoreError) -> DomainError {
    match &err {
        StoreError::Conflict(detail) => warn!(operation, %detail, "conditional write lost a race"),
        StoreError::InvalidCursor => {}
        StoreError::Unavailable(_) | StoreError::Backend(_) => {
            error!(operation, error = %err, "storage failure")
        }
    }
    err.into()
}
