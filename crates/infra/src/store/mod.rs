//! Storage boundary for the directory.
//!
//! Services depend on these traits only. Two adapters implement them:
//! [`InMemoryDirectory`] for tests and local runs, [`PostgresDirectory`] for
//! deployments.
//!
//! ## Listing contract
//!
//! `list_*` methods return at most `page.size()` rows in a fixed order and
//! apply the keyset predicate when `page.cursor()` is set:
//!
//! | Entity | Order | Predicate |
//! |---|---|---|
//! | Employee | `id DESC` | `id < cursor.id` |
//! | Card | `created_at DESC, id DESC` | `(created_at, id) < (cursor.t, cursor.id)` |
//!
//! Deciding whether a next page exists is the caller's job.

pub mod in_memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use cardhub_auth::Account;
use cardhub_cards::{Card, CardFilter, CardStatus};
use cardhub_core::{Cursor, CursorError, CursorKind, DomainError, EmployeeId, PageRequest};
use cardhub_employees::{Employee, EmployeeFilter};

pub use in_memory::InMemoryDirectory;
pub use postgres::PostgresDirectory;

/// Message returned when a conditional card write loses a race.
pub const CONCURRENT_CHANGE: &str =
    "Card status changed concurrently. Please reload the card and try again.";

/// Message returned when creating a card collides with a concurrent write.
/// No card exists yet, so the caller can simply resubmit.
pub const CREATE_CONFLICT: &str =
    "Card could not be created because of a concurrent change. Please try again.";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A conditional write found different state than expected, or the
    /// database aborted a serializable transaction.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The page cursor does not fit this listing.
    #[error("cursor does not match this listing")]
    InvalidCursor,

    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("storage error: {0}")]
    Backend(String),
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(_) => DomainError::failed_precondition(CONCURRENT_CHANGE),
            StoreError::InvalidCursor => CursorError::InvalidPageToken.into(),
            other => DomainError::internal(other.to_string()),
        }
    }
}

/// Keyset value of an employee cursor.
pub(crate) fn employee_key(cursor: &Cursor) -> Result<i64, StoreError> {
    if cursor.kind() != CursorKind::Employee {
        return Err(StoreError::InvalidCursor);
    }
    cursor.id().parse().map_err(|_| StoreError::InvalidCursor)
}

/// Keyset value of a card cursor.
pub(crate) fn card_key(cursor: &Cursor) -> Result<(DateTime<Utc>, &str), StoreError> {
    match cursor.kind() {
        CursorKind::Card => Ok((cursor.created_at(), cursor.id())),
        CursorKind::Employee => Err(StoreError::InvalidCursor),
    }
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_account(&self, username: &str) -> Result<Option<Account>, StoreError>;
}

#[async_trait]
pub trait EmployeeStore: Send + Sync {
    async fn get_employee(&self, id: EmployeeId) -> Result<Option<Employee>, StoreError>;

    async fn list_employees(
        &self,
        filter: &EmployeeFilter,
        page: &PageRequest,
    ) -> Result<Vec<Employee>, StoreError>;
}

#[async_trait]
pub trait CardStore: Send + Sync {
    /// First card matching `filter`. Scoped lookups put the caller's id in
    /// the filter, so "not yours" and "missing" both come back as `None`.
    async fn find_card(&self, filter: &CardFilter) -> Result<Option<Card>, StoreError>;

    async fn list_cards(
        &self,
        filter: &CardFilter,
        page: &PageRequest,
    ) -> Result<Vec<Card>, StoreError>;

    /// Insert `card` and copy its numbers onto the owning employee.
    /// Both writes commit together or not at all.
    async fn create_card(&self, card: &Card) -> Result<(), StoreError>;

    /// Overwrite `card` only if its stored status is still `expected`.
    ///
    /// With `write_back_contact`, the owner's phone/mobile are updated in the
    /// same transaction. Returns [`StoreError::Conflict`] when the status moved.
    async fn save_card(
        &self,
        card: &Card,
        expected: CardStatus,
        write_back_contact: bool,
    ) -> Result<(), StoreError>;
}
