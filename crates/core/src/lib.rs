//! `cardhub-core`: shared building blocks for the card directory.
//!
//! Pure primitives only: identifiers, the error taxonomy, the clock seam and
//! keyset pagination. No I/O.

pub mod clock;
pub mod entity;
pub mod error;
pub mod id;
pub mod pager;

pub use clock::{Clock, FixedClock, SystemClock};
pub use entity::Entity;
pub use error::{DomainError, DomainResult, FieldViolation};
pub use id::{CardId, EmployeeId};
pub use pager::{Cursor, CursorCodec, CursorError, CursorKind, Page, PageRequest};
