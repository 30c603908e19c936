//! Business-card domain module.
//!
//! This crate contains the card lifecycle rules, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage).

pub mod card;
pub mod filter;
pub mod phone;
pub mod request;
pub mod status;
pub mod vcard;

pub use card::{Card, Transition};
pub use filter::CardFilter;
pub use phone::{E164Normalizer, PhoneError, PhoneNormalizer, PhoneNumber};
pub use request::{ApproveCard, CardContactRequest, PublishCard, RejectCard};
pub use status::CardStatus;
