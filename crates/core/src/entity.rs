//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Employees and cards are both entities; stores key their maps and their
/// keyset cursors on [`Entity::id`].
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug + core::fmt::Display;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;

    /// Creation instant, the primary recency key for listings.
    fn created_at(&self) -> chrono::DateTime<chrono::Utc>;
}
