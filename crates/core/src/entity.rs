//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Products and cart line items are both keyed by [`crate::ProductId`]; the cart
/// relies on this to deduplicate by identity rather than by value.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;

    /// Whether `other` refers to the same entity (ignores every other field).
    fn same_entity<E>(&self, other: &E) -> bool
    where
        E: Entity<Id = Self::Id>,
    {
        self.id() == other.id()
    }
}
