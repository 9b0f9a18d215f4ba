//! Entity trait: identity + continuity across state changes.

use crate::error::{DomainError, DomainResult};

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug + core::fmt::Display;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;
}

/// Find the first entity in `items` carrying `id`.
///
/// Lists come straight from the server, so a missing id means the caller is
/// holding a stale row id.
pub fn find_by_id<E: Entity>(items: &[E], id: E::Id) -> DomainResult<&E> {
    items
        .iter()
        .find(|item| item.id() == id)
        .ok_or_else(|| DomainError::NotFound(id.to_string()))
}
