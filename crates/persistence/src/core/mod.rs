//! Core storage traits.
//!
//! - [`EntityStore`] - Authoritative CRUD and predicate queries for one entity type
//! - [`SearchIndex`] - Best-effort free-text mirror of one entity type
//!
//! Both traits are generic over the [`Entity`](crate::domain::Entity) so one
//! backend implementation serves all entity types.

mod index;
mod store;

pub use index::SearchIndex;
pub use store::EntityStore;
