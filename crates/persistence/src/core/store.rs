//! Authoritative entity storage.

use async_trait::async_trait;

use crate::domain::Entity;
use crate::error::StorageResult;
use crate::query::Predicate;
use crate::types::{Page, Pageable};

/// CRUD against the relational store for one entity type.
///
/// The store is the source of truth: every existence and field-value question
/// is answered here, never by the [`SearchIndex`](super::SearchIndex).
///
/// # Example
///
/// ```ignore
/// use vetclinic_persistence::core::EntityStore;
/// use vetclinic_persistence::domain::Owner;
///
/// async fn example<S: EntityStore<Owner>>(store: &S) -> StorageResult<()> {
///     let saved = store.save(Owner::new("A")).await?;
///     let read = store.find_by_id(saved.id.unwrap()).await?;
///     assert!(read.is_some());
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait EntityStore<E: Entity>: Send + Sync {
    /// Returns a human-readable name for this storage backend.
    fn backend_name(&self) -> &'static str;

    /// Inserts the entity when it has no id, updates it otherwise.
    ///
    /// The write happens in its own transaction. Returns the entity as stored,
    /// with its id assigned.
    ///
    /// # Errors
    ///
    /// * `StorageError::Resource(NotFound)` - If the entity has an id that does not exist
    /// * `StorageError::Validation(ConstraintViolation)` - If a relation points at a missing row
    async fn save(&self, entity: E) -> StorageResult<E>;

    /// Reads an entity by id. A missing id is `Ok(None)`.
    async fn find_by_id(&self, id: i64) -> StorageResult<Option<E>>;

    /// Deletes an entity by id.
    ///
    /// # Errors
    ///
    /// * `StorageError::Resource(NotFound)` - If no entity has this id
    /// * `StorageError::Validation(ConstraintViolation)` - If other rows still reference it
    async fn delete_by_id(&self, id: i64) -> StorageResult<()>;

    /// Returns one page of all entities.
    async fn find_all(&self, pageable: &Pageable) -> StorageResult<Page<E>> {
        self.find_page_matching(&Predicate::match_all(E::TABLE), pageable)
            .await
    }

    /// Returns every entity matching the predicate, ordered by id.
    async fn find_all_matching(&self, predicate: &Predicate) -> StorageResult<Vec<E>>;

    /// Returns one page of the entities matching the predicate.
    ///
    /// Sort properties must be fields of the entity; ties are broken by id.
    async fn find_page_matching(
        &self,
        predicate: &Predicate,
        pageable: &Pageable,
    ) -> StorageResult<Page<E>>;

    /// Counts the entities matching the predicate.
    async fn count_matching(&self, predicate: &Predicate) -> StorageResult<u64>;
}
