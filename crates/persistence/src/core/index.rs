//! Secondary search index.

use async_trait::async_trait;

use crate::domain::Entity;
use crate::error::StorageResult;
use crate::types::{Page, Pageable};

/// A free-text searchable mirror of one entity type, keyed by entity id.
///
/// The index is written after the store and may lag behind it or miss
/// documents entirely when a mirror write failed. It is never consulted for
/// existence or field values.
#[async_trait]
pub trait SearchIndex<E: Entity>: Send + Sync {
    /// Returns a human-readable name for this index backend.
    fn backend_name(&self) -> &'static str;

    /// Indexes the entity, replacing any document with the same id.
    async fn save(&self, entity: &E) -> StorageResult<()>;

    /// Removes the document with this id. A missing document is not an error.
    async fn delete_by_id(&self, id: i64) -> StorageResult<()>;

    /// Removes every document of this entity type.
    async fn delete_all(&self) -> StorageResult<u64>;

    /// Returns every document matching the free-text query.
    async fn search(&self, query: &str) -> StorageResult<Vec<E>>;

    /// Returns one page of the documents matching the free-text query.
    async fn search_page(&self, query: &str, pageable: &Pageable) -> StorageResult<Page<E>>;
}
