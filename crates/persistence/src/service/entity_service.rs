//! Store and index orchestration for one entity type.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::core::{EntityStore, SearchIndex};
use crate::domain::Entity;
use crate::error::{StorageResult, ValidationError};
use crate::types::{Page, Pageable, SortOrder};

use super::mirror::{MirrorConfig, MirrorEvent, MirrorStatus, MirrorWriter};

/// Page size used when re-reading the store during a reindex.
const REINDEX_BATCH_SIZE: u32 = 500;

/// Outcome of rebuilding the index for one entity type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReindexReport {
    /// Entity name.
    pub entity: String,

    /// Documents removed before rebuilding.
    pub cleared: u64,

    /// Entities written to the index.
    pub indexed: u64,

    /// Entities the index rejected.
    pub failed: u64,
}

impl ReindexReport {
    /// Returns true if any entity could not be indexed.
    pub fn has_errors(&self) -> bool {
        self.failed > 0
    }
}

/// CRUD and free-text search for one entity type.
///
/// Every mutation is written to the [`EntityStore`] first. Only when that
/// succeeds is it mirrored to the [`SearchIndex`]; a mirror failure is logged
/// and counted but does not fail the call and does not undo the store write.
pub struct EntityService<E: Entity> {
    store: Arc<dyn EntityStore<E>>,
    index: Arc<dyn SearchIndex<E>>,
    mirror: MirrorWriter<E>,
}

impl<E: Entity> std::fmt::Debug for EntityService<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityService")
            .field("entity", &E::NAME)
            .field("store", &self.store.backend_name())
            .field("mirror", &self.mirror)
            .finish()
    }
}

impl<E: Entity> EntityService<E> {
    /// Creates a service over a store and its index.
    pub fn new(
        store: Arc<dyn EntityStore<E>>,
        index: Arc<dyn SearchIndex<E>>,
        config: MirrorConfig,
    ) -> Self {
        let mirror = MirrorWriter::new(index.clone(), config);
        Self {
            store,
            index,
            mirror,
        }
    }

    /// Saves an entity, inserting or updating depending on its id.
    pub async fn save(&self, entity: E) -> StorageResult<E> {
        debug!(entity = E::NAME, id = ?entity.id(), "Request to save entity");

        let saved = self.store.save(entity).await?;
        self.mirror.mirror(MirrorEvent::Save(saved.clone())).await;
        Ok(saved)
    }

    /// Saves a new entity. Fails if it already has an id.
    pub async fn create(&self, entity: E) -> StorageResult<E> {
        if entity.id().is_some() {
            return Err(ValidationError::IdExists {
                entity: E::NAME.to_string(),
            }
            .into());
        }
        self.save(entity).await
    }

    /// Saves an existing entity. Fails if it has no id.
    pub async fn update(&self, entity: E) -> StorageResult<E> {
        if entity.id().is_none() {
            return Err(ValidationError::IdNull {
                entity: E::NAME.to_string(),
            }
            .into());
        }
        self.save(entity).await
    }

    /// Returns one page of all entities.
    pub async fn find_all(&self, pageable: &Pageable) -> StorageResult<Page<E>> {
        debug!(entity = E::NAME, page = pageable.page, size = pageable.size, "Request to get all entities");
        pageable.validate()?;
        self.store.find_all(pageable).await
    }

    /// Returns the entity with this id, if stored.
    pub async fn find_one(&self, id: i64) -> StorageResult<Option<E>> {
        debug!(entity = E::NAME, id, "Request to get entity");
        self.store.find_by_id(id).await
    }

    /// Deletes an entity and then its index document.
    pub async fn delete(&self, id: i64) -> StorageResult<()> {
        debug!(entity = E::NAME, id, "Request to delete entity");

        self.store.delete_by_id(id).await?;
        self.mirror.mirror(MirrorEvent::Delete(id)).await;
        Ok(())
    }

    /// Free-text search against the index. Results may lag the store.
    pub async fn search(&self, query: &str, pageable: &Pageable) -> StorageResult<Page<E>> {
        debug!(entity = E::NAME, query, "Request to search for a page of entities");
        pageable.validate()?;
        self.index.search_page(query, pageable).await
    }

    /// Rebuilds this entity's index from the store.
    ///
    /// Clears the documents first, then writes every stored entity page by
    /// page. Index failures for single entities are counted, not returned.
    ///
    /// Each entity is re-read from the store right before it is indexed, so
    /// one deleted after its page was read is skipped. A delete landing
    /// between that re-read and the index write can still leave a stale
    /// document behind until the next reindex.
    pub async fn reindex(&self) -> StorageResult<ReindexReport> {
        let mut report = ReindexReport {
            entity: E::NAME.to_string(),
            ..Default::default()
        };

        if !self.mirror.wait_for_idle(Duration::from_secs(30)).await {
            warn!(entity = E::NAME, "Reindexing with mirror events still pending");
        }

        report.cleared = self.index.delete_all().await?;

        let mut pageable = Pageable::first(REINDEX_BATCH_SIZE).with_sort(SortOrder::asc("id"));
        loop {
            let page = self.store.find_all(&pageable).await?;
            for entity in &page.items {
                let Some(id) = entity.id() else { continue };
                let Some(current) = self.store.find_by_id(id).await? else {
                    debug!(entity = E::NAME, id, "Deleted during reindex, skipping");
                    continue;
                };
                match self.index.save(&current).await {
                    Ok(()) => report.indexed += 1,
                    Err(e) => {
                        report.failed += 1;
                        warn!(entity = E::NAME, id, error = %e, "Failed to reindex entity");
                    }
                }
            }
            if !page.page_info.has_next {
                break;
            }
            pageable = pageable.next();
        }

        info!(
            entity = E::NAME,
            cleared = report.cleared,
            indexed = report.indexed,
            failed = report.failed,
            "Reindex complete"
        );

        Ok(report)
    }

    /// Mirror counters for this entity type.
    pub fn mirror_status(&self) -> MirrorStatus {
        self.mirror.status()
    }

    /// Waits until queued mirror events have been applied.
    pub async fn wait_for_mirror(&self, timeout: Duration) -> bool {
        self.mirror.wait_for_idle(timeout).await
    }
}
