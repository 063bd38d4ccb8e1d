//! Search index test doubles.

use std::collections::{BTreeMap, BTreeSet};
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use vetclinic_persistence::core::{EntityStore, SearchIndex};
use vetclinic_persistence::domain::Entity;
use vetclinic_persistence::error::{BackendError, StorageError, StorageResult};
use vetclinic_persistence::types::{Page, PageInfo, Pageable};

/// A mirror operation observed by [`RecordingSearchIndex`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded {
    Save(i64),
    Delete(i64),
}

/// In-memory index that records every write it receives.
///
/// `search` ignores the query and returns every document, ordered by id.
pub struct RecordingSearchIndex<E: Entity> {
    documents: Mutex<BTreeMap<i64, E>>,
    log: Mutex<Vec<Recorded>>,
}

impl<E: Entity> Default for RecordingSearchIndex<E> {
    fn default() -> Self {
        Self {
            documents: Mutex::new(BTreeMap::new()),
            log: Mutex::new(Vec::new()),
        }
    }
}

impl<E: Entity> RecordingSearchIndex<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every write received so far, in order.
    pub fn recorded(&self) -> Vec<Recorded> {
        self.log.lock().clone()
    }

    pub fn saves(&self) -> Vec<i64> {
        self.recorded()
            .into_iter()
            .filter_map(|r| match r {
                Recorded::Save(id) => Some(id),
                Recorded::Delete(_) => None,
            })
            .collect()
    }

    pub fn deletes(&self) -> Vec<i64> {
        self.recorded()
            .into_iter()
            .filter_map(|r| match r {
                Recorded::Delete(id) => Some(id),
                Recorded::Save(_) => None,
            })
            .collect()
    }

    /// Ids of the documents currently held.
    pub fn ids(&self) -> Vec<i64> {
        self.documents.lock().keys().copied().collect()
    }
}

#[async_trait]
impl<E: Entity> SearchIndex<E> for RecordingSearchIndex<E> {
    fn backend_name(&self) -> &'static str {
        "recording"
    }

    async fn save(&self, entity: &E) -> StorageResult<()> {
        let id = entity.id().ok_or_else(|| StorageError::Backend(BackendError::Internal {
            backend_name: "recording".to_string(),
            message: "document without id".to_string(),
            source: None,
        }))?;
        self.log.lock().push(Recorded::Save(id));
        self.documents.lock().insert(id, entity.clone());
        Ok(())
    }

    async fn delete_by_id(&self, id: i64) -> StorageResult<()> {
        self.log.lock().push(Recorded::Delete(id));
        self.documents.lock().remove(&id);
        Ok(())
    }

    async fn delete_all(&self) -> StorageResult<u64> {
        let mut documents = self.documents.lock();
        let cleared = documents.len() as u64;
        documents.clear();
        Ok(cleared)
    }

    async fn search(&self, _query: &str) -> StorageResult<Vec<E>> {
        Ok(self.documents.lock().values().cloned().collect())
    }

    async fn search_page(&self, _query: &str, pageable: &Pageable) -> StorageResult<Page<E>> {
        let documents = self.documents.lock();
        let items = documents
            .values()
            .skip(pageable.offset() as usize)
            .take(pageable.size as usize)
            .cloned()
            .collect();
        Ok(Page::new(items, PageInfo::new(pageable, documents.len() as u64)))
    }
}

/// Index whose every call fails as unavailable, counting the attempts.
pub struct FailingSearchIndex<E> {
    attempts: Mutex<u64>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Default for FailingSearchIndex<E> {
    fn default() -> Self {
        Self {
            attempts: Mutex::new(0),
            _entity: PhantomData,
        }
    }
}

impl<E> FailingSearchIndex<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> u64 {
        *self.attempts.lock()
    }

    fn fail<T>(&self) -> StorageResult<T> {
        *self.attempts.lock() += 1;
        Err(StorageError::Backend(BackendError::Unavailable {
            backend_name: "failing".to_string(),
            message: "index is down".to_string(),
        }))
    }
}

#[async_trait]
impl<E: Entity> SearchIndex<E> for FailingSearchIndex<E> {
    fn backend_name(&self) -> &'static str {
        "failing"
    }

    async fn save(&self, _entity: &E) -> StorageResult<()> {
        self.fail()
    }

    async fn delete_by_id(&self, _id: i64) -> StorageResult<()> {
        self.fail()
    }

    async fn delete_all(&self) -> StorageResult<u64> {
        self.fail()
    }

    async fn search(&self, _query: &str) -> StorageResult<Vec<E>> {
        self.fail()
    }

    async fn search_page(&self, _query: &str, _pageable: &Pageable) -> StorageResult<Page<E>> {
        self.fail()
    }
}

/// Recording index that rejects `save` for a fixed set of ids.
pub struct SaveRejectingSearchIndex<E: Entity> {
    inner: RecordingSearchIndex<E>,
    rejected: BTreeSet<i64>,
}

impl<E: Entity> SaveRejectingSearchIndex<E> {
    pub fn rejecting(ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            inner: RecordingSearchIndex::new(),
            rejected: ids.into_iter().collect(),
        }
    }

    pub fn ids(&self) -> Vec<i64> {
        self.inner.ids()
    }
}

#[async_trait]
impl<E: Entity> SearchIndex<E> for SaveRejectingSearchIndex<E> {
    fn backend_name(&self) -> &'static str {
        "save-rejecting"
    }

    async fn save(&self, entity: &E) -> StorageResult<()> {
        if entity.id().is_some_and(|id| self.rejected.contains(&id)) {
            return Err(StorageError::Backend(BackendError::Internal {
                backend_name: "save-rejecting".to_string(),
                message: "document rejected".to_string(),
                source: None,
            }));
        }
        self.inner.save(entity).await
    }

    async fn delete_by_id(&self, id: i64) -> StorageResult<()> {
        self.inner.delete_by_id(id).await
    }

    async fn delete_all(&self) -> StorageResult<u64> {
        self.inner.delete_all().await
    }

    async fn search(&self, query: &str) -> StorageResult<Vec<E>> {
        self.inner.search(query).await
    }

    async fn search_page(&self, query: &str, pageable: &Pageable) -> StorageResult<Page<E>> {
        self.inner.search_page(query, pageable).await
    }
}

/// Recording index that, once armed, deletes `victim` from the store while
/// it is asked to save `trigger`. Stands in for a delete racing a reindex.
pub struct DeleteOnSaveSearchIndex<E: Entity> {
    inner: RecordingSearchIndex<E>,
    store: Arc<dyn EntityStore<E>>,
    trigger: i64,
    victim: i64,
    armed: AtomicBool,
}

impl<E: Entity> DeleteOnSaveSearchIndex<E> {
    pub fn new(store: Arc<dyn EntityStore<E>>, trigger: i64, victim: i64) -> Self {
        Self {
            inner: RecordingSearchIndex::new(),
            store,
            trigger,
            victim,
            armed: AtomicBool::new(false),
        }
    }

    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    pub fn ids(&self) -> Vec<i64> {
        self.inner.ids()
    }
}

#[async_trait]
impl<E: Entity> SearchIndex<E> for DeleteOnSaveSearchIndex<E> {
    fn backend_name(&self) -> &'static str {
        "delete-on-save"
    }

    async fn save(&self, entity: &E) -> StorageResult<()> {
        if entity.id() == Some(self.trigger) && self.armed.swap(false, Ordering::SeqCst) {
            self.store.delete_by_id(self.victim).await?;
        }
        self.inner.save(entity).await
    }

    async fn delete_by_id(&self, id: i64) -> StorageResult<()> {
        self.inner.delete_by_id(id).await
    }

    async fn delete_all(&self) -> StorageResult<u64> {
        self.inner.delete_all().await
    }

    async fn search(&self, query: &str) -> StorageResult<Vec<E>> {
        self.inner.search(query).await
    }

    async fn search_page(&self, query: &str, pageable: &Pageable) -> StorageResult<Page<E>> {
        self.inner.search_page(query, pageable).await
    }
}
