//! Criteria queries against the store.

use std::marker::PhantomData;
use std::sync::Arc;

use tracing::debug;

use crate::core::EntityStore;
use crate::domain::Entity;
use crate::error::StorageResult;
use crate::query::{Criteria, build_predicate};
use crate::types::{Page, Pageable};

/// Answers find and count requests for one criteria type.
///
/// All three operations translate the criteria the same way, so a count
/// always equals the number of items reachable by paging.
pub struct QueryService<C: Criteria> {
    store: Arc<dyn EntityStore<C::Entity>>,
    _criteria: PhantomData<fn() -> C>,
}

impl<C: Criteria> std::fmt::Debug for QueryService<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryService")
            .field("entity", &C::Entity::NAME)
            .field("store", &self.store.backend_name())
            .finish()
    }
}

impl<C: Criteria> QueryService<C> {
    /// Creates a query service over a store.
    pub fn new(store: Arc<dyn EntityStore<C::Entity>>) -> Self {
        Self {
            store,
            _criteria: PhantomData,
        }
    }

    /// Returns every entity matching the criteria.
    pub async fn find_by_criteria(&self, criteria: &C) -> StorageResult<Vec<C::Entity>> {
        debug!(entity = C::Entity::NAME, ?criteria, "find by criteria");
        let predicate = build_predicate(criteria);
        self.store.find_all_matching(&predicate).await
    }

    /// Returns one page of the entities matching the criteria.
    pub async fn find_page_by_criteria(
        &self,
        criteria: &C,
        pageable: &Pageable,
    ) -> StorageResult<Page<C::Entity>> {
        debug!(
            entity = C::Entity::NAME,
            ?criteria,
            page = pageable.page,
            size = pageable.size,
            "find by criteria"
        );
        pageable.validate()?;
        let predicate = build_predicate(criteria);
        self.store.find_page_matching(&predicate, pageable).await
    }

    /// Counts the entities matching the criteria.
    pub async fn count_by_criteria(&self, criteria: &C) -> StorageResult<u64> {
        debug!(entity = C::Entity::NAME, ?criteria, "count by criteria");
        let predicate = build_predicate(criteria);
        self.store.count_matching(&predicate).await
    }
}
