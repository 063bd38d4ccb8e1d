//! Composition root: one store and one index shared by every entity service.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::backends::sqlite::{
    SqliteBackend, SqliteBackendConfig, SqliteEntityStore, SqliteSearchIndex,
};
use crate::core::{EntityStore, SearchIndex};
use crate::error::StorageResult;
use crate::query::{
    AppointmentCriteria, Criteria, OwnerCriteria, PetCriteria, SlotCriteria, VetCriteria,
};
use crate::service::{EntityService, MirrorConfig, QueryService, ReindexReport};

/// Where the clinic keeps its data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicConfig {
    /// Relational store database file, `:memory:` for an in-memory store.
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    /// Search index database file, `:memory:` for an in-memory index.
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,

    /// Pool and pragma settings, applied to both databases.
    #[serde(default)]
    pub backend: SqliteBackendConfig,

    /// Mirror settings for every entity type.
    #[serde(default)]
    pub mirror: MirrorConfig,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("vetclinic.db")
}

fn default_index_path() -> PathBuf {
    PathBuf::from("vetclinic-index.db")
}

impl Default for ClinicConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            index_path: default_index_path(),
            backend: SqliteBackendConfig::default(),
            mirror: MirrorConfig::default(),
        }
    }
}

impl ClinicConfig {
    /// In-memory store and index.
    pub fn in_memory() -> Self {
        Self {
            store_path: PathBuf::from(":memory:"),
            index_path: PathBuf::from(":memory:"),
            ..Self::default()
        }
    }
}

/// The entity and query services of one entity type.
#[derive(Debug)]
pub struct EntityServices<C: Criteria> {
    /// Writes, lookups and free-text search.
    pub entities: EntityService<C::Entity>,
    /// Criteria queries against the store.
    pub queries: QueryService<C>,
}

impl<C: Criteria> EntityServices<C> {
    /// Builds both services over a shared store and index.
    pub fn new(
        store: Arc<dyn EntityStore<C::Entity>>,
        index: Arc<dyn SearchIndex<C::Entity>>,
        mirror: MirrorConfig,
    ) -> Self {
        Self {
            entities: EntityService::new(store.clone(), index, mirror),
            queries: QueryService::new(store),
        }
    }

    fn sqlite(
        store: &Arc<SqliteBackend>,
        index: &Arc<SqliteBackend>,
        mirror: &MirrorConfig,
    ) -> Self {
        Self::new(
            Arc::new(SqliteEntityStore::<C::Entity>::new(store.clone())),
            Arc::new(SqliteSearchIndex::<C::Entity>::new(index.clone())),
            mirror.clone(),
        )
    }
}

/// Every service of the clinic.
#[derive(Debug)]
pub struct Clinic {
    /// Pet owners.
    pub owners: EntityServices<OwnerCriteria>,
    /// Pets, optionally linked to an owner.
    pub pets: EntityServices<PetCriteria>,
    /// Veterinarians.
    pub vets: EntityServices<VetCriteria>,
    /// Bookable time slots.
    pub slots: EntityServices<SlotCriteria>,
    /// Appointments linking a pet, a vet and a slot.
    pub appointments: EntityServices<AppointmentCriteria>,
}

impl Clinic {
    /// Opens both databases, initializes their schemas and builds the services.
    pub fn open(config: &ClinicConfig) -> StorageResult<Self> {
        config.mirror.validate()?;

        let store = Arc::new(SqliteBackend::with_config(
            &config.store_path,
            config.backend.clone(),
        )?);
        store.init_schema()?;

        let index = Arc::new(SqliteBackend::with_config(
            &config.index_path,
            config.backend.clone(),
        )?);
        index.init_index_schema()?;

        info!(
            store = %config.store_path.display(),
            index = %config.index_path.display(),
            mirror = ?config.mirror.mode,
            "Clinic opened"
        );

        Ok(Self {
            owners: EntityServices::sqlite(&store, &index, &config.mirror),
            pets: EntityServices::sqlite(&store, &index, &config.mirror),
            vets: EntityServices::sqlite(&store, &index, &config.mirror),
            slots: EntityServices::sqlite(&store, &index, &config.mirror),
            appointments: EntityServices::sqlite(&store, &index, &config.mirror),
        })
    }

    /// An in-memory clinic with default settings.
    pub fn in_memory() -> StorageResult<Self> {
        Self::open(&ClinicConfig::in_memory())
    }

    /// Rebuilds the search index of every entity type.
    pub async fn reindex_all(&self) -> StorageResult<Vec<ReindexReport>> {
        Ok(vec![
            self.owners.entities.reindex().await?,
            self.pets.entities.reindex().await?,
            self.vets.entities.reindex().await?,
            self.slots.entities.reindex().await?,
            self.appointments.entities.reindex().await?,
        ])
    }
}
