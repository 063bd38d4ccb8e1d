//! SQLite backend integration tests.
//!
//! Covers file-backed databases, schema reuse across reopen, the FTS index
//! and the store's constraint handling.

mod common;

use std::sync::Arc;

use common::*;
use vetclinic_persistence::backends::sqlite::{
    SqliteBackend, SqliteEntityStore, SqliteSearchIndex,
};
use vetclinic_persistence::clinic::{Clinic, ClinicConfig};
use vetclinic_persistence::core::{EntityStore, SearchIndex};
use vetclinic_persistence::domain::{Owner, Pet, Vet};
use vetclinic_persistence::error::{StorageError, ValidationError};
use vetclinic_persistence::query::{OwnerCriteria, StringFilter};
use vetclinic_persistence::types::{Pageable, SortOrder};

fn file_config(dir: &tempfile::TempDir) -> ClinicConfig {
    ClinicConfig {
        store_path: dir.path().join("store.db"),
        index_path: dir.path().join("index.db"),
        ..ClinicConfig::default()
    }
}

// ============================================================================
// File databases
// ============================================================================

#[tokio::test]
async fn test_file_backed_clinic_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = file_config(&dir);

    {
        let clinic = Clinic::open(&config).unwrap();
        seed_schedule(&clinic).await;
    }

    let clinic = Clinic::open(&config).unwrap();
    let criteria = OwnerCriteria {
        email: Some(StringFilter::new().contains("@example.com")),
        ..Default::default()
    };
    assert_eq!(clinic.owners.queries.count_by_criteria(&criteria).await.unwrap(), 2);

    let hits = clinic
        .vets
        .entities
        .search("bergen", &Pageable::default())
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits.items[0].name.as_deref(), Some("Dr Diaz"));
}

#[tokio::test]
async fn test_store_and_index_share_one_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clinic.db");
    let config = ClinicConfig {
        store_path: path.clone(),
        index_path: path,
        ..ClinicConfig::default()
    };

    let clinic = Clinic::open(&config).unwrap();
    let owner = clinic.owners.entities.create(Owner::new("Ann")).await.unwrap();
    let hits = clinic.owners.entities.search("ann", &Pageable::default()).await.unwrap();
    assert_eq!(hits.items, vec![owner]);
}

#[test]
fn test_health_check() {
    let dir = tempfile::tempdir().unwrap();
    let backend = SqliteBackend::open(dir.path().join("health.db")).unwrap();
    assert!(!backend.is_memory());
    assert!(backend.health_check().is_ok());
}

// ============================================================================
// Store
// ============================================================================

#[tokio::test]
async fn test_update_missing_row_is_not_found() {
    let store = SqliteEntityStore::<Owner>::new(create_store_backend());

    let mut ghost = Owner::new("Ghost");
    ghost.id = Some(7);
    let err = store.save(ghost).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_delete_owner_with_pets_is_rejected() {
    let backend = create_store_backend();
    let owners = SqliteEntityStore::<Owner>::new(backend.clone());
    let pets = SqliteEntityStore::<Pet>::new(backend);

    let owner = owners.save(Owner::new("Ann")).await.unwrap();
    pets.save(Pet::new("Rex").with_owner(owner.id.unwrap()))
        .await
        .unwrap();

    let err = owners.delete_by_id(owner.id.unwrap()).await.unwrap_err();
    assert!(matches!(
        err,
        StorageError::Validation(ValidationError::ConstraintViolation { .. })
    ));
    assert!(owners.find_by_id(owner.id.unwrap()).await.unwrap().is_some());
}

#[tokio::test]
async fn test_find_all_breaks_ties_by_id() {
    let store = SqliteEntityStore::<Vet>::new(create_store_backend());
    for _ in 0..5 {
        store.save(Vet::new("Same")).await.unwrap();
    }

    let mut pageable = Pageable::new(0, 2).with_sort(SortOrder::asc("name"));
    let mut seen = Vec::new();
    loop {
        let page = store.find_all(&pageable).await.unwrap();
        seen.extend(page.items.iter().filter_map(|v| v.id));
        if !page.page_info.has_next {
            break;
        }
        pageable = pageable.next();
    }
    assert_eq!(seen, vec![1, 2, 3, 4, 5]);
}

// ============================================================================
// Search index
// ============================================================================

#[tokio::test]
async fn test_index_is_scoped_per_entity_type() {
    let backend = create_index_backend();
    let owners = SqliteSearchIndex::<Owner>::new(backend.clone());
    let vets = SqliteSearchIndex::<Vet>::new(backend);

    let mut owner = Owner::new("Lee");
    owner.id = Some(1);
    let mut vet = Vet::new("Dr Lee");
    vet.id = Some(1);

    owners.save(&owner).await.unwrap();
    vets.save(&vet).await.unwrap();

    assert_eq!(owners.search("lee").await.unwrap(), vec![owner]);
    assert_eq!(vets.search("lee").await.unwrap(), vec![vet.clone()]);

    assert_eq!(owners.delete_all().await.unwrap(), 1);
    assert!(owners.search("").await.unwrap().is_empty());
    assert_eq!(vets.search("").await.unwrap(), vec![vet]);
}

#[tokio::test]
async fn test_index_save_replaces_document() {
    let index = SqliteSearchIndex::<Owner>::new(create_index_backend());

    let mut owner = Owner::new("Ann");
    owner.id = Some(1);
    index.save(&owner).await.unwrap();

    owner.name = Some("Bob".to_string());
    index.save(&owner).await.unwrap();

    assert!(index.search("ann").await.unwrap().is_empty());
    let hits = index.search("bob").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name.as_deref(), Some("Bob"));

    // deleting a missing document is fine
    index.delete_by_id(2).await.unwrap();
    index.delete_by_id(1).await.unwrap();
    assert!(index.search("").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_search_pages_with_sort() {
    let index: Arc<dyn SearchIndex<Owner>> =
        Arc::new(SqliteSearchIndex::<Owner>::new(create_index_backend()));
    for (id, name) in [(1, "Carol Smith"), (2, "Alan Smith"), (3, "Bea Smith")] {
        let mut owner = Owner::new(name);
        owner.id = Some(id);
        index.save(&owner).await.unwrap();
    }

    let page = index
        .search_page("smith", &Pageable::new(0, 2).with_sort(SortOrder::asc("name")))
        .await
        .unwrap();
    assert_eq!(page.total(), 3);
    let names: Vec<_> = page.items.iter().filter_map(|o| o.name.clone()).collect();
    assert_eq!(names, vec!["Alan Smith".to_string(), "Bea Smith".to_string()]);
}
