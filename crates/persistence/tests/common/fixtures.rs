//! Fixtures: SQLite backends, service wiring and a seeded clinic schedule.

use std::sync::Arc;

use chrono::NaiveDate;

use vetclinic_persistence::backends::sqlite::{SqliteBackend, SqliteEntityStore};
use vetclinic_persistence::clinic::{Clinic, EntityServices};
use vetclinic_persistence::core::SearchIndex;
use vetclinic_persistence::domain::{Appointment, Owner, Pet, Slot, Vet};
use vetclinic_persistence::query::Criteria;
use vetclinic_persistence::service::MirrorConfig;

/// An in-memory store with the relational schema.
pub fn create_store_backend() -> Arc<SqliteBackend> {
    let backend = SqliteBackend::in_memory().expect("Failed to create SQLite backend");
    backend.init_schema().expect("Failed to initialize schema");
    Arc::new(backend)
}

/// An in-memory search index database.
pub fn create_index_backend() -> Arc<SqliteBackend> {
    let backend = SqliteBackend::in_memory().expect("Failed to create SQLite backend");
    backend
        .init_index_schema()
        .expect("Failed to initialize index schema");
    Arc::new(backend)
}

/// Services over a SQLite store and an arbitrary search index.
pub fn services_with_index<C: Criteria>(
    store: &Arc<SqliteBackend>,
    index: Arc<dyn SearchIndex<C::Entity>>,
    mirror: MirrorConfig,
) -> EntityServices<C> {
    EntityServices::new(
        Arc::new(SqliteEntityStore::<C::Entity>::new(store.clone())),
        index,
        mirror,
    )
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

/// Everything [`seed_schedule`] stored, with store-assigned ids.
#[derive(Debug)]
pub struct Schedule {
    pub owners: Vec<Owner>,
    pub pets: Vec<Pet>,
    pub vets: Vec<Vet>,
    pub slots: Vec<Slot>,
    pub appointments: Vec<Appointment>,
}

impl Schedule {
    pub fn owner_id(&self, i: usize) -> i64 {
        self.owners[i].id.expect("saved owner")
    }

    pub fn pet_id(&self, i: usize) -> i64 {
        self.pets[i].id.expect("saved pet")
    }

    pub fn vet_id(&self, i: usize) -> i64 {
        self.vets[i].id.expect("saved vet")
    }

    pub fn slot_id(&self, i: usize) -> i64 {
        self.slots[i].id.expect("saved slot")
    }
}

/// Seeds a small schedule.
///
/// | appointment | date | slot | vet | pet |
/// |---|---|---|---|---|
/// | 0 | 2024-03-01 | 0 | 0 | 0 Rex |
/// | 1 | 2024-03-02 | 0 | 1 | 1 Tom |
/// | 2 | 2024-03-05 | 1 | 0 | 2 Kiwi |
/// | 3 | 2024-03-10 | 2 | - | 0 Rex |
/// | 4 | 2024-04-01 | - | 1 | 3 Ghost |
///
/// Rex and Tom belong to Ann, Kiwi to Bob; Ghost has no owner and no type.
pub async fn seed_schedule(clinic: &Clinic) -> Schedule {
    let owners = vec![
        create(&clinic.owners, Owner::new("Ann").with_email("ann@example.com").with_phone("555-0100")).await,
        create(&clinic.owners, Owner::new("Bob").with_email("bob@example.com")).await,
    ];
    let ann = owners[0].id.expect("saved owner");
    let bob = owners[1].id.expect("saved owner");

    let pets = vec![
        create(&clinic.pets, Pet::new("Rex").with_kind("dog").with_breed("beagle").with_owner(ann)).await,
        create(&clinic.pets, Pet::new("Tom").with_kind("cat").with_owner(ann)).await,
        create(&clinic.pets, Pet::new("Kiwi").with_kind("bird").with_owner(bob)).await,
        create(&clinic.pets, Pet::new("Ghost")).await,
    ];

    let vets = vec![
        create(&clinic.vets, Vet::new("Dr Lee").with_address("1 Fjord Way", "Oslo", "Oslo")).await,
        create(&clinic.vets, Vet::new("Dr Diaz").with_address("2 Harbour St", "Bergen", "Vestland")).await,
    ];

    let slots = vec![
        create(&clinic.slots, Slot::new("09:00")).await,
        create(&clinic.slots, Slot::new("10:00")).await,
        create(&clinic.slots, Slot::new("11:00")).await,
    ];

    let id = |e: Option<i64>| e.expect("saved entity");
    let appointments = vec![
        create(
            &clinic.appointments,
            Appointment::new(date(2024, 3, 1))
                .with_slot(id(slots[0].id))
                .with_vet(id(vets[0].id))
                .with_pet(id(pets[0].id)),
        )
        .await,
        create(
            &clinic.appointments,
            Appointment::new(date(2024, 3, 2))
                .with_slot(id(slots[0].id))
                .with_vet(id(vets[1].id))
                .with_pet(id(pets[1].id)),
        )
        .await,
        create(
            &clinic.appointments,
            Appointment::new(date(2024, 3, 5))
                .with_slot(id(slots[1].id))
                .with_vet(id(vets[0].id))
                .with_pet(id(pets[2].id)),
        )
        .await,
        create(
            &clinic.appointments,
            Appointment::new(date(2024, 3, 10))
                .with_slot(id(slots[2].id))
                .with_pet(id(pets[0].id)),
        )
        .await,
        create(
            &clinic.appointments,
            Appointment::new(date(2024, 4, 1))
                .with_vet(id(vets[1].id))
                .with_pet(id(pets[3].id)),
        )
        .await,
    ];

    Schedule {
        owners,
        pets,
        vets,
        slots,
        appointments,
    }
}

async fn create<C: Criteria>(services: &EntityServices<C>, entity: C::Entity) -> C::Entity {
    services
        .entities
        .create(entity)
        .await
        .expect("Failed to create fixture entity")
}
