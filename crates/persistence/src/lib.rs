//! Vetclinic Persistence Layer
//!
//! This crate provides the persistence layer of the vetclinic scheduling
//! backend: owners, pets, vets, time slots and appointments. It has two
//! halves that share one entity model.
//!
//! - **Criteria queries**: a per-entity criteria of typed field filters is
//!   translated into one composed predicate over the entity table, joining
//!   many-to-one relations where a relation id is filtered. Find, page and
//!   count use the same translation.
//! - **Dual writes**: every save and delete goes to the authoritative
//!   relational store first and is then mirrored into a free-text search
//!   index. The index is best effort; a mirror failure never fails the write.
//!
//! # Backend Features
//!
//! - `sqlite` (default) - SQLite store and FTS5 search index, in-memory or file
//!
//! # Architecture
//!
//! - [`domain`] - Entities and their static column bindings
//! - [`query`] - Field filters, criteria and the predicate builder
//! - [`core`] - Store and search index traits
//! - [`service`] - Entity and query services, the mirror writer
//! - [`types`] - Page requests and pages
//! - [`error`] - Error types for all operations
//! - [`backends`] - Backend implementations
//!
//! # Quick Start
//!
//! ```no_run
//! # #[cfg(feature = "sqlite")]
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use vetclinic_persistence::clinic::Clinic;
//! use vetclinic_persistence::domain::{Owner, Pet};
//! use vetclinic_persistence::query::{parse_query, PetCriteria};
//!
//! let clinic = Clinic::in_memory()?;
//!
//! let owner = clinic.owners.entities.create(Owner::new("Ann")).await?;
//! clinic
//!     .pets
//!     .entities
//!     .create(Pet::new("Rex").with_owner(owner.id.unwrap_or_default()))
//!     .await?;
//!
//! let request = parse_query::<PetCriteria>("name.contains=Re&page=0&size=10")?;
//! let page = clinic
//!     .pets
//!     .queries
//!     .find_page_by_criteria(&request.criteria, &request.pageable)
//!     .await?;
//! assert_eq!(page.total(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! # Criteria
//!
//! ```
//! use vetclinic_persistence::query::{build_predicate, AppointmentCriteria, LongFilter};
//!
//! // Appointments of slot 7 that are not with vet 3
//! let criteria = AppointmentCriteria {
//!     slot_id: Some(LongFilter::new().equals(7)),
//!     vet_id: Some(LongFilter::new().not_equals(3)),
//!     ..Default::default()
//! };
//!
//! let predicate = build_predicate(&criteria);
//! assert_eq!(predicate.constraints().len(), 2);
//! assert_eq!(predicate.joins().len(), 2);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod backends;
#[cfg(feature = "sqlite")]
pub mod clinic;
pub mod core;
pub mod domain;
pub mod error;
pub mod query;
pub mod service;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{StorageError, StorageResult};
pub use types::{Page, Pageable, SortOrder};

// Re-export core traits
pub use core::{EntityStore, SearchIndex};
pub use domain::Entity;
pub use query::Criteria;

// Re-export services
pub use service::{EntityService, MirrorConfig, MirrorMode, QueryService};

#[cfg(feature = "sqlite")]
pub use clinic::{Clinic, ClinicConfig};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
