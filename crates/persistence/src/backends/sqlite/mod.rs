//! SQLite backend implementation.
//!
//! Provides the relational [`EntityStore`](crate::core::EntityStore) and the
//! FTS5 [`SearchIndex`](crate::core::SearchIndex). Both support in-memory
//! databases (for tests) and file databases.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use vetclinic_persistence::backends::sqlite::{SqliteBackend, SqliteEntityStore};
//! use vetclinic_persistence::domain::Owner;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = SqliteBackend::in_memory()?;
//! backend.init_schema()?;
//!
//! let owners = SqliteEntityStore::<Owner>::new(Arc::new(backend));
//! # Ok(())
//! # }
//! ```
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE owner (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT, email TEXT, phone TEXT);
//! CREATE TABLE pet (id ..., name TEXT, type TEXT, breed TEXT, owner_id INTEGER REFERENCES owner(id));
//! CREATE TABLE vet (id ..., name TEXT, address TEXT, city TEXT, state_province TEXT, phone TEXT);
//! CREATE TABLE slot (id ..., start_time TEXT NOT NULL);
//! CREATE TABLE appointment (id ..., appt_time TEXT NOT NULL,
//!     slot_id INTEGER REFERENCES slot(id),
//!     vet_id INTEGER REFERENCES vet(id),
//!     pet_id INTEGER REFERENCES pet(id));
//!
//! -- Search documents (usually a separate database)
//! CREATE VIRTUAL TABLE search_documents USING fts5(
//!     entity_type UNINDEXED, entity_id UNINDEXED, document UNINDEXED, content,
//!     tokenize='porter unicode61');
//! ```

mod backend;
mod index;
mod schema;
mod store;

pub use backend::{SqliteBackend, SqliteBackendConfig};
pub use index::{SqliteSearchIndex, build_match_query, extract_all_strings};
pub use schema::{INDEX_SCHEMA_VERSION, SCHEMA_VERSION};
pub use store::SqliteEntityStore;
