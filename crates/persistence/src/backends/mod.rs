//! Database backend implementations.
//!
//! Each backend implements [`EntityStore`](crate::core::EntityStore) and
//! [`SearchIndex`](crate::core::SearchIndex) and is gated behind a feature flag.
//!
//! | Backend | Feature | Description |
//! |---------|---------|-------------|
//! | SQLite | `sqlite` | Embedded relational store plus an FTS5 search index |
//!
//! # Example
//!
//! ```no_run
//! # #[cfg(feature = "sqlite")]
//! use vetclinic_persistence::backends::sqlite::SqliteBackend;
//!
//! # #[cfg(feature = "sqlite")]
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // In-memory store, as used by the tests
//! let store = SqliteBackend::in_memory()?;
//! store.init_schema()?;
//!
//! // File-backed search index
//! let index = SqliteBackend::open("./data/vetclinic-index.db")?;
//! index.init_index_schema()?;
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "sqlite")]
pub mod sqlite;
