//! Services over the store and the search index.
//!
//! - [`EntityService`] - Save, find, delete and search with store-first mirroring
//! - [`QueryService`] - Find and count by criteria
//! - [`mirror`] - The mirror writer and its configuration

mod entity_service;
pub mod mirror;
mod query_service;

pub use entity_service::{EntityService, ReindexReport};
pub use mirror::{MirrorConfig, MirrorEvent, MirrorMode, MirrorStatus, MirrorWriter, RetryConfig};
pub use query_service::QueryService;
