//! Command line configuration.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `VETCLINIC_DATABASE_URL` | vetclinic.db | Relational store database |
//! | `VETCLINIC_INDEX_URL` | vetclinic-index.db | Search index database |
//! | `VETCLINIC_LOG_LEVEL` | warn | Log level |
//! | `VETCLINIC_MIRROR_MODE` | synchronous | Mirror mode (synchronous, asynchronous) |
//! | `VETCLINIC_DEFAULT_PAGE_SIZE` | 20 | Page size when none is requested |
//! | `VETCLINIC_MAX_PAGE_SIZE` | 2000 | Largest accepted page size |

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use vetclinic_persistence::clinic::ClinicConfig;
use vetclinic_persistence::service::{MirrorConfig, MirrorMode};
use vetclinic_persistence::types::MAX_PAGE_SIZE;

/// Operator CLI over the clinic store and search index.
#[derive(Debug, Clone, Parser)]
#[command(name = "vetclinic")]
#[command(about = "Query and maintain the vetclinic store and search index")]
pub struct CliConfig {
    /// Relational store database, `:memory:` for a throwaway store.
    #[arg(long, env = "VETCLINIC_DATABASE_URL", default_value = "vetclinic.db")]
    pub database_url: String,

    /// Search index database, `:memory:` for a throwaway index.
    #[arg(long, env = "VETCLINIC_INDEX_URL", default_value = "vetclinic-index.db")]
    pub index_url: String,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "VETCLINIC_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    /// How writes are mirrored into the search index.
    #[arg(long, env = "VETCLINIC_MIRROR_MODE", default_value = "synchronous")]
    pub mirror_mode: MirrorMode,

    /// Page size used when a request does not name one.
    #[arg(long, env = "VETCLINIC_DEFAULT_PAGE_SIZE", default_value = "20")]
    pub default_page_size: u32,

    /// Largest page size a request may ask for.
    #[arg(long, env = "VETCLINIC_MAX_PAGE_SIZE", default_value = "2000")]
    pub max_page_size: u32,

    #[command(subcommand)]
    pub command: Command,
}

/// Entity types the CLI operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EntityKind {
    Owner,
    Pet,
    Vet,
    Slot,
    Appointment,
}

/// CLI subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Find a page of entities matching a criteria query string.
    Find {
        entity: EntityKind,
        /// Criteria query, e.g. `name.contains=Rex&page=0&size=10&sort=name,desc`.
        query: Option<String>,
    },

    /// Count the entities matching a criteria query string.
    Count {
        entity: EntityKind,
        query: Option<String>,
    },

    /// Print one entity by id.
    Get { entity: EntityKind, id: i64 },

    /// Create (no id) or update (id present) an entity given as JSON.
    Save { entity: EntityKind, json: String },

    /// Delete an entity by id.
    Delete { entity: EntityKind, id: i64 },

    /// Free-text search against the index.
    Search {
        entity: EntityKind,
        query: String,
        #[arg(long, default_value = "0")]
        page: u32,
        #[arg(long)]
        size: Option<u32>,
    },

    /// Rebuild the search index of every entity type from the store.
    Reindex,
}

impl CliConfig {
    /// Validates the configuration, returning every problem found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.database_url.is_empty() {
            errors.push("Database URL cannot be empty".to_string());
        }

        if self.index_url.is_empty() {
            errors.push("Index URL cannot be empty".to_string());
        }

        if self.default_page_size == 0 {
            errors.push("Default page size cannot be 0".to_string());
        }

        if self.max_page_size > MAX_PAGE_SIZE {
            errors.push(format!("Max page size cannot exceed {}", MAX_PAGE_SIZE));
        }

        if self.default_page_size > self.max_page_size {
            errors.push("Default page size cannot exceed max page size".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Library configuration for opening the clinic.
    pub fn clinic_config(&self) -> ClinicConfig {
        ClinicConfig {
            store_path: PathBuf::from(&self.database_url),
            index_path: PathBuf::from(&self.index_url),
            mirror: MirrorConfig {
                mode: self.mirror_mode,
                ..Default::default()
            },
            ..Default::default()
        }
    }
}
