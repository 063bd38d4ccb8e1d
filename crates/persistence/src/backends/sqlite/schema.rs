//! SQLite schema definitions and migrations.
//!
//! The store tables and the search documents are versioned separately so
//! they can live in one database or in two.

use rusqlite::Connection;

use crate::error::{BackendError, StorageError, StorageResult};

/// Current version of the relational schema.
pub const SCHEMA_VERSION: i32 = 1;

/// Current version of the search document schema.
pub const INDEX_SCHEMA_VERSION: i32 = 1;

const STORE_COMPONENT: &str = "store";
const INDEX_COMPONENT: &str = "index";

/// Name of the FTS5 table holding search documents.
pub const DOCUMENTS_TABLE: &str = "search_documents";

fn migration_error(what: &str, e: rusqlite::Error) -> StorageError {
    StorageError::Backend(BackendError::MigrationError {
        message: format!("{}: {}", what, e),
    })
}

/// Initialize the relational schema.
pub fn initialize_schema(conn: &Connection) -> StorageResult<()> {
    let current_version = get_schema_version(conn, STORE_COMPONENT)?;

    if current_version == 0 {
        create_schema_v1(conn)?;
        set_schema_version(conn, STORE_COMPONENT, SCHEMA_VERSION)?;
    }

    Ok(())
}

/// Initialize the search document schema.
pub fn initialize_index_schema(conn: &Connection) -> StorageResult<()> {
    let current_version = get_schema_version(conn, INDEX_COMPONENT)?;

    if current_version == 0 {
        create_index_schema_v1(conn)?;
        set_schema_version(conn, INDEX_COMPONENT, INDEX_SCHEMA_VERSION)?;
    }

    Ok(())
}

/// Get the schema version of a component, 0 if never initialized.
pub(crate) fn get_schema_version(conn: &Connection, component: &str) -> StorageResult<i32> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            component TEXT PRIMARY KEY,
            version INTEGER NOT NULL
        )",
        [],
    )
    .map_err(|e| migration_error("Failed to create schema_version table", e))?;

    let version: Option<i32> = conn
        .query_row(
            "SELECT version FROM schema_version WHERE component = ?1",
            [component],
            |row| row.get(0),
        )
        .ok();

    Ok(version.unwrap_or(0))
}

fn set_schema_version(conn: &Connection, component: &str, version: i32) -> StorageResult<()> {
    conn.execute(
        "INSERT INTO schema_version (component, version) VALUES (?1, ?2)
         ON CONFLICT(component) DO UPDATE SET version = excluded.version",
        rusqlite::params![component, version],
    )
    .map_err(|e| migration_error("Failed to set schema_version", e))?;

    Ok(())
}

fn create_schema_v1(conn: &Connection) -> StorageResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS owner (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT,
            email TEXT,
            phone TEXT
        );

        CREATE TABLE IF NOT EXISTS pet (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT,
            type TEXT,
            breed TEXT,
            owner_id INTEGER REFERENCES owner(id)
        );

        CREATE TABLE IF NOT EXISTS vet (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT,
            address TEXT,
            city TEXT,
            state_province TEXT,
            phone TEXT
        );

        CREATE TABLE IF NOT EXISTS slot (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            start_time TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS appointment (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            appt_time TEXT NOT NULL,
            slot_id INTEGER REFERENCES slot(id),
            vet_id INTEGER REFERENCES vet(id),
            pet_id INTEGER REFERENCES pet(id)
        );

        CREATE INDEX IF NOT EXISTS idx_pet_owner ON pet(owner_id);
        CREATE INDEX IF NOT EXISTS idx_appointment_slot ON appointment(slot_id);
        CREATE INDEX IF NOT EXISTS idx_appointment_vet ON appointment(vet_id);
        CREATE INDEX IF NOT EXISTS idx_appointment_pet ON appointment(pet_id);
        CREATE INDEX IF NOT EXISTS idx_appointment_time ON appointment(appt_time);",
    )
    .map_err(|e| migration_error("Failed to create store tables", e))
}

fn create_index_schema_v1(conn: &Connection) -> StorageResult<()> {
    conn.execute_batch(&format!(
        "CREATE VIRTUAL TABLE IF NOT EXISTS {} USING fts5(
            entity_type UNINDEXED,
            entity_id UNINDEXED,
            document UNINDEXED,
            content,
            tokenize='porter unicode61'
        );",
        DOCUMENTS_TABLE
    ))
    .map_err(|e| migration_error("Failed to create search document table", e))
}
