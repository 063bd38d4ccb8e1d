//! FTS5 search documents.
//!
//! Each document holds the entity JSON (returned from searches) and a
//! flattened text of all its scalar values (matched by searches).
//!
//! Query syntax: whitespace separated terms, each matched as a phrase, any
//! term may match. A term ending in `*` is a prefix. An empty query or a
//! lone `*` matches every document of the entity type.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::{Connection, params};
use serde_json::Value;
use tracing::debug;

use crate::core::SearchIndex;
use crate::domain::Entity;
use crate::error::{StorageResult, ValidationError};
use crate::types::{Page, PageInfo, Pageable};

use super::SqliteBackend;
use super::schema::DOCUMENTS_TABLE;

/// Extracts all string and number values from a JSON value recursively.
pub fn extract_all_strings(value: &Value) -> String {
    let mut strings = Vec::new();
    extract_strings_recursive(value, &mut strings);
    strings.join(" ")
}

fn extract_strings_recursive(value: &Value, strings: &mut Vec<String>) {
    match value {
        Value::String(s) => {
            if !s.is_empty() {
                strings.push(s.clone());
            }
        }
        Value::Number(n) => strings.push(n.to_string()),
        Value::Array(arr) => {
            for item in arr {
                extract_strings_recursive(item, strings);
            }
        }
        Value::Object(obj) => {
            for val in obj.values() {
                extract_strings_recursive(val, strings);
            }
        }
        _ => {}
    }
}

/// Builds the FTS5 MATCH expression for a free-text query.
///
/// Returns `None` when the query matches everything.
pub fn build_match_query(query: &str) -> Option<String> {
    let terms: Vec<String> = query
        .split_whitespace()
        .filter_map(|term| {
            let (stem, prefix) = match term.strip_suffix('*') {
                Some(stem) => (stem, true),
                None => (term, false),
            };
            if stem.is_empty() {
                return None;
            }
            let quoted = format!("\"{}\"", stem.replace('"', "\"\""));
            Some(if prefix { format!("{}*", quoted) } else { quoted })
        })
        .collect();

    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" OR "))
    }
}

/// SQLite search index for one entity type.
pub struct SqliteSearchIndex<E: Entity> {
    backend: Arc<SqliteBackend>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> std::fmt::Debug for SqliteSearchIndex<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteSearchIndex")
            .field("entity", &E::NAME)
            .field("backend", &self.backend)
            .finish()
    }
}

impl<E: Entity> SqliteSearchIndex<E> {
    /// Creates an index over a backend whose index schema is initialized.
    pub fn new(backend: Arc<SqliteBackend>) -> Self {
        Self {
            backend,
            _entity: PhantomData,
        }
    }

    fn order_by(pageable: &Pageable, ranked: bool) -> StorageResult<String> {
        let mut terms = Vec::new();
        for order in &pageable.sort {
            if E::column_for(&order.property).is_none() {
                return Err(ValidationError::InvalidSortProperty {
                    entity: E::NAME.to_string(),
                    property: order.property.clone(),
                }
                .into());
            }
            terms.push(format!(
                "json_extract(document, '$.{}') {}",
                order.property,
                order.direction.as_sql()
            ));
        }
        if ranked {
            terms.push("rank".to_string());
        }
        terms.push("entity_id ASC".to_string());
        Ok(terms.join(", "))
    }

    fn documents(
        conn: &Connection,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> StorageResult<Vec<E>> {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| row.get::<_, String>(0))?;

        let mut entities = Vec::new();
        for row in rows {
            entities.push(serde_json::from_str(&row?)?);
        }
        Ok(entities)
    }

    fn count(conn: &Connection, match_query: Option<&str>) -> StorageResult<u64> {
        let count: i64 = match match_query {
            Some(q) => conn.query_row(
                &format!(
                    "SELECT COUNT(*) FROM {t} WHERE {t} MATCH ?1 AND entity_type = ?2",
                    t = DOCUMENTS_TABLE
                ),
                params![q, E::NAME],
                |row| row.get(0),
            )?,
            None => conn.query_row(
                &format!(
                    "SELECT COUNT(*) FROM {} WHERE entity_type = ?1",
                    DOCUMENTS_TABLE
                ),
                params![E::NAME],
                |row| row.get(0),
            )?,
        };
        Ok(count.max(0) as u64)
    }
}

#[async_trait]
impl<E: Entity> SearchIndex<E> for SqliteSearchIndex<E> {
    fn backend_name(&self) -> &'static str {
        "sqlite-fts5"
    }

    async fn save(&self, entity: &E) -> StorageResult<()> {
        let Some(id) = entity.id() else {
            return Err(ValidationError::IdNull {
                entity: E::NAME.to_string(),
            }
            .into());
        };

        let document = serde_json::to_value(entity)?;
        let content = extract_all_strings(&document);
        let document = serde_json::to_string(&document)?;

        let mut conn = self.backend.get_connection()?;
        let tx = conn.transaction()?;
        tx.execute(
            &format!(
                "DELETE FROM {} WHERE entity_type = ?1 AND entity_id = ?2",
                DOCUMENTS_TABLE
            ),
            params![E::NAME, id],
        )?;
        tx.execute(
            &format!(
                "INSERT INTO {} (entity_type, entity_id, document, content) VALUES (?1, ?2, ?3, ?4)",
                DOCUMENTS_TABLE
            ),
            params![E::NAME, id, document, content],
        )?;
        tx.commit()?;

        debug!(entity = E::NAME, id, "Indexed document");
        Ok(())
    }

    async fn delete_by_id(&self, id: i64) -> StorageResult<()> {
        let conn = self.backend.get_connection()?;
        conn.execute(
            &format!(
                "DELETE FROM {} WHERE entity_type = ?1 AND entity_id = ?2",
                DOCUMENTS_TABLE
            ),
            params![E::NAME, id],
        )?;
        Ok(())
    }

    async fn delete_all(&self) -> StorageResult<u64> {
        let conn = self.backend.get_connection()?;
        let removed = conn.execute(
            &format!("DELETE FROM {} WHERE entity_type = ?1", DOCUMENTS_TABLE),
            params![E::NAME],
        )?;
        Ok(removed as u64)
    }

    async fn search(&self, query: &str) -> StorageResult<Vec<E>> {
        let conn = self.backend.get_connection()?;
        match build_match_query(query) {
            Some(q) => Self::documents(
                &conn,
                &format!(
                    "SELECT document FROM {t} WHERE {t} MATCH ?1 AND entity_type = ?2 \
                     ORDER BY rank, entity_id ASC",
                    t = DOCUMENTS_TABLE
                ),
                &[&q, &E::NAME],
            ),
            None => Self::documents(
                &conn,
                &format!(
                    "SELECT document FROM {} WHERE entity_type = ?1 ORDER BY entity_id ASC",
                    DOCUMENTS_TABLE
                ),
                &[&E::NAME],
            ),
        }
    }

    async fn search_page(&self, query: &str, pageable: &Pageable) -> StorageResult<Page<E>> {
        pageable.validate()?;
        let match_query = build_match_query(query);
        let order_by = Self::order_by(pageable, match_query.is_some())?;

        let conn = self.backend.get_connection()?;
        let total = Self::count(&conn, match_query.as_deref())?;

        let limit = i64::from(pageable.size);
        let offset = pageable.offset() as i64;
        let items = match &match_query {
            Some(q) => Self::documents(
                &conn,
                &format!(
                    "SELECT document FROM {t} WHERE {t} MATCH ?1 AND entity_type = ?2 \
                     ORDER BY {o} LIMIT ?3 OFFSET ?4",
                    t = DOCUMENTS_TABLE,
                    o = order_by
                ),
                &[q, &E::NAME, &limit, &offset],
            )?,
            None => Self::documents(
                &conn,
                &format!(
                    "SELECT document FROM {} WHERE entity_type = ?1 ORDER BY {} LIMIT ?2 OFFSET ?3",
                    DOCUMENTS_TABLE, order_by
                ),
                &[&E::NAME, &limit, &offset],
            )?,
        };

        Ok(Page::new(items, PageInfo::new(pageable, total)))
    }
}
