//! [`EntityStore`] implementation over the relational tables.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{Connection, ErrorCode, Row, ToSql, params_from_iter};
use tracing::debug;

use crate::core::EntityStore;
use crate::domain::{Entity, EntityRow};
use crate::error::{
    BackendError, ResourceError, StorageError, StorageResult, ValidationError,
};
use crate::query::{Predicate, SqlParam};
use crate::types::{Page, PageInfo, Pageable};

use super::SqliteBackend;

impl ToSql for SqlParam {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlParam::String(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            SqlParam::Integer(i) => ToSqlOutput::Borrowed(ValueRef::Integer(*i)),
            SqlParam::Float(f) => ToSqlOutput::Borrowed(ValueRef::Real(*f)),
            SqlParam::Null => ToSqlOutput::Borrowed(ValueRef::Null),
        })
    }
}

fn param_from_value(value: ValueRef<'_>) -> rusqlite::Result<SqlParam> {
    Ok(match value {
        ValueRef::Null => SqlParam::Null,
        ValueRef::Integer(i) => SqlParam::Integer(i),
        ValueRef::Real(f) => SqlParam::Float(f),
        ValueRef::Text(bytes) => SqlParam::String(
            std::str::from_utf8(bytes)
                .map_err(rusqlite::Error::Utf8Error)?
                .to_string(),
        ),
        ValueRef::Blob(_) => {
            return Err(rusqlite::Error::InvalidColumnType(
                0,
                "blob".to_string(),
                rusqlite::types::Type::Blob,
            ));
        }
    })
}

fn read_row(row: &Row<'_>, columns: usize) -> rusqlite::Result<EntityRow> {
    let id: i64 = row.get(0)?;
    let values = (1..=columns)
        .map(|i| param_from_value(row.get_ref(i)?))
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(EntityRow::new(id, values))
}

/// Maps write failures, turning constraint violations into validation errors.
fn write_error<E: Entity>(err: rusqlite::Error) -> StorageError {
    match &err {
        rusqlite::Error::SqliteFailure(e, msg) if e.code == ErrorCode::ConstraintViolation => {
            StorageError::Validation(ValidationError::ConstraintViolation {
                entity: E::NAME.to_string(),
                message: msg.clone().unwrap_or_else(|| e.to_string()),
            })
        }
        _ => StorageError::from(err),
    }
}

fn not_found<E: Entity>(id: i64) -> StorageError {
    StorageError::Resource(ResourceError::NotFound {
        entity: E::NAME.to_string(),
        id,
    })
}

/// SQLite store for one entity type, driven by the entity's field table.
pub struct SqliteEntityStore<E: Entity> {
    backend: Arc<SqliteBackend>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> std::fmt::Debug for SqliteEntityStore<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteEntityStore")
            .field("entity", &E::NAME)
            .field("backend", &self.backend)
            .finish()
    }
}

impl<E: Entity> Clone for SqliteEntityStore<E> {
    fn clone(&self) -> Self {
        Self::new(self.backend.clone())
    }
}

impl<E: Entity> SqliteEntityStore<E> {
    /// Creates a store over a backend whose schema is initialized.
    pub fn new(backend: Arc<SqliteBackend>) -> Self {
        Self {
            backend,
            _entity: PhantomData,
        }
    }

    fn select_list() -> String {
        std::iter::once("id")
            .chain(E::FIELDS.iter().map(|f| f.column))
            .map(|c| format!("{}.{}", E::TABLE, c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn order_by(pageable: &Pageable) -> StorageResult<String> {
        let mut terms = Vec::with_capacity(pageable.sort.len() + 1);
        for order in &pageable.sort {
            let column = E::column_for(&order.property).ok_or_else(|| {
                ValidationError::InvalidSortProperty {
                    entity: E::NAME.to_string(),
                    property: order.property.clone(),
                }
            })?;
            terms.push(format!("{}.{} {}", E::TABLE, column, order.direction.as_sql()));
        }
        terms.push(format!("{}.id ASC", E::TABLE));
        Ok(terms.join(", "))
    }

    fn read_by_id(conn: &Connection, id: i64) -> StorageResult<Option<E>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE {}.id = ?1",
            Self::select_list(),
            E::TABLE,
            E::TABLE
        );
        let mut stmt = conn.prepare_cached(&sql)?;
        let mut rows = stmt.query_map([id], |row| read_row(row, E::FIELDS.len()))?;
        match rows.next() {
            Some(row) => Ok(Some(E::from_row(row?)?)),
            None => Ok(None),
        }
    }

    fn query(conn: &Connection, sql: &str, params: &[SqlParam]) -> StorageResult<Vec<E>> {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params_from_iter(params.iter()), |row| {
            read_row(row, E::FIELDS.len())
        })?;

        let mut entities = Vec::new();
        for row in rows {
            entities.push(E::from_row(row?)?);
        }
        Ok(entities)
    }

    fn count(conn: &Connection, predicate: &Predicate) -> StorageResult<u64> {
        let from = predicate.from_clause();
        let sql = format!("SELECT COUNT(*) {}", from.sql);
        let count: i64 = conn.query_row(&sql, params_from_iter(from.params.iter()), |row| {
            row.get(0)
        })?;
        Ok(count.max(0) as u64)
    }
}

#[async_trait]
impl<E: Entity> EntityStore<E> for SqliteEntityStore<E> {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn save(&self, entity: E) -> StorageResult<E> {
        let mut conn = self.backend.get_connection()?;
        let tx = conn.transaction()?;

        let mut values = entity.to_values();
        let id = match entity.id() {
            None => {
                let columns: Vec<_> = E::FIELDS.iter().map(|f| f.column).collect();
                let placeholders = vec!["?"; columns.len()].join(", ");
                let sql = format!(
                    "INSERT INTO {} ({}) VALUES ({})",
                    E::TABLE,
                    columns.join(", "),
                    placeholders
                );
                tx.execute(&sql, params_from_iter(values.iter()))
                    .map_err(write_error::<E>)?;
                tx.last_insert_rowid()
            }
            Some(id) => {
                let assignments: Vec<_> = E::FIELDS
                    .iter()
                    .map(|f| format!("{} = ?", f.column))
                    .collect();
                let sql = format!(
                    "UPDATE {} SET {} WHERE id = ?",
                    E::TABLE,
                    assignments.join(", ")
                );
                values.push(SqlParam::Integer(id));
                let changed = tx
                    .execute(&sql, params_from_iter(values.iter()))
                    .map_err(write_error::<E>)?;
                if changed == 0 {
                    return Err(not_found::<E>(id));
                }
                id
            }
        };

        let saved = Self::read_by_id(&tx, id)?.ok_or_else(|| {
            StorageError::Backend(BackendError::QueryError {
                message: format!("{} {} vanished after write", E::NAME, id),
            })
        })?;
        tx.commit()?;

        debug!(entity = E::NAME, id, "Saved entity");
        Ok(saved)
    }

    async fn find_by_id(&self, id: i64) -> StorageResult<Option<E>> {
        let conn = self.backend.get_connection()?;
        Self::read_by_id(&conn, id)
    }

    async fn delete_by_id(&self, id: i64) -> StorageResult<()> {
        let conn = self.backend.get_connection()?;
        let sql = format!("DELETE FROM {} WHERE id = ?1", E::TABLE);
        let changed = conn.execute(&sql, [id]).map_err(write_error::<E>)?;
        if changed == 0 {
            return Err(not_found::<E>(id));
        }

        debug!(entity = E::NAME, id, "Deleted entity");
        Ok(())
    }

    async fn find_all_matching(&self, predicate: &Predicate) -> StorageResult<Vec<E>> {
        let conn = self.backend.get_connection()?;
        let from = predicate.from_clause();
        let sql = format!(
            "SELECT {} {} ORDER BY {}.id ASC",
            Self::select_list(),
            from.sql,
            E::TABLE
        );
        Self::query(&conn, &sql, &from.params)
    }

    async fn find_page_matching(
        &self,
        predicate: &Predicate,
        pageable: &Pageable,
    ) -> StorageResult<Page<E>> {
        pageable.validate()?;
        let order_by = Self::order_by(pageable)?;

        let conn = self.backend.get_connection()?;
        let total = Self::count(&conn, predicate)?;
        if pageable.offset() >= total {
            return Ok(Page::new(Vec::new(), PageInfo::new(pageable, total)));
        }

        let from = predicate.from_clause();
        let sql = format!(
            "SELECT {} {} ORDER BY {} LIMIT ? OFFSET ?",
            Self::select_list(),
            from.sql,
            order_by
        );
        let mut params = from.params;
        params.push(SqlParam::Integer(i64::from(pageable.size)));
        params.push(SqlParam::Integer(pageable.offset() as i64));

        let items = Self::query(&conn, &sql, &params)?;
        Ok(Page::new(items, PageInfo::new(pageable, total)))
    }

    async fn count_matching(&self, predicate: &Predicate) -> StorageResult<u64> {
        let conn = self.backend.get_connection()?;
        Self::count(&conn, predicate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Appointment, Owner, Pet, Slot};
    use crate::query::{
        AppointmentCriteria, LongFilter, OwnerCriteria, StringFilter, build_predicate,
    };
    use crate::types::SortOrder;
    use chrono::NaiveDate;

    fn create_backend() -> Arc<SqliteBackend> {
        let backend = SqliteBackend::in_memory().expect("Failed to create SQLite backend");
        backend.init_schema().expect("Failed to initialize schema");
        Arc::new(backend)
    }

    // ========================================================================
    // Save / read / delete
    // ========================================================================

    #[tokio::test]
    async fn test_insert_assigns_id() {
        let store = SqliteEntityStore::<Owner>::new(create_backend());

        let saved = store.save(Owner::new("A").with_email("a@x")).await.unwrap();
        assert_eq!(saved.id, Some(1));
        assert_eq!(saved.email.as_deref(), Some("a@x"));

        let second = store.save(Owner::new("B")).await.unwrap();
        assert_eq!(second.id, Some(2));
    }

    #[tokio::test]
    async fn test_update_existing() {
        let store = SqliteEntityStore::<Owner>::new(create_backend());
        let mut saved = store.save(Owner::new("A")).await.unwrap();

        saved.phone = Some("555".to_string());
        let updated = store.save(saved.clone()).await.unwrap();
        assert_eq!(updated.id, saved.id);

        let read = store.find_by_id(1).await.unwrap().unwrap();
        assert_eq!(read.phone.as_deref(), Some("555"));
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let store = SqliteEntityStore::<Owner>::new(create_backend());
        let mut owner = Owner::new("A");
        owner.id = Some(42);

        let err = store.save(owner).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_find_missing_is_none() {
        let store = SqliteEntityStore::<Slot>::new(create_backend());
        assert!(store.find_by_id(7).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete() {
        let store = SqliteEntityStore::<Slot>::new(create_backend());
        let saved = store.save(Slot::new("09:00")).await.unwrap();
        let id = saved.id.unwrap();

        store.delete_by_id(id).await.unwrap();
        assert!(store.find_by_id(id).await.unwrap().is_none());
        assert!(store.delete_by_id(id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_foreign_key_violation() {
        let backend = create_backend();
        let pets = SqliteEntityStore::<Pet>::new(backend.clone());

        let err = pets.save(Pet::new("Rex").with_owner(99)).await.unwrap_err();
        assert!(matches!(
            err,
            StorageError::Validation(ValidationError::ConstraintViolation { .. })
        ));

        let owners = SqliteEntityStore::<Owner>::new(backend);
        let owner = owners.save(Owner::new("A")).await.unwrap();
        pets.save(Pet::new("Rex").with_owner(owner.id.unwrap()))
            .await
            .unwrap();
        assert!(matches!(
            owners.delete_by_id(owner.id.unwrap()).await.unwrap_err(),
            StorageError::Validation(ValidationError::ConstraintViolation { .. })
        ));
    }

    // ========================================================================
    // Predicate queries
    // ========================================================================

    #[tokio::test]
    async fn test_predicate_queries() {
        let store = SqliteEntityStore::<Owner>::new(create_backend());
        for name in ["A", "B", "C"] {
            store.save(Owner::new(name)).await.unwrap();
        }

        let criteria = OwnerCriteria {
            name: Some(StringFilter::new().in_values(["A", "C"])),
            ..Default::default()
        };
        let predicate = build_predicate(&criteria);
        let found = store.find_all_matching(&predicate).await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(store.count_matching(&predicate).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_relation_predicate() {
        let backend = create_backend();
        let slots = SqliteEntityStore::<Slot>::new(backend.clone());
        let appointments = SqliteEntityStore::<Appointment>::new(backend);

        let slot = slots.save(Slot::new("10:00")).await.unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 4, 2).unwrap();
        appointments
            .save(Appointment::new(date).with_slot(slot.id.unwrap()))
            .await
            .unwrap();
        appointments.save(Appointment::new(date)).await.unwrap();

        let criteria = AppointmentCriteria {
            slot_id: Some(LongFilter::new().specified(false)),
            ..Default::default()
        };
        let found = appointments
            .find_all_matching(&build_predicate(&criteria))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert!(found[0].slot_id.is_none());
    }

    // ========================================================================
    // Paging
    // ========================================================================

    #[tokio::test]
    async fn test_paging_and_sort() {
        let store = SqliteEntityStore::<Owner>::new(create_backend());
        for name in ["C", "A", "B", "A"] {
            store.save(Owner::new(name)).await.unwrap();
        }

        let pageable = Pageable::new(0, 3).with_sort(SortOrder::asc("name"));
        let page = store.find_all(&pageable).await.unwrap();
        let names: Vec<_> = page.items.iter().map(|o| o.name.clone().unwrap()).collect();
        assert_eq!(names, vec!["A", "A", "B"]);
        // Ties broken by id
        assert!(page.items[0].id < page.items[1].id);
        assert_eq!(page.total(), 4);
        assert!(page.page_info.has_next);

        let last = store.find_all(&pageable.next()).await.unwrap();
        assert_eq!(last.len(), 1);
        assert!(!last.page_info.has_next);

        let beyond = store.find_all(&Pageable::new(5, 3)).await.unwrap();
        assert!(beyond.is_empty());
        assert_eq!(beyond.total(), 4);
    }

    #[tokio::test]
    async fn test_invalid_sort_property() {
        let store = SqliteEntityStore::<Owner>::new(create_backend());
        let pageable = Pageable::first(10).with_sort(SortOrder::desc("name; DROP TABLE owner"));
        let err = store.find_all(&pageable).await.unwrap_err();
        assert!(matches!(
            err,
            StorageError::Validation(ValidationError::InvalidSortProperty { .. })
        ));
    }
}
