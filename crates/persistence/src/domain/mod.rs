//! Clinic entities and their static column bindings.
//!
//! Every entity declares its table, its columns and (where it has them) its
//! many-to-one relations as constants. The store, the specification builder
//! and the sort validation all work off these tables; there is no runtime
//! reflection.
//!
//! Entity equality is identity based: two instances are equal only when both
//! carry an id and the ids match. An entity that has not been saved yet is
//! not equal to anything, itself included.

mod appointment;
mod owner;
mod pet;
mod slot;
mod vet;

use std::fmt::Debug;

use chrono::NaiveDate;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{BackendError, StorageError, StorageResult};
use crate::query::SqlParam;

pub use appointment::Appointment;
pub use owner::Owner;
pub use pet::Pet;
pub use slot::Slot;
pub use vet::Vet;

/// Binding of an entity property to a table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    /// Property name as exposed on the wire.
    pub property: &'static str,
    /// Column name in the entity table.
    pub column: &'static str,
}

impl Field {
    /// Binds `property` to `column`.
    pub const fn new(property: &'static str, column: &'static str) -> Self {
        Self { property, column }
    }
}

/// A persisted entity type.
pub trait Entity: Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Entity name used in logs and errors.
    const NAME: &'static str;

    /// Table holding the entity.
    const TABLE: &'static str;

    /// Non-id columns, in the order of [`to_values`](Entity::to_values).
    const FIELDS: &'static [Field];

    /// The store-assigned id, `None` until saved.
    fn id(&self) -> Option<i64>;

    /// Sets the id.
    fn set_id(&mut self, id: i64);

    /// Column values, one per entry of [`FIELDS`](Entity::FIELDS).
    fn to_values(&self) -> Vec<SqlParam>;

    /// Rebuilds an entity from a row read in [`FIELDS`](Entity::FIELDS) order.
    fn from_row(row: EntityRow) -> StorageResult<Self>;

    /// Resolves a sortable property to its column.
    fn column_for(property: &str) -> Option<&'static str> {
        if property == "id" {
            return Some("id");
        }
        Self::FIELDS
            .iter()
            .find(|f| f.property == property)
            .map(|f| f.column)
    }
}

/// A raw entity row: the id plus the values of [`Entity::FIELDS`].
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRow {
    /// Row id.
    pub id: i64,
    /// Non-id column values.
    pub values: Vec<SqlParam>,
}

impl EntityRow {
    /// Wraps a row read from the store.
    pub fn new(id: i64, values: Vec<SqlParam>) -> Self {
        Self { id, values }
    }

    fn value(&self, index: usize) -> StorageResult<&SqlParam> {
        self.values.get(index).ok_or_else(|| {
            StorageError::Backend(BackendError::SerializationError {
                message: format!("row {} has no column {}", self.id, index),
            })
        })
    }

    /// Optional text column.
    pub fn string(&self, index: usize) -> StorageResult<Option<String>> {
        match self.value(index)? {
            SqlParam::String(s) => Ok(Some(s.clone())),
            SqlParam::Null => Ok(None),
            other => Err(unexpected(self.id, index, "text", other)),
        }
    }

    /// Optional integer column.
    pub fn integer(&self, index: usize) -> StorageResult<Option<i64>> {
        match self.value(index)? {
            SqlParam::Integer(i) => Ok(Some(*i)),
            SqlParam::Null => Ok(None),
            other => Err(unexpected(self.id, index, "integer", other)),
        }
    }

    /// Optional ISO-8601 date column.
    pub fn date(&self, index: usize) -> StorageResult<Option<NaiveDate>> {
        self.string(index)?
            .map(|s| {
                NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|e| {
                    StorageError::Backend(BackendError::SerializationError {
                        message: format!("row {}: invalid date '{}': {}", self.id, s, e),
                    })
                })
            })
            .transpose()
    }

    /// Required column; fails when the stored value is NULL.
    pub fn required<T>(&self, index: usize, value: Option<T>) -> StorageResult<T> {
        value.ok_or_else(|| {
            StorageError::Backend(BackendError::SerializationError {
                message: format!("row {}: required column {} is null", self.id, index),
            })
        })
    }
}

fn unexpected(id: i64, index: usize, expected: &str, got: &SqlParam) -> StorageError {
    StorageError::Backend(BackendError::SerializationError {
        message: format!(
            "row {}: column {} expected {}, found {:?}",
            id, index, expected, got
        ),
    })
}

/// Implements identity equality and hashing on the `id` field.
macro_rules! identity_eq {
    ($ty:ty) => {
        impl PartialEq for $ty {
            fn eq(&self, other: &Self) -> bool {
                matches!((self.id, other.id), (Some(a), Some(b)) if a == b)
            }
        }

        impl std::hash::Hash for $ty {
            fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
                self.id.hash(state);
            }
        }
    };
}

pub(crate) use identity_eq;
