use serde::{Deserialize, Serialize};

use crate::error::StorageResult;
use crate::query::{Relation, SqlParam};

use super::{Entity, EntityRow, Field, identity_eq};

/// A pet, optionally belonging to an [`Owner`](super::Owner).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pet {
    /// Store-assigned id, `None` until saved.
    #[serde(default)]
    pub id: Option<i64>,
    /// Pet name.
    #[serde(default)]
    pub name: Option<String>,
    /// Species, `type` on the wire.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    /// Breed.
    #[serde(default)]
    pub breed: Option<String>,
    /// Id of the owning [`Owner`](super::Owner).
    #[serde(default)]
    pub owner_id: Option<i64>,
}

identity_eq!(Pet);

impl Pet {
    /// Pet → Owner.
    pub const OWNER: Relation = Relation {
        name: "owner",
        foreign_key: "owner_id",
        target_table: "owner",
    };

    /// A new, unsaved pet with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Sets the species.
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Sets the breed.
    pub fn with_breed(mut self, breed: impl Into<String>) -> Self {
        self.breed = Some(breed.into());
        self
    }

    /// Links the pet to an owner.
    pub fn with_owner(mut self, owner_id: i64) -> Self {
        self.owner_id = Some(owner_id);
        self
    }
}

impl Entity for Pet {
    const NAME: &'static str = "Pet";
    const TABLE: &'static str = "pet";
    const FIELDS: &'static [Field] = &[
        Field::new("name", "name"),
        Field::new("type", "type"),
        Field::new("breed", "breed"),
        Field::new("ownerId", "owner_id"),
    ];

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn to_values(&self) -> Vec<SqlParam> {
        vec![
            SqlParam::optional(self.name.as_ref()),
            SqlParam::optional(self.kind.as_ref()),
            SqlParam::optional(self.breed.as_ref()),
            SqlParam::optional(self.owner_id.as_ref()),
        ]
    }

    fn from_row(row: EntityRow) -> StorageResult<Self> {
        Ok(Self {
            id: Some(row.id),
            name: row.string(0)?,
            kind: row.string(1)?,
            breed: row.string(2)?,
            owner_id: row.integer(3)?,
        })
    }
}
