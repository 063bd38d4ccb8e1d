use serde::{Deserialize, Serialize};

use crate::error::StorageResult;
use crate::query::SqlParam;

use super::{Entity, EntityRow, Field, identity_eq};

/// A pet owner.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    /// Store-assigned id, `None` until saved.
    #[serde(default)]
    pub id: Option<i64>,
    /// Full name.
    #[serde(default)]
    pub name: Option<String>,
    /// Contact email.
    #[serde(default)]
    pub email: Option<String>,
    /// Contact phone number.
    #[serde(default)]
    pub phone: Option<String>,
}

identity_eq!(Owner);

impl Owner {
    /// A new, unsaved owner with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Sets the email.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets the phone number.
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }
}

impl Entity for Owner {
    const NAME: &'static str = "Owner";
    const TABLE: &'static str = "owner";
    const FIELDS: &'static [Field] = &[
        Field::new("name", "name"),
        Field::new("email", "email"),
        Field::new("phone", "phone"),
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
            SqlParam::optional(self.email.as_ref()),
            SqlParam::optional(self.phone.as_ref()),
        ]
    }

    fn from_row(row: EntityRow) -> StorageResult<Self> {
        Ok(Self {
            id: Some(row.id),
            name: row.string(0)?,
            email: row.string(1)?,
            phone: row.string(2)?,
        })
    }
}
