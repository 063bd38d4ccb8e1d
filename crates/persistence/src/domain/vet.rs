use serde::{Deserialize, Serialize};

use crate::error::StorageResult;
use crate::query::SqlParam;

use super::{Entity, EntityRow, Field, identity_eq};

/// A veterinarian.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vet {
    /// Store-assigned id, `None` until saved.
    #[serde(default)]
    pub id: Option<i64>,
    /// Full name.
    #[serde(default)]
    pub name: Option<String>,
    /// Street address.
    #[serde(default)]
    pub address: Option<String>,
    /// City.
    #[serde(default)]
    pub city: Option<String>,
    /// State or province.
    #[serde(default)]
    pub state_province: Option<String>,
    /// Contact phone number.
    #[serde(default)]
    pub phone: Option<String>,
}

identity_eq!(Vet);

impl Vet {
    /// A new, unsaved vet with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Sets the street address, city and state or province.
    pub fn with_address(
        mut self,
        address: impl Into<String>,
        city: impl Into<String>,
        state_province: impl Into<String>,
    ) -> Self {
        self.address = Some(address.into());
        self.city = Some(city.into());
        self.state_province = Some(state_province.into());
        self
    }

    /// Sets the phone number.
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }
}

impl Entity for Vet {
    const NAME: &'static str = "Vet";
    const TABLE: &'static str = "vet";
    const FIELDS: &'static [Field] = &[
        Field::new("name", "name"),
        Field::new("address", "address"),
        Field::new("city", "city"),
        Field::new("stateProvince", "state_province"),
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
            SqlParam::optional(self.address.as_ref()),
            SqlParam::optional(self.city.as_ref()),
            SqlParam::optional(self.state_province.as_ref()),
            SqlParam::optional(self.phone.as_ref()),
        ]
    }

    fn from_row(row: EntityRow) -> StorageResult<Self> {
        Ok(Self {
            id: Some(row.id),
            name: row.string(0)?,
            address: row.string(1)?,
            city: row.string(2)?,
            state_province: row.string(3)?,
            phone: row.string(4)?,
        })
    }
}
