use serde::{Deserialize, Serialize};

use crate::error::StorageResult;
use crate::query::SqlParam;

use super::{Entity, EntityRow, Field, identity_eq};

/// A bookable time slot. The start time is free text (e.g. `09:30`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    /// Store-assigned id, `None` until saved.
    #[serde(default)]
    pub id: Option<i64>,
    /// Start time, e.g. `09:30`.
    pub start_time: String,
}

identity_eq!(Slot);

impl Slot {
    /// A new, unsaved slot.
    pub fn new(start_time: impl Into<String>) -> Self {
        Self {
            id: None,
            start_time: start_time.into(),
        }
    }
}

impl Entity for Slot {
    const NAME: &'static str = "Slot";
    const TABLE: &'static str = "slot";
    const FIELDS: &'static [Field] = &[Field::new("startTime", "start_time")];

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn to_values(&self) -> Vec<SqlParam> {
        vec![SqlParam::string(self.start_time.clone())]
    }

    fn from_row(row: EntityRow) -> StorageResult<Self> {
        let start_time = row.string(0)?;
        Ok(Self {
            id: Some(row.id),
            start_time: row.required(0, start_time)?,
        })
    }
}
