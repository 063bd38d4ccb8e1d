use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::StorageResult;
use crate::query::{Relation, SqlParam, ToSqlParam};

use super::{Entity, EntityRow, Field, identity_eq};

/// An appointment on a date, linking a slot, a vet and a pet.
///
/// All three links are optional. Nothing checks that a slot is free on the
/// appointment date.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    /// Store-assigned id, `None` until saved.
    #[serde(default)]
    pub id: Option<i64>,
    /// Date of the appointment.
    pub appt_time: NaiveDate,
    /// Id of the booked [`Slot`](super::Slot).
    #[serde(default)]
    pub slot_id: Option<i64>,
    /// Id of the attending [`Vet`](super::Vet).
    #[serde(default)]
    pub vet_id: Option<i64>,
    /// Id of the [`Pet`](super::Pet) being seen.
    #[serde(default)]
    pub pet_id: Option<i64>,
}

identity_eq!(Appointment);

impl Appointment {
    /// Appointment → Slot.
    pub const SLOT: Relation = Relation {
        name: "slot",
        foreign_key: "slot_id",
        target_table: "slot",
    };

    /// Appointment → Vet.
    pub const VET: Relation = Relation {
        name: "vet",
        foreign_key: "vet_id",
        target_table: "vet",
    };

    /// Appointment → Pet.
    pub const PET: Relation = Relation {
        name: "pet",
        foreign_key: "pet_id",
        target_table: "pet",
    };

    /// A new, unsaved appointment with no links.
    pub fn new(appt_time: NaiveDate) -> Self {
        Self {
            id: None,
            appt_time,
            slot_id: None,
            vet_id: None,
            pet_id: None,
        }
    }

    /// Books a slot.
    pub fn with_slot(mut self, slot_id: i64) -> Self {
        self.slot_id = Some(slot_id);
        self
    }

    /// Assigns a vet.
    pub fn with_vet(mut self, vet_id: i64) -> Self {
        self.vet_id = Some(vet_id);
        self
    }

    /// Sets the pet.
    pub fn with_pet(mut self, pet_id: i64) -> Self {
        self.pet_id = Some(pet_id);
        self
    }
}

impl Entity for Appointment {
    const NAME: &'static str = "Appointment";
    const TABLE: &'static str = "appointment";
    const FIELDS: &'static [Field] = &[
        Field::new("apptTime", "appt_time"),
        Field::new("slotId", "slot_id"),
        Field::new("vetId", "vet_id"),
        Field::new("petId", "pet_id"),
    ];

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn to_values(&self) -> Vec<SqlParam> {
        vec![
            self.appt_time.to_sql_param(),
            SqlParam::optional(self.slot_id.as_ref()),
            SqlParam::optional(self.vet_id.as_ref()),
            SqlParam::optional(self.pet_id.as_ref()),
        ]
    }

    fn from_row(row: EntityRow) -> StorageResult<Self> {
        let appt_time = row.date(0)?;
        Ok(Self {
            id: Some(row.id),
            appt_time: row.required(0, appt_time)?,
            slot_id: row.integer(1)?,
            vet_id: row.integer(2)?,
            pet_id: row.integer(3)?,
        })
    }
}
