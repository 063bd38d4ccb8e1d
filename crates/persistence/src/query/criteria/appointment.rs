use crate::domain::Appointment;
use crate::error::ValidationError;
use crate::query::filter::{FilterOperator, LocalDateFilter, LongFilter};
use crate::query::specification::SpecificationBuilder;

use super::{Criteria, apply_to, unknown_field};

/// Filters over [`Appointment`].
///
/// `slot_id`, `vet_id` and `pet_id` filter on the id of the joined entity, so
/// `specified=false` selects appointments without that link.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AppointmentCriteria {
    /// Filter on `id`.
    pub id: Option<LongFilter>,
    /// Filter on `apptTime`.
    pub appt_time: Option<LocalDateFilter>,
    /// Filter on `slotId`, the joined slot's id.
    pub slot_id: Option<LongFilter>,
    /// Filter on `vetId`, the joined vet's id.
    pub vet_id: Option<LongFilter>,
    /// Filter on `petId`, the joined pet's id.
    pub pet_id: Option<LongFilter>,
}

impl Criteria for AppointmentCriteria {
    type Entity = Appointment;

    const FIELDS: &'static [&'static str] = &["id", "apptTime", "slotId", "vetId", "petId"];

    fn build(&self, spec: &mut SpecificationBuilder) {
        spec.filter(self.id.as_ref(), "id")
            .filter(self.appt_time.as_ref(), "appt_time")
            .relation_filter(self.slot_id.as_ref(), Appointment::SLOT)
            .relation_filter(self.vet_id.as_ref(), Appointment::VET)
            .relation_filter(self.pet_id.as_ref(), Appointment::PET);
    }

    fn set_filter(
        &mut self,
        field: &str,
        op: FilterOperator,
        raw: &str,
    ) -> Result<(), ValidationError> {
        match field {
            "id" => apply_to(&mut self.id, field, op, raw),
            "apptTime" => apply_to(&mut self.appt_time, field, op, raw),
            "slotId" => apply_to(&mut self.slot_id, field, op, raw),
            "vetId" => apply_to(&mut self.vet_id, field, op, raw),
            "petId" => apply_to(&mut self.pet_id, field, op, raw),
            _ => Err(unknown_field::<Self>(field)),
        }
    }
}
