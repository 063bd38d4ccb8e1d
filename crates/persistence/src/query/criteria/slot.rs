use crate::domain::Slot;
use crate::error::ValidationError;
use crate::query::filter::{FilterOperator, LongFilter, StringFilter};
use crate::query::specification::SpecificationBuilder;

use super::{Criteria, apply_to, unknown_field};

/// Filters over [`Slot`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SlotCriteria {
    /// Filter on `id`.
    pub id: Option<LongFilter>,
    /// Filter on `startTime`.
    pub start_time: Option<StringFilter>,
}

impl Criteria for SlotCriteria {
    type Entity = Slot;

    const FIELDS: &'static [&'static str] = &["id", "startTime"];

    fn build(&self, spec: &mut SpecificationBuilder) {
        spec.filter(self.id.as_ref(), "id")
            .filter(self.start_time.as_ref(), "start_time");
    }

    fn set_filter(
        &mut self,
        field: &str,
        op: FilterOperator,
        raw: &str,
    ) -> Result<(), ValidationError> {
        match field {
            "id" => apply_to(&mut self.id, field, op, raw),
            "startTime" => apply_to(&mut self.start_time, field, op, raw),
            _ => Err(unknown_field::<Self>(field)),
        }
    }
}
