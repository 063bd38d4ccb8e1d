use crate::domain::Pet;
use crate::error::ValidationError;
use crate::query::filter::{FilterOperator, LongFilter, StringFilter};
use crate::query::specification::SpecificationBuilder;

use super::{Criteria, apply_to, unknown_field};

/// Filters over [`Pet`]. `owner_id` filters on the joined owner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PetCriteria {
    /// Filter on `id`.
    pub id: Option<LongFilter>,
    /// Filter on `name`.
    pub name: Option<StringFilter>,
    /// Filter on `type`.
    pub kind: Option<StringFilter>,
    /// Filter on `breed`.
    pub breed: Option<StringFilter>,
    /// Filter on `ownerId`, the joined owner's id.
    pub owner_id: Option<LongFilter>,
}

impl Criteria for PetCriteria {
    type Entity = Pet;

    const FIELDS: &'static [&'static str] = &["id", "name", "type", "breed", "ownerId"];

    fn build(&self, spec: &mut SpecificationBuilder) {
        spec.filter(self.id.as_ref(), "id")
            .filter(self.name.as_ref(), "name")
            .filter(self.kind.as_ref(), "type")
            .filter(self.breed.as_ref(), "breed")
            .relation_filter(self.owner_id.as_ref(), Pet::OWNER);
    }

    fn set_filter(
        &mut self,
        field: &str,
        op: FilterOperator,
        raw: &str,
    ) -> Result<(), ValidationError> {
        match field {
            "id" => apply_to(&mut self.id, field, op, raw),
            "name" => apply_to(&mut self.name, field, op, raw),
            "type" => apply_to(&mut self.kind, field, op, raw),
            "breed" => apply_to(&mut self.breed, field, op, raw),
            "ownerId" => apply_to(&mut self.owner_id, field, op, raw),
            _ => Err(unknown_field::<Self>(field)),
        }
    }
}
