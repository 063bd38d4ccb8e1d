use crate::domain::Owner;
use crate::error::ValidationError;
use crate::query::filter::{FilterOperator, LongFilter, StringFilter};
use crate::query::specification::SpecificationBuilder;

use super::{Criteria, apply_to, unknown_field};

/// Filters over [`Owner`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct OwnerCriteria {
    /// Filter on `id`.
    pub id: Option<LongFilter>,
    /// Filter on `name`.
    pub name: Option<StringFilter>,
    /// Filter on `email`.
    pub email: Option<StringFilter>,
    /// Filter on `phone`.
    pub phone: Option<StringFilter>,
}

impl Criteria for OwnerCriteria {
    type Entity = Owner;

    const FIELDS: &'static [&'static str] = &["id", "name", "email", "phone"];

    fn build(&self, spec: &mut SpecificationBuilder) {
        spec.filter(self.id.as_ref(), "id")
            .filter(self.name.as_ref(), "name")
            .filter(self.email.as_ref(), "email")
            .filter(self.phone.as_ref(), "phone");
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
            "email" => apply_to(&mut self.email, field, op, raw),
            "phone" => apply_to(&mut self.phone, field, op, raw),
            _ => Err(unknown_field::<Self>(field)),
        }
    }
}
