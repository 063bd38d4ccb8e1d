use crate::domain::Vet;
use crate::error::ValidationError;
use crate::query::filter::{FilterOperator, LongFilter, StringFilter};
use crate::query::specification::SpecificationBuilder;

use super::{Criteria, apply_to, unknown_field};

/// Filters over [`Vet`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct VetCriteria {
    /// Filter on `id`.
    pub id: Option<LongFilter>,
    /// Filter on `name`.
    pub name: Option<StringFilter>,
    /// Filter on `address`.
    pub address: Option<StringFilter>,
    /// Filter on `city`.
    pub city: Option<StringFilter>,
    /// Filter on `stateProvince`.
    pub state_province: Option<StringFilter>,
    /// Filter on `phone`.
    pub phone: Option<StringFilter>,
}

impl Criteria for VetCriteria {
    type Entity = Vet;

    const FIELDS: &'static [&'static str] =
        &["id", "name", "address", "city", "stateProvince", "phone"];

    fn build(&self, spec: &mut SpecificationBuilder) {
        spec.filter(self.id.as_ref(), "id")
            .filter(self.name.as_ref(), "name")
            .filter(self.address.as_ref(), "address")
            .filter(self.city.as_ref(), "city")
            .filter(self.state_province.as_ref(), "state_province")
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
            "address" => apply_to(&mut self.address, field, op, raw),
            "city" => apply_to(&mut self.city, field, op, raw),
            "stateProvince" => apply_to(&mut self.state_province, field, op, raw),
            "phone" => apply_to(&mut self.phone, field, op, raw),
            _ => Err(unknown_field::<Self>(field)),
        }
    }
}
