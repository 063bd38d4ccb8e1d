//! Per-entity criteria and their inbound encoding.
//!
//! A criteria holds one optional filter per queryable field of an entity,
//! including the foreign-key ids of its relations. It is built fresh for each
//! request, either directly or from the query-string encoding
//! `<field>.<operator>=<value>&...`:
//!
//! ```
//! use vetclinic_persistence::query::{Criteria, OwnerCriteria, StringFilter};
//!
//! let request = OwnerCriteria::parse_query("name.equals=A&page=0&size=5").unwrap();
//! assert_eq!(request.criteria.name, Some(StringFilter::new().equals("A")));
//! assert_eq!(request.pageable.size, 5);
//! ```

mod appointment;
mod owner;
mod pet;
mod slot;
mod vet;

use std::fmt::Debug;
use std::hash::Hash;

use url::form_urlencoded;

use crate::domain::Entity;
use crate::error::ValidationError;
use crate::types::{Pageable, SortOrder};

use super::filter::{FieldFilter, FilterOperator};
use super::specification::SpecificationBuilder;

pub use appointment::AppointmentCriteria;
pub use owner::OwnerCriteria;
pub use pet::PetCriteria;
pub use slot::SlotCriteria;
pub use vet::VetCriteria;

/// Query keys that carry pagination rather than filters.
pub const RESERVED_KEYS: &[&str] = &["page", "size", "sort"];

/// A set of optional filters over one entity type.
pub trait Criteria: Clone + Default + Debug + PartialEq + Eq + Hash + Send + Sync + 'static {
    /// The entity the criteria selects.
    type Entity: Entity;

    /// Field names accepted on the wire.
    const FIELDS: &'static [&'static str];

    /// Feeds every present filter to the builder.
    fn build(&self, spec: &mut SpecificationBuilder);

    /// Activates `op` on the named field from a raw wire value.
    fn set_filter(
        &mut self,
        field: &str,
        op: FilterOperator,
        raw: &str,
    ) -> Result<(), ValidationError>;

    /// Parses a query string into a criteria and page request.
    fn parse_query(query: &str) -> Result<CriteriaRequest<Self>, ValidationError> {
        parse_query(query)
    }
}

/// A parsed inbound request: filters plus pagination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CriteriaRequest<C> {
    /// Filters to apply.
    pub criteria: C,
    /// Requested page and sort.
    pub pageable: Pageable,
}

/// Parses `<field>.<operator>=<value>` pairs joined by `&`.
///
/// Keys and values are form-url-decoded. `page`, `size` and `sort` are read
/// into the [`Pageable`]; `sort` may repeat. Any other key must name a field
/// of the criteria and a known operator.
pub fn parse_query<C: Criteria>(query: &str) -> Result<CriteriaRequest<C>, ValidationError> {
    let query = query.strip_prefix('?').unwrap_or(query);
    let mut criteria = C::default();
    let mut pageable = Pageable::default();

    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        if RESERVED_KEYS.contains(&key.as_ref()) {
            read_paging(&mut pageable, &key, &value)?;
            continue;
        }

        let (field, op) = key
            .split_once('.')
            .ok_or_else(|| ValidationError::MalformedParameter {
                parameter: key.to_string(),
            })?;
        if !C::FIELDS.contains(&field) {
            return Err(unknown_field::<C>(field));
        }
        let operator = FilterOperator::parse(op).ok_or_else(|| ValidationError::InvalidFilter {
            field: field.to_string(),
            operator: op.to_string(),
            message: "unknown operator".to_string(),
        })?;
        criteria.set_filter(field, operator, &value)?;
    }

    Ok(CriteriaRequest { criteria, pageable })
}

fn read_paging(pageable: &mut Pageable, key: &str, value: &str) -> Result<(), ValidationError> {
    match key {
        "page" => pageable.page = parse_number(key, value)?,
        "size" => pageable.size = parse_number(key, value)?,
        _ => pageable.sort.push(SortOrder::parse(value)?),
    }
    Ok(())
}

fn parse_number(key: &str, value: &str) -> Result<u32, ValidationError> {
    value
        .trim()
        .parse::<u32>()
        .map_err(|_| ValidationError::InvalidPagination {
            message: format!("'{}' is not a valid {}", value, key),
        })
}

/// Applies a wire operator to an optional filter slot, creating the filter on first use.
pub(crate) fn apply_to<F: FieldFilter>(
    slot: &mut Option<F>,
    field: &str,
    op: FilterOperator,
    raw: &str,
) -> Result<(), ValidationError> {
    slot.get_or_insert_with(F::default).apply(field, op, raw)
}

pub(crate) fn unknown_field<C: Criteria>(field: &str) -> ValidationError {
    ValidationError::UnknownField {
        entity: C::Entity::NAME.to_string(),
        field: field.to_string(),
        expected: C::FIELDS.join(", "),
    }
}
