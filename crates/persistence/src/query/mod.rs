//! Criteria to query translation.
//!
//! - [`filter`] - Typed per-field filters ([`LongFilter`], [`StringFilter`], [`LocalDateFilter`])
//! - [`criteria`] - One criteria type per entity and the query-string encoding
//! - [`SpecificationBuilder`] - Turns a criteria into a [`Predicate`]
//! - [`predicate`] - SQL fragments, joins and the composed predicate
//!
//! # Example
//!
//! ```
//! use vetclinic_persistence::query::{build_predicate, AppointmentCriteria, LongFilter};
//!
//! let criteria = AppointmentCriteria {
//!     slot_id: Some(LongFilter::new().equals(7)),
//!     ..Default::default()
//! };
//! let predicate = build_predicate(&criteria);
//! assert_eq!(predicate.joins().len(), 1);
//! ```

pub mod criteria;
pub mod filter;
pub mod predicate;
mod specification;

pub use criteria::{
    AppointmentCriteria, Criteria, CriteriaRequest, OwnerCriteria, PetCriteria, SlotCriteria,
    VetCriteria, parse_query,
};
pub use filter::{
    FieldFilter, Filter, FilterOperator, FilterValue, LocalDateFilter, LongFilter, RangeFilter,
    StringFilter,
};
pub use predicate::{
    Join, JoinKind, JoinRegistry, Predicate, Relation, SqlFragment, SqlParam, ToSqlParam,
};
pub use specification::{SpecificationBuilder, build_predicate};
