//! Typed per-field filters.
//!
//! Three filter types cover the legal operator subsets:
//!
//! | Type | Operators |
//! |------|-----------|
//! | [`Filter<T>`] | `equals`, `notEquals`, `in`, `notIn`, `specified` |
//! | [`RangeFilter<T>`] | base operators plus `greaterThan`, `greaterOrEqual`, `lessThan`, `lessOrEqual` |
//! | [`StringFilter`] | base operators plus `contains` |
//!
//! An operator that does not apply to a field's type simply has no setter on
//! its filter type. Filters built from the wire go through
//! [`FieldFilter::apply`], which rejects such operators with
//! [`ValidationError::InvalidFilter`].

use std::collections::BTreeSet;
use std::fmt;
use std::hash::Hash;

use chrono::NaiveDate;
use serde_json::Value;

use crate::error::ValidationError;

use super::predicate::{SqlFragment, SqlParam, ToSqlParam};

/// Filter on a 64-bit integer field (ids and foreign keys).
pub type LongFilter = RangeFilter<i64>;

/// Filter on a calendar date field.
pub type LocalDateFilter = RangeFilter<NaiveDate>;

/// A criteria operator as spelled in the inbound encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOperator {
    /// `equals`: the field equals the value.
    Equals,
    /// `notEquals`: the field is set and differs from the value.
    NotEquals,
    /// `in`: the field is one of the values. An empty set matches nothing.
    In,
    /// `notIn`: the field is none of the values. An empty set matches everything.
    NotIn,
    /// `specified`: the field is (`true`) or is not (`false`) set.
    Specified,
    /// `greaterThan`.
    GreaterThan,
    /// `greaterOrEqual`, also spelled `greaterOrEqualThan`.
    GreaterOrEqual,
    /// `lessThan`.
    LessThan,
    /// `lessOrEqual`, also spelled `lessOrEqualThan`.
    LessOrEqual,
    /// `contains`: case-sensitive substring match.
    Contains,
}

impl FilterOperator {
    /// Parses an operator name, accepting the legacy `...Than` spellings.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "equals" => Some(FilterOperator::Equals),
            "notEquals" => Some(FilterOperator::NotEquals),
            "in" => Some(FilterOperator::In),
            "notIn" => Some(FilterOperator::NotIn),
            "specified" => Some(FilterOperator::Specified),
            "greaterThan" => Some(FilterOperator::GreaterThan),
            "greaterOrEqual" | "greaterOrEqualThan" => Some(FilterOperator::GreaterOrEqual),
            "lessThan" => Some(FilterOperator::LessThan),
            "lessOrEqual" | "lessOrEqualThan" => Some(FilterOperator::LessOrEqual),
            "contains" => Some(FilterOperator::Contains),
            _ => None,
        }
    }

    /// Canonical wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Equals => "equals",
            FilterOperator::NotEquals => "notEquals",
            FilterOperator::In => "in",
            FilterOperator::NotIn => "notIn",
            FilterOperator::Specified => "specified",
            FilterOperator::GreaterThan => "greaterThan",
            FilterOperator::GreaterOrEqual => "greaterOrEqual",
            FilterOperator::LessThan => "lessThan",
            FilterOperator::LessOrEqual => "lessOrEqual",
            FilterOperator::Contains => "contains",
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value type that can appear in a filter.
pub trait FilterValue: Clone + Ord + Hash + fmt::Debug + ToSqlParam + Send + Sync {
    /// Human readable type name used in error messages.
    const TYPE_NAME: &'static str;

    /// Parses a single wire value.
    fn parse_value(raw: &str) -> Result<Self, String>;
}

impl FilterValue for i64 {
    const TYPE_NAME: &'static str = "integer";

    fn parse_value(raw: &str) -> Result<Self, String> {
        raw.trim()
            .parse::<i64>()
            .map_err(|e| format!("'{}' is not an integer: {}", raw, e))
    }
}

impl FilterValue for String {
    const TYPE_NAME: &'static str = "text";

    fn parse_value(raw: &str) -> Result<Self, String> {
        Ok(raw.to_string())
    }
}

impl FilterValue for NaiveDate {
    const TYPE_NAME: &'static str = "date";

    fn parse_value(raw: &str) -> Result<Self, String> {
        NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .map_err(|e| format!("'{}' is not a date (yyyy-mm-dd): {}", raw, e))
    }
}

/// Behaviour shared by every filter type.
pub trait FieldFilter: Default {
    /// Activates `op` with a raw wire value.
    fn apply(&mut self, field: &str, op: FilterOperator, raw: &str) -> Result<(), ValidationError>;

    /// Translates the active operators into leaf constraints on `expr`.
    fn constraints(&self, expr: &str) -> Vec<SqlFragment>;

    /// Returns true when no operator is active.
    fn is_empty(&self) -> bool;
}

fn invalid(field: &str, op: FilterOperator, message: impl Into<String>) -> ValidationError {
    ValidationError::InvalidFilter {
        field: field.to_string(),
        operator: op.as_str().to_string(),
        message: message.into(),
    }
}

fn parse_one<T: FilterValue>(
    field: &str,
    op: FilterOperator,
    raw: &str,
) -> Result<T, ValidationError> {
    T::parse_value(raw).map_err(|m| invalid(field, op, m))
}

// An empty value is the empty set.
fn parse_set<T: FilterValue>(
    field: &str,
    op: FilterOperator,
    raw: &str,
) -> Result<BTreeSet<T>, ValidationError> {
    if raw.is_empty() {
        return Ok(BTreeSet::new());
    }
    raw.split(',')
        .map(|part| parse_one::<T>(field, op, part))
        .collect()
}

fn parse_bool(field: &str, op: FilterOperator, raw: &str) -> Result<bool, ValidationError> {
    match raw.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(invalid(
            field,
            op,
            format!("'{}' is not a boolean (true|false)", other),
        )),
    }
}

fn comparison(expr: &str, sql_op: &str, value: &impl ToSqlParam) -> SqlFragment {
    SqlFragment::with_params(
        format!("{} {} ?", expr, sql_op),
        vec![value.to_sql_param()],
    )
}

// The set is bound as one JSON array so its size is not limited by the
// engine's bound-variable cap.
fn membership<T: ToSqlParam>(expr: &str, sql_op: &str, values: &BTreeSet<T>) -> SqlFragment {
    let array: Vec<Value> = values
        .iter()
        .map(|v| match v.to_sql_param() {
            SqlParam::String(s) => Value::String(s),
            SqlParam::Integer(i) => Value::from(i),
            SqlParam::Float(f) => Value::from(f),
            SqlParam::Null => Value::Null,
        })
        .collect();
    SqlFragment::with_params(
        format!("{} {} (SELECT value FROM json_each(?))", expr, sql_op),
        vec![SqlParam::String(Value::Array(array).to_string())],
    )
}

/// Base filter: equality, set membership and null checks.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Filter<T> {
    /// Value the field must equal.
    pub equals: Option<T>,
    /// Value the field must differ from.
    pub not_equals: Option<T>,
    /// Values the field must be one of.
    pub in_values: Option<BTreeSet<T>>,
    /// Values the field must not be one of.
    pub not_in: Option<BTreeSet<T>>,
    /// Whether the field must be set.
    pub specified: Option<bool>,
}

impl<T> Default for Filter<T> {
    fn default() -> Self {
        Self {
            equals: None,
            not_equals: None,
            in_values: None,
            not_in: None,
            specified: None,
        }
    }
}

impl<T: FilterValue> Filter<T> {
    /// Creates a filter with no active operator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `equals`.
    pub fn equals(mut self, value: impl Into<T>) -> Self {
        self.equals = Some(value.into());
        self
    }

    /// Sets `notEquals`.
    pub fn not_equals(mut self, value: impl Into<T>) -> Self {
        self.not_equals = Some(value.into());
        self
    }

    /// Sets `in`.
    pub fn in_values<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<T>,
    {
        self.in_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Sets `notIn`.
    pub fn not_in<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<T>,
    {
        self.not_in = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Sets `specified`.
    pub fn specified(mut self, specified: bool) -> Self {
        self.specified = Some(specified);
        self
    }

    // Shared by the richer filters; returns false for operators it does not own.
    fn apply_base(
        &mut self,
        field: &str,
        op: FilterOperator,
        raw: &str,
    ) -> Result<bool, ValidationError> {
        match op {
            FilterOperator::Equals => self.equals = Some(parse_one(field, op, raw)?),
            FilterOperator::NotEquals => self.not_equals = Some(parse_one(field, op, raw)?),
            FilterOperator::In => self.in_values = Some(parse_set(field, op, raw)?),
            FilterOperator::NotIn => self.not_in = Some(parse_set(field, op, raw)?),
            FilterOperator::Specified => self.specified = Some(parse_bool(field, op, raw)?),
            _ => return Ok(false),
        }
        Ok(true)
    }
}

impl<T: FilterValue> FieldFilter for Filter<T> {
    fn apply(&mut self, field: &str, op: FilterOperator, raw: &str) -> Result<(), ValidationError> {
        if self.apply_base(field, op, raw)? {
            Ok(())
        } else {
            Err(invalid(
                field,
                op,
                format!("operator not supported for {} fields", T::TYPE_NAME),
            ))
        }
    }

    fn constraints(&self, expr: &str) -> Vec<SqlFragment> {
        let mut out = Vec::new();

        if let Some(v) = &self.equals {
            out.push(comparison(expr, "=", v));
        }
        if let Some(v) = &self.not_equals {
            out.push(comparison(expr, "<>", v));
        }
        if let Some(values) = &self.in_values {
            if values.is_empty() {
                out.push(SqlFragment::new("0 = 1"));
            } else {
                out.push(membership(expr, "IN", values));
            }
        }
        if let Some(values) = &self.not_in {
            if !values.is_empty() {
                out.push(membership(expr, "NOT IN", values));
            }
        }
        match self.specified {
            Some(true) => out.push(SqlFragment::new(format!("{} IS NOT NULL", expr))),
            Some(false) => out.push(SqlFragment::new(format!("{} IS NULL", expr))),
            None => {}
        }

        out
    }

    fn is_empty(&self) -> bool {
        self.equals.is_none()
            && self.not_equals.is_none()
            && self.in_values.is_none()
            && self.not_in.is_none()
            && self.specified.is_none()
    }
}

/// Filter on an orderable field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RangeFilter<T> {
    /// Equality, membership and null checks.
    pub base: Filter<T>,
    /// Exclusive lower bound.
    pub greater_than: Option<T>,
    /// Inclusive lower bound.
    pub greater_or_equal: Option<T>,
    /// Exclusive upper bound.
    pub less_than: Option<T>,
    /// Inclusive upper bound.
    pub less_or_equal: Option<T>,
}

impl<T> Default for RangeFilter<T> {
    fn default() -> Self {
        Self {
            base: Filter::default(),
            greater_than: None,
            greater_or_equal: None,
            less_than: None,
            less_or_equal: None,
        }
    }
}

impl<T: FilterValue> RangeFilter<T> {
    /// Creates a filter with no active operator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `equals`.
    pub fn equals(mut self, value: impl Into<T>) -> Self {
        self.base = self.base.equals(value);
        self
    }

    /// Sets `notEquals`.
    pub fn not_equals(mut self, value: impl Into<T>) -> Self {
        self.base = self.base.not_equals(value);
        self
    }

    /// Sets `in`.
    pub fn in_values<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<T>,
    {
        self.base = self.base.in_values(values);
        self
    }

    /// Sets `notIn`.
    pub fn not_in<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<T>,
    {
        self.base = self.base.not_in(values);
        self
    }

    /// Sets `specified`.
    pub fn specified(mut self, specified: bool) -> Self {
        self.base = self.base.specified(specified);
        self
    }

    /// Sets `greaterThan`.
    pub fn greater_than(mut self, value: impl Into<T>) -> Self {
        self.greater_than = Some(value.into());
        self
    }

    /// Sets `greaterOrEqual`.
    pub fn greater_or_equal(mut self, value: impl Into<T>) -> Self {
        self.greater_or_equal = Some(value.into());
        self
    }

    /// Sets `lessThan`.
    pub fn less_than(mut self, value: impl Into<T>) -> Self {
        self.less_than = Some(value.into());
        self
    }

    /// Sets `lessOrEqual`.
    pub fn less_or_equal(mut self, value: impl Into<T>) -> Self {
        self.less_or_equal = Some(value.into());
        self
    }
}

impl<T: FilterValue> FieldFilter for RangeFilter<T> {
    fn apply(&mut self, field: &str, op: FilterOperator, raw: &str) -> Result<(), ValidationError> {
        if self.base.apply_base(field, op, raw)? {
            return Ok(());
        }
        match op {
            FilterOperator::GreaterThan => self.greater_than = Some(parse_one(field, op, raw)?),
            FilterOperator::GreaterOrEqual => {
                self.greater_or_equal = Some(parse_one(field, op, raw)?)
            }
            FilterOperator::LessThan => self.less_than = Some(parse_one(field, op, raw)?),
            FilterOperator::LessOrEqual => self.less_or_equal = Some(parse_one(field, op, raw)?),
            _ => {
                return Err(invalid(
                    field,
                    op,
                    format!("operator not supported for {} fields", T::TYPE_NAME),
                ));
            }
        }
        Ok(())
    }

    fn constraints(&self, expr: &str) -> Vec<SqlFragment> {
        let mut out = self.base.constraints(expr);
        let bounds = [
            (&self.greater_than, ">"),
            (&self.greater_or_equal, ">="),
            (&self.less_than, "<"),
            (&self.less_or_equal, "<="),
        ];
        for (bound, sql_op) in bounds {
            if let Some(v) = bound {
                out.push(comparison(expr, sql_op, v));
            }
        }
        out
    }

    fn is_empty(&self) -> bool {
        self.base.is_empty()
            && self.greater_than.is_none()
            && self.greater_or_equal.is_none()
            && self.less_than.is_none()
            && self.less_or_equal.is_none()
    }
}

/// Filter on a text field.
///
/// `contains` is a case-sensitive substring match; `%` and `_` in the value
/// are matched literally.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct StringFilter {
    /// Equality, membership and null checks.
    pub base: Filter<String>,
    /// Substring the field must contain.
    pub contains: Option<String>,
}

impl StringFilter {
    /// Creates a filter with no active operator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `equals`.
    pub fn equals(mut self, value: impl Into<String>) -> Self {
        self.base = self.base.equals(value);
        self
    }

    /// Sets `notEquals`.
    pub fn not_equals(mut self, value: impl Into<String>) -> Self {
        self.base = self.base.not_equals(value);
        self
    }

    /// Sets `in`.
    pub fn in_values<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.base = self.base.in_values(values);
        self
    }

    /// Sets `notIn`.
    pub fn not_in<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.base = self.base.not_in(values);
        self
    }

    /// Sets `specified`.
    pub fn specified(mut self, specified: bool) -> Self {
        self.base = self.base.specified(specified);
        self
    }

    /// Sets `contains`.
    pub fn contains(mut self, value: impl Into<String>) -> Self {
        self.contains = Some(value.into());
        self
    }
}

impl FieldFilter for StringFilter {
    fn apply(&mut self, field: &str, op: FilterOperator, raw: &str) -> Result<(), ValidationError> {
        if self.base.apply_base(field, op, raw)? {
            return Ok(());
        }
        match op {
            FilterOperator::Contains => {
                self.contains = Some(raw.to_string());
                Ok(())
            }
            _ => Err(invalid(field, op, "operator not supported for text fields")),
        }
    }

    fn constraints(&self, expr: &str) -> Vec<SqlFragment> {
        let mut out = self.base.constraints(expr);
        if let Some(needle) = &self.contains {
            out.push(SqlFragment::with_params(
                format!("instr({}, ?) > 0", expr),
                vec![SqlParam::String(needle.clone())],
            ));
        }
        out
    }

    fn is_empty(&self) -> bool {
        self.base.is_empty() && self.contains.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_parse_accepts_aliases() {
        assert_eq!(
            FilterOperator::parse("greaterOrEqualThan"),
            Some(FilterOperator::GreaterOrEqual)
        );
        assert_eq!(
            FilterOperator::parse("lessOrEqualThan"),
            Some(FilterOperator::LessOrEqual)
        );
        assert_eq!(FilterOperator::parse("notIn"), Some(FilterOperator::NotIn));
        assert_eq!(FilterOperator::parse("startsWith"), None);
        assert_eq!(FilterOperator::GreaterOrEqual.to_string(), "greaterOrEqual");
    }

    #[test]
    fn test_base_constraints() {
        let f = LongFilter::new().equals(3).not_equals(4).specified(true);
        let sql: Vec<_> = f.constraints("pet.id").into_iter().map(|c| c.sql).collect();
        assert_eq!(sql, vec!["pet.id = ?", "pet.id <> ?", "pet.id IS NOT NULL"]);

        let f = LongFilter::new().specified(false);
        assert_eq!(f.constraints("pet.owner_id")[0].sql, "pet.owner_id IS NULL");
    }

    #[test]
    fn test_in_constraints() {
        let f = LongFilter::new().in_values([3, 1, 2]);
        let c = &f.constraints("owner.id")[0];
        assert_eq!(c.sql, "owner.id IN (SELECT value FROM json_each(?))");
        assert_eq!(c.params, vec![SqlParam::string("[1,2,3]")]);

        let f = StringFilter::new().not_in(["b\"q", "a"]);
        let c = &f.constraints("vet.city")[0];
        assert_eq!(c.sql, "vet.city NOT IN (SELECT value FROM json_each(?))");
        assert_eq!(c.params, vec![SqlParam::string(r#"["a","b\"q"]"#)]);
    }

    #[test]
    fn test_empty_in_matches_nothing() {
        let f = LongFilter::new().in_values(Vec::<i64>::new());
        let c = f.constraints("owner.id");
        assert_eq!(c.len(), 1);
        assert_eq!(c[0].sql, "0 = 1");
    }

    #[test]
    fn test_empty_not_in_is_no_constraint() {
        let f = LongFilter::new().not_in(Vec::<i64>::new());
        assert!(f.constraints("owner.id").is_empty());
        assert!(!f.is_empty());
    }

    #[test]
    fn test_range_constraints() {
        let d1 = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let f = LocalDateFilter::new().greater_or_equal(d1).less_than(d2);
        let c = f.constraints("appointment.appt_time");
        assert_eq!(c[0].sql, "appointment.appt_time >= ?");
        assert_eq!(c[0].params, vec![SqlParam::string("2024-01-01")]);
        assert_eq!(c[1].sql, "appointment.appt_time < ?");
    }

    #[test]
    fn test_contains_uses_instr() {
        let f = StringFilter::new().contains("50%_off");
        let c = &f.constraints("vet.name")[0];
        assert_eq!(c.sql, "instr(vet.name, ?) > 0");
        assert_eq!(c.params, vec![SqlParam::string("50%_off")]);
    }

    #[test]
    fn test_apply_from_wire() {
        let mut f = LongFilter::default();
        f.apply("id", FilterOperator::In, "5,7").unwrap();
        f.apply("id", FilterOperator::GreaterThan, "1").unwrap();
        assert_eq!(f, LongFilter::new().in_values([5, 7]).greater_than(1));

        let mut f = StringFilter::default();
        f.apply("name", FilterOperator::In, "").unwrap();
        assert_eq!(f.base.in_values, Some(BTreeSet::new()));
    }

    #[test]
    fn test_apply_rejects_illegal_operator() {
        let mut f = StringFilter::default();
        let err = f
            .apply("name", FilterOperator::GreaterThan, "A")
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidFilter { .. }));

        let mut f = LongFilter::default();
        assert!(f.apply("id", FilterOperator::Contains, "1").is_err());
    }

    #[test]
    fn test_apply_rejects_bad_values() {
        let mut f = LongFilter::default();
        assert!(f.apply("id", FilterOperator::Equals, "abc").is_err());
        assert!(f.apply("id", FilterOperator::In, "1,,2").is_err());
        assert!(f.apply("id", FilterOperator::Specified, "yes").is_err());

        let mut f = LocalDateFilter::default();
        assert!(f.apply("apptTime", FilterOperator::Equals, "01/02/2024").is_err());
        assert!(f.apply("apptTime", FilterOperator::Equals, "2024-02-01").is_ok());
    }

    #[test]
    fn test_structural_equality() {
        let a = StringFilter::new().equals("A");
        let b = StringFilter::new().equals("A");
        assert_eq!(a, b);
        assert_ne!(a, StringFilter::new().equals("B"));
        assert!(StringFilter::default().is_empty());
    }
}
