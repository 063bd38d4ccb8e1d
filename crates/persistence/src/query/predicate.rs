//! Engine-ready predicates.
//!
//! A [`Predicate`] is the output of the
//! [`SpecificationBuilder`](super::SpecificationBuilder): an AND-composition of
//! leaf constraints plus the joins those constraints need. Constraints are SQL
//! fragments with positional `?` placeholders; their parameters are kept in
//! the order the placeholders appear.

use std::collections::BTreeMap;

use chrono::NaiveDate;

/// A fragment of SQL with bound parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlFragment {
    /// The SQL clause.
    pub sql: String,
    /// Bound parameter values.
    pub params: Vec<SqlParam>,
}

/// A bound SQL parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    /// String parameter.
    String(String),
    /// Integer parameter.
    Integer(i64),
    /// Float parameter.
    Float(f64),
    /// Null parameter.
    Null,
}

impl SqlParam {
    /// Creates a string parameter.
    pub fn string(s: impl Into<String>) -> Self {
        SqlParam::String(s.into())
    }

    /// Creates an integer parameter.
    pub fn integer(i: i64) -> Self {
        SqlParam::Integer(i)
    }

    /// Wraps an optional value, mapping `None` to `Null`.
    pub fn optional<T: ToSqlParam>(value: Option<&T>) -> Self {
        value.map(ToSqlParam::to_sql_param).unwrap_or(SqlParam::Null)
    }

    /// Returns the string value, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlParam::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer value, if this is an integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlParam::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns true for `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, SqlParam::Null)
    }
}

/// Conversion of filter and entity values into bound parameters.
pub trait ToSqlParam {
    /// Converts the value into a parameter.
    fn to_sql_param(&self) -> SqlParam;
}

impl ToSqlParam for i64 {
    fn to_sql_param(&self) -> SqlParam {
        SqlParam::Integer(*self)
    }
}

impl ToSqlParam for bool {
    fn to_sql_param(&self) -> SqlParam {
        SqlParam::Integer(i64::from(*self))
    }
}

impl ToSqlParam for String {
    fn to_sql_param(&self) -> SqlParam {
        SqlParam::String(self.clone())
    }
}

// ISO-8601 text sorts in date order, so range constraints compare correctly.
impl ToSqlParam for NaiveDate {
    fn to_sql_param(&self) -> SqlParam {
        SqlParam::String(self.format("%Y-%m-%d").to_string())
    }
}

impl SqlFragment {
    /// Creates a new SQL fragment.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Creates a fragment with parameters.
    pub fn with_params(sql: impl Into<String>, params: Vec<SqlParam>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// Combines with another fragment using AND.
    pub fn and(mut self, other: SqlFragment) -> Self {
        if !self.sql.is_empty() && !other.sql.is_empty() {
            self.sql = format!("({}) AND ({})", self.sql, other.sql);
        } else if !other.sql.is_empty() {
            self.sql = other.sql;
        }
        self.params.extend(other.params);
        self
    }

    /// Returns true if this fragment is empty.
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }
}

/// How a related table is joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinKind {
    /// Keeps root rows without a related row (the relation columns are NULL).
    Left,
}

impl JoinKind {
    fn as_sql(&self) -> &'static str {
        match self {
            JoinKind::Left => "LEFT JOIN",
        }
    }
}

/// A many-to-one relation from a root table to a target table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Relation {
    /// Logical relation name (e.g. `slot`).
    pub name: &'static str,
    /// Foreign-key column on the root table (e.g. `slot_id`).
    pub foreign_key: &'static str,
    /// Table the foreign key points at.
    pub target_table: &'static str,
}

/// A join registered by the specification builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    /// The relation being joined.
    pub relation: Relation,
    /// Alias of the joined table inside the query.
    pub alias: String,
    /// Join kind.
    pub kind: JoinKind,
}

impl Join {
    /// Renders the join clause against the root table.
    pub fn to_sql(&self, root: &str) -> String {
        format!(
            "{} {} AS {} ON {}.id = {}.{}",
            self.kind.as_sql(),
            self.relation.target_table,
            self.alias,
            self.alias,
            root,
            self.relation.foreign_key
        )
    }
}

/// Request-scoped registry of joins, keyed by relation name.
///
/// A relation is joined at most once per predicate no matter how many
/// constraints reference it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinRegistry {
    joins: BTreeMap<&'static str, Join>,
}

impl JoinRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The alias a relation is joined under.
    pub fn alias_for(relation: &Relation) -> String {
        format!("j_{}", relation.name)
    }

    /// Returns the alias for the relation, registering the join on first use.
    pub fn join(&mut self, relation: Relation, kind: JoinKind) -> &str {
        &self
            .joins
            .entry(relation.name)
            .or_insert_with(|| Join {
                relation,
                alias: Self::alias_for(&relation),
                kind,
            })
            .alias
    }

    /// Returns the registered join for a relation name.
    pub fn get(&self, name: &str) -> Option<&Join> {
        self.joins.get(name)
    }

    /// Number of registered joins.
    pub fn len(&self) -> usize {
        self.joins.len()
    }

    /// Returns true if no join is registered.
    pub fn is_empty(&self) -> bool {
        self.joins.is_empty()
    }

    /// Iterates the joins in relation-name order.
    pub fn iter(&self) -> impl Iterator<Item = &Join> {
        self.joins.values()
    }
}

/// The composed, engine-ready form of a criteria.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    root: &'static str,
    constraints: Vec<SqlFragment>,
    joins: JoinRegistry,
}

impl Predicate {
    pub(crate) fn new(
        root: &'static str,
        constraints: Vec<SqlFragment>,
        joins: JoinRegistry,
    ) -> Self {
        Self {
            root,
            constraints,
            joins,
        }
    }

    /// A predicate matching every row of the root table.
    pub fn match_all(root: &'static str) -> Self {
        Self::new(root, Vec::new(), JoinRegistry::new())
    }

    /// The root table the predicate applies to.
    pub fn root(&self) -> &'static str {
        self.root
    }

    /// Returns true when there is no constraint and no join.
    pub fn is_match_all(&self) -> bool {
        self.constraints.is_empty() && self.joins.is_empty()
    }

    /// The leaf constraints, in the order they were added.
    pub fn constraints(&self) -> &[SqlFragment] {
        &self.constraints
    }

    /// The joins the constraints need.
    pub fn joins(&self) -> &JoinRegistry {
        &self.joins
    }

    /// Renders the join clauses, space separated (empty if none).
    pub fn join_sql(&self) -> String {
        self.joins
            .iter()
            .map(|j| j.to_sql(self.root))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Renders the AND of all constraints, or `None` when there are none.
    pub fn where_clause(&self) -> Option<SqlFragment> {
        let mut iter = self.constraints.iter().cloned();
        let first = iter.next()?;
        Some(iter.fold(first, SqlFragment::and))
    }

    /// Renders `FROM root [joins] [WHERE ...]` and returns it with its parameters.
    pub fn from_clause(&self) -> SqlFragment {
        let mut sql = format!("FROM {}", self.root);
        let joins = self.join_sql();
        if !joins.is_empty() {
            sql.push(' ');
            sql.push_str(&joins);
        }

        match self.where_clause() {
            Some(clause) => {
                sql.push_str(" WHERE ");
                sql.push_str(&clause.sql);
                SqlFragment::with_params(sql, clause.params)
            }
            None => SqlFragment::new(sql),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SLOT: Relation = Relation {
        name: "slot",
        foreign_key: "slot_id",
        target_table: "slot",
    };

    #[test]
    fn test_fragment_and() {
        let a = SqlFragment::with_params("a = ?", vec![SqlParam::integer(1)]);
        let b = SqlFragment::with_params("b = ?", vec![SqlParam::string("x")]);
        let c = a.and(b);
        assert_eq!(c.sql, "(a = ?) AND (b = ?)");
        assert_eq!(c.params, vec![SqlParam::Integer(1), SqlParam::string("x")]);

        let empty = SqlFragment::new("").and(SqlFragment::new("b IS NULL"));
        assert_eq!(empty.sql, "b IS NULL");
    }

    #[test]
    fn test_date_param_is_iso_text() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(d.to_sql_param(), SqlParam::string("2024-03-09"));
        assert_eq!(SqlParam::optional::<i64>(None), SqlParam::Null);
    }

    #[test]
    fn test_join_registered_once() {
        let mut joins = JoinRegistry::new();
        let first = joins.join(SLOT, JoinKind::Left).to_string();
        let second = joins.join(SLOT, JoinKind::Left).to_string();
        assert_eq!(first, second);
        assert_eq!(joins.len(), 1);
        assert_eq!(
            joins.get("slot").unwrap().to_sql("appointment"),
            "LEFT JOIN slot AS j_slot ON j_slot.id = appointment.slot_id"
        );
    }

    #[test]
    fn test_match_all_from_clause() {
        let p = Predicate::match_all("owner");
        assert!(p.is_match_all());
        assert!(p.where_clause().is_none());
        assert_eq!(p.from_clause().sql, "FROM owner");
    }

    #[test]
    fn test_from_clause_with_join_and_constraints() {
        let mut joins = JoinRegistry::new();
        let alias = joins.join(SLOT, JoinKind::Left).to_string();
        let p = Predicate::new(
            "appointment",
            vec![
                SqlFragment::with_params(format!("{}.id = ?", alias), vec![SqlParam::integer(7)]),
                SqlFragment::new("appointment.vet_id IS NULL"),
            ],
            joins,
        );

        let from = p.from_clause();
        assert_eq!(
            from.sql,
            "FROM appointment LEFT JOIN slot AS j_slot ON j_slot.id = appointment.slot_id \
             WHERE (j_slot.id = ?) AND (appointment.vet_id IS NULL)"
        );
        assert_eq!(from.params, vec![SqlParam::Integer(7)]);
    }
}
