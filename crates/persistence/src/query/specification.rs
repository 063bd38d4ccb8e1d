//! Criteria to predicate translation.

use tracing::trace;

use crate::domain::Entity;

use super::criteria::Criteria;
use super::filter::FieldFilter;
use super::predicate::{JoinKind, JoinRegistry, Predicate, Relation, SqlFragment};

/// Accumulates the constraints and joins for one criteria.
///
/// A builder lives for exactly one translation: the join registry it carries
/// is never shared between requests.
#[derive(Debug)]
pub struct SpecificationBuilder {
    root: &'static str,
    constraints: Vec<SqlFragment>,
    joins: JoinRegistry,
}

impl SpecificationBuilder {
    /// Creates a builder for the given root table.
    pub fn new(root: &'static str) -> Self {
        Self {
            root,
            constraints: Vec::new(),
            joins: JoinRegistry::new(),
        }
    }

    /// Adds the constraints of a filter on a root column. Absent filters add nothing.
    pub fn filter<F: FieldFilter>(&mut self, filter: Option<&F>, column: &str) -> &mut Self {
        if let Some(filter) = filter {
            let expr = format!("{}.{}", self.root, column);
            self.constraints.extend(filter.constraints(&expr));
        }
        self
    }

    /// Adds the constraints of a filter on a related entity's id.
    ///
    /// The relation is LEFT joined the first time one of its filters yields a
    /// constraint and reused afterwards.
    pub fn relation_filter<F: FieldFilter>(
        &mut self,
        filter: Option<&F>,
        relation: Relation,
    ) -> &mut Self {
        let Some(filter) = filter else {
            return self;
        };

        let expr = format!("{}.id", JoinRegistry::alias_for(&relation));
        let constraints = filter.constraints(&expr);
        if !constraints.is_empty() {
            self.joins.join(relation, JoinKind::Left);
            self.constraints.extend(constraints);
        }
        self
    }

    /// Finishes the translation.
    pub fn build(self) -> Predicate {
        Predicate::new(self.root, self.constraints, self.joins)
    }
}

/// Translates a criteria into its predicate.
///
/// An empty criteria yields a match-all predicate with no join.
pub fn build_predicate<C: Criteria>(criteria: &C) -> Predicate {
    let mut builder = SpecificationBuilder::new(C::Entity::TABLE);
    criteria.build(&mut builder);
    let predicate = builder.build();

    trace!(
        entity = C::Entity::NAME,
        constraints = predicate.constraints().len(),
        joins = predicate.joins().len(),
        "Built predicate"
    );

    predicate
}
