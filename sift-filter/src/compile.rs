//! The filter compiler.
//!
//! One synchronous pass over a populated [`FilterSpec`], in declaration
//! order: scalar constraints, nested specifications (joining each relation
//! at most once), the search shortcut, custom-predicate hooks, and finally
//! the validated ordering. The output is a [`CompiledQuery`] — a single
//! composite predicate plus order clauses — applied to a
//! [`Queryable`] exactly once. The first error aborts the pass; no partial
//! query is ever produced.

use smallvec::SmallVec;
use smol_str::{SmolStr, format_smolstr};
use tracing::debug;

use crate::error::FilterResult;
use crate::filter::Predicate;
use crate::operator;
use crate::ordering::OrderClauses;
use crate::queryable::Queryable;
use crate::spec::FilterSpec;

/// The accumulating state of one compilation.
///
/// Custom-predicate hooks receive this, restrict it further and return it;
/// the compiler continues from whatever the hook hands back.
#[derive(Debug, Clone, Default)]
pub struct QueryState {
    predicate: Predicate,
    joins: SmallVec<[SmolStr; 2]>,
}

impl QueryState {
    /// The accumulated predicate.
    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    /// Relations joined so far, in first-use order.
    pub fn joins(&self) -> &[SmolStr] {
        &self.joins
    }

    /// Conjoin a predicate.
    pub fn and(mut self, predicate: Predicate) -> Self {
        self.predicate = self.predicate.and_then(predicate);
        self
    }

    /// Record a relation join. At most once per relation.
    pub fn ensure_join(mut self, relation: impl Into<SmolStr>) -> Self {
        let relation = relation.into();
        if !self.joins.contains(&relation) {
            self.joins.push(relation);
        }
        self
    }
}

/// The output of one compilation: a composite predicate, the relations it
/// needs joined, and the ordered sort clauses.
#[derive(Debug, Clone)]
pub struct CompiledQuery {
    /// The composite predicate. [`Predicate::None`] when nothing is set.
    pub predicate: Predicate,
    /// Relations to join, in first-use order, deduplicated.
    pub joins: SmallVec<[SmolStr; 2]>,
    /// Order clauses, applied after all predicates.
    pub order: OrderClauses,
}

impl CompiledQuery {
    /// Apply this compiled query to an adapter.
    ///
    /// Consumes the query: a compiled result is applied exactly once.
    pub fn apply<Q: Queryable>(self, queryable: &mut Q) {
        for relation in &self.joins {
            queryable.ensure_join(relation);
        }
        if !self.predicate.is_none() {
            queryable.add_predicate(self.predicate);
        }
        for clause in &self.order {
            queryable.add_order(&clause.field, clause.order);
        }
    }
}

impl FilterSpec {
    /// Compile this specification into a [`CompiledQuery`].
    pub fn compile(&self) -> FilterResult<CompiledQuery> {
        let mut state = QueryState::default();
        state = self.compile_into(state, None)?;

        debug!(
            entity = self.schema.entity(),
            leaves = state.predicate.leaf_count(),
            joins = state.joins.len(),
            order = self.ordering.len(),
            "filter compiled"
        );

        Ok(CompiledQuery {
            predicate: state.predicate,
            joins: state.joins,
            // Only the compiled specification's own directive is emitted;
            // nested ordering directives are validated but stay local.
            order: self.ordering.clone(),
        })
    }

    /// Compile this specification and apply it to an adapter in one step.
    pub fn compile_into_queryable<Q: Queryable>(&self, queryable: &mut Q) -> FilterResult<()> {
        self.compile()?.apply(queryable);
        Ok(())
    }

    fn compile_into(&self, mut state: QueryState, scope: Option<&str>) -> FilterResult<QueryState> {
        for constraint in &self.constraints {
            let column = qualify(scope, &constraint.field);
            let predicate = operator::build(
                constraint.op,
                &column,
                &constraint.key,
                constraint.kind,
                constraint.value.clone(),
            )?;
            state = state.and(predicate);
        }

        for nested in &self.nested {
            if nested.spec.is_empty() {
                continue;
            }
            state = state.ensure_join(nested.relation.clone());
            state = nested.spec.compile_into(state, Some(&nested.relation))?;
        }

        if let Some(query) = &self.search {
            let fields = &self.schema.constants().search_fields;
            if !fields.is_empty() {
                let expansion = Predicate::or(fields.iter().map(|field| {
                    Predicate::IContains(qualify(scope, field), query.as_str().into())
                }));
                state = state.and(expansion);
            }
        }

        for (name, value) in &self.markers {
            let Some(hook) = self.schema.hook(name) else {
                continue;
            };
            state = hook(state, value)?;
        }

        Ok(state)
    }
}

fn qualify(scope: Option<&str>, field: &SmolStr) -> SmolStr {
    match scope {
        Some(relation) => format_smolstr!("{relation}.{field}"),
        None => field.clone(),
    }
}
