//! The sink compiled filters are applied to.

use crate::filter::Predicate;
use crate::ordering::SortOrder;

/// An abstract query under construction.
///
/// The compiler only shapes the query: it hands the adapter predicates,
/// join requests and order clauses, and never executes anything. Adapters
/// decide what those mean — a SQL statement, an in-memory scan, anything
/// that can restrict and order a collection.
pub trait Queryable {
    /// Conjoin a predicate into the query's restriction.
    fn add_predicate(&mut self, predicate: Predicate);

    /// Make sure the named relation is joined.
    ///
    /// Must be idempotent: the compiler deduplicates join requests, but an
    /// adapter may still see the same relation twice across custom hooks.
    fn ensure_join(&mut self, relation: &str);

    /// Append one order clause. Clauses arrive in directive order.
    fn add_order(&mut self, field: &str, order: SortOrder);
}
