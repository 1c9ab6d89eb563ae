//! # sift-memory
//!
//! In-memory evaluation adapter for compiled Sift filters.
//!
//! [`MemoryQuery`] implements [`Queryable`] over a set of
//! [`serde_json::Value`] rows: the compiled predicate is evaluated directly
//! against each row, and order clauses sort the survivors. Useful for
//! testing filter schemas without a database and for filtering small
//! already-loaded collections.
//!
//! Columns qualified with a relation (`address.city`) resolve through
//! nested JSON objects, so `ensure_join` only records the relation name.
//!
//! ```rust
//! use serde_json::json;
//! use sift_filter::{FieldKind, FilterSchema};
//! use sift_memory::MemoryQuery;
//!
//! let schema = FilterSchema::builder("User")
//!     .field("name", FieldKind::String)
//!     .field("age", FieldKind::Int)
//!     .build();
//!
//! let rows = vec![
//!     json!({"name": "Mr Praline", "age": 33}),
//!     json!({"name": "Gumbys", "age": 21}),
//! ];
//!
//! let mut query = MemoryQuery::new(rows);
//! schema.parse([("age__gte", "30")])?.compile_into_queryable(&mut query)?;
//!
//! let matched = query.results();
//! assert_eq!(matched.len(), 1);
//! assert_eq!(matched[0]["name"], "Mr Praline");
//! # Ok::<(), sift_filter::FilterError>(())
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::cmp::Ordering;

use serde_json::Value;
use smol_str::SmolStr;
use tracing::trace;

use sift_filter::{FilterValue, Predicate, Queryable, SortOrder};

/// A row set with an accumulated predicate and ordering.
#[derive(Debug, Clone, Default)]
pub struct MemoryQuery {
    rows: Vec<Value>,
    predicate: Predicate,
    order: Vec<(SmolStr, SortOrder)>,
    relations: Vec<SmolStr>,
}

impl MemoryQuery {
    /// Wrap a set of JSON rows.
    pub fn new(rows: Vec<Value>) -> Self {
        Self {
            rows,
            predicate: Predicate::None,
            order: Vec::new(),
            relations: Vec::new(),
        }
    }

    /// Relations the compiler asked to join, in request order.
    pub fn relations(&self) -> &[SmolStr] {
        &self.relations
    }

    /// Evaluate the accumulated predicate and ordering, consuming the query.
    ///
    /// Rows failing the predicate are dropped; the rest are sorted by the
    /// order clauses in turn. Rows whose sort key is missing or null sort
    /// after all present values regardless of direction.
    pub fn results(self) -> Vec<Value> {
        let Self {
            rows,
            predicate,
            order,
            relations: _,
        } = self;

        let mut matched: Vec<Value> = rows
            .into_iter()
            .filter(|row| eval(&predicate, row))
            .collect();

        if !order.is_empty() {
            matched.sort_by(|a, b| {
                for (field, direction) in &order {
                    let left = lookup(a, field).filter(|v| !v.is_null());
                    let right = lookup(b, field).filter(|v| !v.is_null());
                    // Null placement is fixed; only present values reverse.
                    let ordering = match (left, right) {
                        (None, None) => Ordering::Equal,
                        (None, Some(_)) => Ordering::Greater,
                        (Some(_), None) => Ordering::Less,
                        (Some(left), Some(right)) => {
                            let ordering = compare_present(left, right);
                            match direction {
                                SortOrder::Asc => ordering,
                                SortOrder::Desc => ordering.reverse(),
                            }
                        }
                    };
                    if ordering != Ordering::Equal {
                        return ordering;
                    }
                }
                Ordering::Equal
            });
        }

        matched
    }
}

impl Queryable for MemoryQuery {
    fn add_predicate(&mut self, predicate: Predicate) {
        self.predicate = std::mem::take(&mut self.predicate).and_then(predicate);
    }

    fn ensure_join(&mut self, relation: &str) {
        if !self.relations.iter().any(|r| r == relation) {
            trace!(relation, "recording relation for nested lookup");
            self.relations.push(SmolStr::new(relation));
        }
    }

    fn add_order(&mut self, field: &str, order: SortOrder) {
        self.order.push((SmolStr::new(field), order));
    }
}

/// Resolve a possibly dotted column against a JSON row.
///
/// `age` reads `row["age"]`; `address.city` reads `row["address"]["city"]`.
/// Missing segments resolve to `None`.
fn lookup<'a>(row: &'a Value, column: &str) -> Option<&'a Value> {
    let mut current = row;
    for segment in column.split('.') {
        current = current.get(segment)?;
    }
    Some(current)
}

/// Evaluate a predicate against one row.
pub fn eval(predicate: &Predicate, row: &Value) -> bool {
    match predicate {
        Predicate::None => true,

        Predicate::Eq(col, val) => match lookup(row, col) {
            Some(v) => value_eq(v, val),
            None => val.is_null(),
        },
        // Three-valued logic, as SQL `!=` / `NOT IN` behave: a null or
        // missing value never satisfies a negative comparison.
        Predicate::Ne(col, val) => match lookup(row, col) {
            Some(v) if !v.is_null() => !value_eq(v, val),
            _ => false,
        },

        Predicate::Lt(col, val) => compare_with(row, col, val, Ordering::is_lt),
        Predicate::Lte(col, val) => compare_with(row, col, val, Ordering::is_le),
        Predicate::Gt(col, val) => compare_with(row, col, val, Ordering::is_gt),
        Predicate::Gte(col, val) => compare_with(row, col, val, Ordering::is_ge),

        Predicate::In(col, values) => match lookup(row, col) {
            Some(v) => values.iter().any(|candidate| value_eq(v, candidate)),
            None => false,
        },
        Predicate::NotIn(col, values) => match lookup(row, col) {
            Some(v) if !v.is_null() => !values.iter().any(|candidate| value_eq(v, candidate)),
            _ => false,
        },

        Predicate::Contains(col, val) => substring(row, col, val, false),
        Predicate::IContains(col, val) => substring(row, col, val, true),

        Predicate::IsNull(col) => match lookup(row, col) {
            Some(v) => v.is_null(),
            None => true,
        },
        Predicate::IsNotNull(col) => matches!(lookup(row, col), Some(v) if !v.is_null()),

        Predicate::And(predicates) => predicates.iter().all(|p| eval(p, row)),
        Predicate::Or(predicates) => predicates.iter().any(|p| eval(p, row)),
        Predicate::Not(predicate) => !eval(predicate, row),
    }
}

fn compare_with(row: &Value, col: &str, val: &FilterValue, check: fn(Ordering) -> bool) -> bool {
    let Some(actual) = lookup(row, col) else {
        return false;
    };
    match value_cmp(actual, val) {
        Some(ordering) => check(ordering),
        None => false,
    }
}

fn substring(row: &Value, col: &str, needle: &FilterValue, fold_case: bool) -> bool {
    let (Some(Value::String(haystack)), FilterValue::String(needle)) = (lookup(row, col), needle)
    else {
        return false;
    };
    if fold_case {
        haystack.to_lowercase().contains(&needle.to_lowercase())
    } else {
        haystack.contains(needle.as_str())
    }
}

/// Equality between a JSON row value and a filter value.
///
/// Numbers compare across integer and float representations.
fn value_eq(actual: &Value, expected: &FilterValue) -> bool {
    match (actual, expected) {
        (Value::Null, FilterValue::Null) => true,
        (Value::Bool(a), FilterValue::Bool(b)) => a == b,
        (Value::String(a), FilterValue::String(b)) => a == b,
        (Value::Number(_), FilterValue::Int(_) | FilterValue::Float(_)) => {
            matches!(value_cmp(actual, expected), Some(Ordering::Equal))
        }
        _ => false,
    }
}

/// Ordering between a JSON row value and a filter value, when comparable.
fn value_cmp(actual: &Value, expected: &FilterValue) -> Option<Ordering> {
    match (actual, expected) {
        (Value::Number(a), FilterValue::Int(b)) => {
            if let Some(a) = a.as_i64() {
                Some(a.cmp(b))
            } else {
                a.as_f64().and_then(|a| a.partial_cmp(&(*b as f64)))
            }
        }
        (Value::Number(a), FilterValue::Float(b)) => a.as_f64().and_then(|a| a.partial_cmp(b)),
        (Value::String(a), FilterValue::String(b)) => Some(a.as_str().cmp(b.as_str())),
        _ => None,
    }
}

/// Ordering between two present, non-null JSON values for sort purposes.
///
/// Mismatched types fall back to equal so the sort stays total.
fn compare_present(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        },
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        _ => Ordering::Equal,
    }
}
