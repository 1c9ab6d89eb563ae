//! # sift-filter
//!
//! A declarative filter compiler: turns raw `key → value` filter input into
//! a composite predicate and ordering clauses over a queryable resource,
//! without hand-writing predicate logic per endpoint.
//!
//! The pipeline has three stages:
//!
//! 1. **Declare** a [`FilterSchema`] once at startup: fields, kinds,
//!    allowed operators, nested schemas for related entities, search and
//!    ordering configuration, custom-predicate hooks.
//! 2. **Parse** raw request input into a [`FilterSpec`] — eagerly
//!    validated, immutable, one per request.
//! 3. **Compile** the spec into a [`CompiledQuery`] and apply it to any
//!    [`Queryable`] adapter.
//!
//! ## Example
//!
//! ```rust
//! use sift_filter::{FieldKind, FilterSchema, Predicate, FilterValue};
//!
//! let schema = FilterSchema::builder("User")
//!     .field("name", FieldKind::String)
//!     .field("age", FieldKind::Int)
//!     .search_fields(["name"])
//!     .build();
//!
//! let spec = schema.parse([("age__gte", "30"), ("order_by", "-age")])?;
//! let compiled = spec.compile()?;
//!
//! assert_eq!(
//!     compiled.predicate,
//!     Predicate::Gte("age".into(), FilterValue::Int(30)),
//! );
//! assert_eq!(compiled.order[0].field, "age");
//! # Ok::<(), sift_filter::FilterError>(())
//! ```
//!
//! ## Field name grammar
//!
//! Raw keys follow `field[__operator]` or `prefix__field[__operator]`:
//! `age__gte`, `name__not_in`, `address__city__in`. Suffix matching is
//! longest-first, so `__not_in` is never misread as `__in`. Keys that
//! resolve to nothing declared are rejected before any query is built.
//!
//! ## Errors
//!
//! All validation happens during construction or compilation — never while
//! the resulting query runs. See [`FilterError`] and [`ErrorCode`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod compile;
pub mod error;
pub mod field_path;
pub mod filter;
pub mod logging;
pub mod operator;
pub mod ordering;
pub mod queryable;
pub mod schema;
pub mod spec;

pub use compile::{CompiledQuery, QueryState};
pub use error::{ErrorCode, FilterError, FilterResult};
pub use field_path::{FieldPath, SEPARATOR};
pub use filter::{Column, FieldKind, FilterValue, Predicate};
pub use operator::{OperatorKind, SUFFIXES};
pub use ordering::{OrderClause, OrderClauses, SortOrder};
pub use queryable::Queryable;
pub use schema::{Constants, CustomHook, FieldDecl, FieldValidator, FilterSchema, NestedDecl};
pub use spec::FilterSpec;

// Re-export smallvec: `OrderClauses` and `CompiledQuery::joins` expose it.
pub use smallvec;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::compile::{CompiledQuery, QueryState};
    pub use crate::error::{ErrorCode, FilterError, FilterResult};
    pub use crate::filter::{FieldKind, FilterValue, Predicate};
    pub use crate::operator::OperatorKind;
    pub use crate::ordering::{OrderClause, SortOrder};
    pub use crate::queryable::Queryable;
    pub use crate::schema::FilterSchema;
    pub use crate::spec::FilterSpec;
}
