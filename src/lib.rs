//! # Sift
//!
//! Declarative, type-checked filtering and ordering for queryable resources.
//!
//! Sift turns raw `key → value` filter input (typically query-string
//! parameters) into a validated predicate tree, join requests and order
//! clauses, then applies them to any backend through the [`Queryable`]
//! trait. Declare a [`FilterSchema`] once, parse each request into a
//! [`FilterSpec`], compile, apply.
//!
//! This facade crate re-exports:
//!
//! - [`sift_filter`] — schema declaration, parsing, validation, compilation
//! - [`sift_sql`] — a `SELECT` renderer producing `$n`-parameterized SQL
//! - [`sift_memory`] — predicate evaluation over in-memory JSON rows
//!
//! ## Quick Start
//!
//! ```rust
//! use sift::prelude::*;
//! use sift::sql::SqlQuery;
//!
//! let schema = FilterSchema::builder("User")
//!     .field("name", FieldKind::String)
//!     .field("age", FieldKind::Int)
//!     .search_fields(["name"])
//!     .build();
//!
//! let spec = schema.parse([
//!     ("age__gte", "30"),
//!     ("name__icontains", "pra"),
//!     ("order_by", "-age"),
//! ])?;
//!
//! let mut query = SqlQuery::new("users");
//! spec.compile_into_queryable(&mut query)?;
//!
//! let (sql, params) = query.to_sql();
//! assert!(sql.starts_with("SELECT * FROM users WHERE"));
//! assert_eq!(params.len(), 2);
//! # Ok::<(), sift::FilterError>(())
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub use sift_filter::*;

/// SQL rendering adapter.
pub mod sql {
    pub use sift_sql::*;
}

/// In-memory evaluation adapter.
pub mod memory {
    pub use sift_memory::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use sift_filter::prelude::*;
    pub use sift_memory::MemoryQuery;
    pub use sift_sql::SqlQuery;
}
