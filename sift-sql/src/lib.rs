//! # sift-sql
//!
//! SQL rendering adapter for compiled Sift filters.
//!
//! [`SqlQuery`] implements [`Queryable`]: the compiler writes predicates,
//! join requests and order clauses into it, and `to_sql` renders a
//! parameterized `SELECT` statement with `$n` placeholders. Join clauses
//! are registered up front per relation; the adapter never invents join
//! conditions.
//!
//! ```rust
//! use sift_filter::{FieldKind, FilterSchema};
//! use sift_sql::SqlQuery;
//!
//! let schema = FilterSchema::builder("User")
//!     .field("name", FieldKind::String)
//!     .field("age", FieldKind::Int)
//!     .build();
//!
//! let mut query = SqlQuery::new("users");
//! schema.parse([("age__gte", "30"), ("order_by", "-age")])?
//!     .compile_into_queryable(&mut query)?;
//!
//! let (sql, params) = query.to_sql();
//! assert_eq!(sql, "SELECT * FROM users WHERE age >= $1 ORDER BY age DESC");
//! assert_eq!(params.len(), 1);
//! # Ok::<(), sift_filter::FilterError>(())
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use indexmap::IndexMap;
use smol_str::SmolStr;
use tracing::warn;

use sift_filter::{FilterValue, Predicate, Queryable, SortOrder};

/// A `SELECT` statement under construction.
#[derive(Debug, Clone)]
pub struct SqlQuery {
    table: SmolStr,
    columns: String,
    registered_joins: IndexMap<SmolStr, String>,
    applied_joins: Vec<String>,
    joined: Vec<SmolStr>,
    predicate: Predicate,
    order: Vec<(SmolStr, SortOrder)>,
}

impl SqlQuery {
    /// A `SELECT *` over the given table.
    pub fn new(table: impl Into<SmolStr>) -> Self {
        Self {
            table: table.into(),
            columns: "*".to_string(),
            registered_joins: IndexMap::new(),
            applied_joins: Vec::new(),
            joined: Vec::new(),
            predicate: Predicate::None,
            order: Vec::new(),
        }
    }

    /// Restrict the selected column list.
    pub fn with_columns(mut self, columns: impl IntoIterator<Item = impl AsRef<str>>) -> Self {
        let columns: Vec<String> = columns
            .into_iter()
            .map(|c| c.as_ref().to_string())
            .collect();
        self.columns = columns.join(", ");
        self
    }

    /// Register the join clause used when the compiler asks for `relation`.
    ///
    /// A join request for a relation with no registered clause is logged and
    /// skipped; the rendered statement never contains an incomplete join.
    ///
    /// ```rust
    /// # use sift_sql::SqlQuery;
    /// let query = SqlQuery::new("users").with_join(
    ///     "address",
    ///     "LEFT JOIN addresses AS address ON address.id = users.address_id",
    /// );
    /// ```
    pub fn with_join(mut self, relation: impl Into<SmolStr>, clause: impl Into<String>) -> Self {
        self.registered_joins.insert(relation.into(), clause.into());
        self
    }

    /// Render the statement with `$n` placeholders, returning the SQL text
    /// and the values to bind.
    pub fn to_sql(&self) -> (String, Vec<FilterValue>) {
        let mut sql = String::with_capacity(64);
        sql.push_str("SELECT ");
        sql.push_str(&self.columns);
        sql.push_str(" FROM ");
        sql.push_str(&self.table);

        for join in &self.applied_joins {
            sql.push(' ');
            sql.push_str(join);
        }

        let mut params = Vec::new();
        if !self.predicate.is_none() {
            sql.push_str(" WHERE ");
            sql.push_str(&render(&self.predicate, &mut params));
        }

        if !self.order.is_empty() {
            sql.push_str(" ORDER BY ");
            for (i, (field, order)) in self.order.iter().enumerate() {
                if i > 0 {
                    sql.push_str(", ");
                }
                sql.push_str(field);
                sql.push(' ');
                sql.push_str(order.as_sql());
            }
        }

        (sql, params)
    }
}

impl Queryable for SqlQuery {
    fn add_predicate(&mut self, predicate: Predicate) {
        self.predicate = std::mem::take(&mut self.predicate).and_then(predicate);
    }

    fn ensure_join(&mut self, relation: &str) {
        if self.joined.iter().any(|r| r == relation) {
            return;
        }
        self.joined.push(SmolStr::new(relation));
        match self.registered_joins.get(relation) {
            Some(clause) => self.applied_joins.push(clause.clone()),
            // An unregistered relation is a wiring bug in the caller; emit
            // no clause rather than SQL that cannot parse.
            None => warn!(relation, table = %self.table, "no join registered for relation"),
        }
    }

    fn add_order(&mut self, field: &str, order: SortOrder) {
        self.order.push((SmolStr::new(field), order));
    }
}

/// Render a predicate into SQL, appending bind values to `params`.
///
/// Placeholders are numbered `$1..` in append order.
pub fn render(predicate: &Predicate, params: &mut Vec<FilterValue>) -> String {
    match predicate {
        Predicate::None => "TRUE".to_string(),

        Predicate::Eq(col, val) => {
            if val.is_null() {
                format!("{col} IS NULL")
            } else {
                format!("{col} = {}", bind(params, val.clone()))
            }
        }
        Predicate::Ne(col, val) => {
            if val.is_null() {
                format!("{col} IS NOT NULL")
            } else {
                format!("{col} != {}", bind(params, val.clone()))
            }
        }

        Predicate::Lt(col, val) => format!("{col} < {}", bind(params, val.clone())),
        Predicate::Lte(col, val) => format!("{col} <= {}", bind(params, val.clone())),
        Predicate::Gt(col, val) => format!("{col} > {}", bind(params, val.clone())),
        Predicate::Gte(col, val) => format!("{col} >= {}", bind(params, val.clone())),

        Predicate::In(col, values) => {
            if values.is_empty() {
                return "FALSE".to_string();
            }
            let placeholders: Vec<_> = values
                .iter()
                .map(|v| bind(params, v.clone()))
                .collect();
            format!("{col} IN ({})", placeholders.join(", "))
        }
        Predicate::NotIn(col, values) => {
            if values.is_empty() {
                return "TRUE".to_string();
            }
            let placeholders: Vec<_> = values
                .iter()
                .map(|v| bind(params, v.clone()))
                .collect();
            format!("{col} NOT IN ({})", placeholders.join(", "))
        }

        Predicate::Contains(col, val) => {
            format!("{col} LIKE {}", bind(params, wrap_pattern(val)))
        }
        Predicate::IContains(col, val) => {
            format!("{col} ILIKE {}", bind(params, wrap_pattern(val)))
        }

        Predicate::IsNull(col) => format!("{col} IS NULL"),
        Predicate::IsNotNull(col) => format!("{col} IS NOT NULL"),

        Predicate::And(predicates) => {
            if predicates.is_empty() {
                return "TRUE".to_string();
            }
            let parts: Vec<_> = predicates.iter().map(|p| render(p, params)).collect();
            format!("({})", parts.join(" AND "))
        }
        Predicate::Or(predicates) => {
            if predicates.is_empty() {
                return "FALSE".to_string();
            }
            let parts: Vec<_> = predicates.iter().map(|p| render(p, params)).collect();
            format!("({})", parts.join(" OR "))
        }
        Predicate::Not(predicate) => {
            format!("NOT ({})", render(predicate, params))
        }
    }
}

fn bind(params: &mut Vec<FilterValue>, value: FilterValue) -> String {
    params.push(value);
    format!("${}", params.len())
}

fn wrap_pattern(value: &FilterValue) -> FilterValue {
    match value {
        FilterValue::String(s) => FilterValue::String(format!("%{s}%")),
        other => other.clone(),
    }
}
