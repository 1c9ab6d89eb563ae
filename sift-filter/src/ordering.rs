//! Ordering directives and their validation.
//!
//! Ordering tokens use a leading-sign convention: `-age` sorts descending,
//! `+age` and `age` sort ascending. Each token must name a field in the
//! sortable allow-list; a violation reports the allowed set so the caller can
//! self-correct.

use smallvec::SmallVec;
use smol_str::SmolStr;

use crate::error::{FilterError, FilterResult};

/// Sort order for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortOrder {
    /// Ascending order (A-Z, 0-9, oldest first).
    Asc,
    /// Descending order (Z-A, 9-0, newest first).
    Desc,
}

impl SortOrder {
    /// Get the SQL keyword for this sort order.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_sql())
    }
}

impl Default for SortOrder {
    fn default() -> Self {
        Self::Asc
    }
}

/// One validated `(field, direction)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderClause {
    /// The field to order by.
    pub field: SmolStr,
    /// The sort order.
    pub order: SortOrder,
}

impl OrderClause {
    /// Create a new order clause.
    pub fn new(field: impl Into<SmolStr>, order: SortOrder) -> Self {
        Self {
            field: field.into(),
            order,
        }
    }

    /// Ascending clause.
    pub fn asc(field: impl Into<SmolStr>) -> Self {
        Self::new(field, SortOrder::Asc)
    }

    /// Descending clause.
    pub fn desc(field: impl Into<SmolStr>) -> Self {
        Self::new(field, SortOrder::Desc)
    }
}

/// An ordered list of clauses. Most directives carry one or two fields.
pub type OrderClauses = SmallVec<[OrderClause; 2]>;

/// Split one token into its field name and direction.
pub fn parse_token(token: &str) -> (&str, SortOrder) {
    match token.strip_prefix('-') {
        Some(name) => (name, SortOrder::Desc),
        None => (token.strip_prefix('+').unwrap_or(token), SortOrder::Asc),
    }
}

/// Validate a sequence of ordering tokens against the sortable allow-list.
///
/// Tokens are processed in order; the first violation aborts with an
/// [`InvalidOrderingField`](crate::ErrorCode::InvalidOrderingField) error
/// naming the allowed set.
pub fn validate(tokens: &[String], allowed: &[SmolStr]) -> FilterResult<OrderClauses> {
    let mut clauses = OrderClauses::new();
    for token in tokens {
        let (name, order) = parse_token(token);
        if name.is_empty() || !allowed.iter().any(|field| field == name) {
            let allowed: Vec<&str> = allowed.iter().map(SmolStr::as_str).collect();
            return Err(FilterError::invalid_ordering(name, &allowed));
        }
        clauses.push(OrderClause::new(name, order));
    }
    Ok(clauses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn allowed() -> Vec<SmolStr> {
        vec!["age".into(), "created_at".into(), "name".into()]
    }

    #[test]
    fn test_sign_convention() {
        assert_eq!(parse_token("-age"), ("age", SortOrder::Desc));
        assert_eq!(parse_token("+age"), ("age", SortOrder::Asc));
        assert_eq!(parse_token("age"), ("age", SortOrder::Asc));
    }

    #[test]
    fn test_validate_orders_clauses() {
        let clauses = validate(
            &["-created_at".to_string(), "age".to_string()],
            &allowed(),
        )
        .unwrap();
        assert_eq!(
            clauses.to_vec(),
            vec![OrderClause::desc("created_at"), OrderClause::asc("age")]
        );
    }

    #[test]
    fn test_unknown_field_rejected_with_allowed_set() {
        let err = validate(&["salary".to_string()], &allowed()).unwrap_err();
        assert!(err.is_invalid_ordering());
        assert_eq!(err.field(), Some("salary"));
        assert!(err.display_full().contains("age, created_at, name"));
    }

    #[test]
    fn test_bare_sign_rejected() {
        let err = validate(&["-".to_string()], &allowed()).unwrap_err();
        assert!(err.is_invalid_ordering());
    }

    #[test]
    fn test_empty_tokens_yield_no_clauses() {
        assert!(validate(&[], &allowed()).unwrap().is_empty());
    }

    #[test]
    fn test_sort_order_sql_keywords() {
        assert_eq!(SortOrder::Asc.as_sql(), "ASC");
        assert_eq!(SortOrder::Desc.as_sql(), "DESC");
    }
}
