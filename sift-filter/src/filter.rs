//! Filter values and the predicate tree.
//!
//! A [`Predicate`] is a boolean condition over one column, combinable via
//! conjunction, disjunction and negation. The compiler produces a single
//! composite predicate; adapters (SQL, in-memory) walk the tree to realize
//! it. The core never renders or executes anything itself.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// A filter value that can be used in comparisons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// String value.
    String(String),
    /// List of values.
    List(Vec<FilterValue>),
}

impl FilterValue {
    /// Check if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Check if this is a list value.
    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// View the value as a string, if it is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// View the value as a list slice, if it is one.
    pub fn as_list(&self) -> Option<&[FilterValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<bool> for FilterValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for FilterValue {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<i64> for FilterValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for FilterValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for FilterValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl<T: Into<FilterValue>> From<Vec<T>> for FilterValue {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<FilterValue>> From<Option<T>> for FilterValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }
}

/// The scalar kind of a declared field.
///
/// Raw filter input arrives as text; the kind drives coercion into a
/// [`FilterValue`] and decides which comparisons make sense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    /// Text field.
    String,
    /// Integer field.
    Int,
    /// Floating-point field.
    Float,
    /// Boolean field.
    Bool,
    /// Timestamp field. Values must parse as RFC 3339 and are kept as
    /// strings; RFC 3339 order is lexicographic, so comparisons stay valid.
    DateTime,
}

impl FieldKind {
    /// Coerce one raw scalar into a typed value.
    pub fn coerce(&self, raw: &str) -> Result<FilterValue, String> {
        match self {
            Self::String => Ok(FilterValue::String(raw.to_string())),
            Self::Int => raw
                .parse::<i64>()
                .map(FilterValue::Int)
                .map_err(|_| format!("`{raw}` is not an integer")),
            Self::Float => raw
                .parse::<f64>()
                .map(FilterValue::Float)
                .map_err(|_| format!("`{raw}` is not a number")),
            Self::Bool => match raw.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(FilterValue::Bool(true)),
                "false" | "0" | "no" => Ok(FilterValue::Bool(false)),
                _ => Err(format!("`{raw}` is not a boolean")),
            },
            Self::DateTime => {
                chrono::DateTime::parse_from_rfc3339(raw)
                    .map_err(|_| format!("`{raw}` is not an RFC 3339 timestamp"))?;
                Ok(FilterValue::String(raw.to_string()))
            }
        }
    }

    /// Whether ordering comparisons (`lt`, `range`, ...) apply to this kind.
    pub fn is_orderable(&self) -> bool {
        !matches!(self, Self::Bool)
    }
}

/// A column reference inside a predicate.
///
/// Top-level fields use their bare name (`age`); fields of a joined relation
/// are qualified with the relation name (`address.city`).
pub type Column = SmolStr;

/// A boolean condition over queryable columns.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// No restriction (always true).
    None,

    /// Equality comparison.
    Eq(Column, FilterValue),
    /// Inequality comparison.
    Ne(Column, FilterValue),

    /// Less than comparison.
    Lt(Column, FilterValue),
    /// Less than or equal comparison.
    Lte(Column, FilterValue),
    /// Greater than comparison.
    Gt(Column, FilterValue),
    /// Greater than or equal comparison.
    Gte(Column, FilterValue),

    /// Membership in a finite set. An empty set matches nothing.
    In(Column, Vec<FilterValue>),
    /// Non-membership in a finite set. An empty set matches everything.
    NotIn(Column, Vec<FilterValue>),

    /// Case-sensitive substring match.
    Contains(Column, FilterValue),
    /// Case-insensitive substring match.
    IContains(Column, FilterValue),

    /// Column is null/absent.
    IsNull(Column),
    /// Column is present and non-null.
    IsNotNull(Column),

    /// Logical AND of multiple predicates.
    And(Vec<Predicate>),
    /// Logical OR of multiple predicates.
    Or(Vec<Predicate>),
    /// Logical NOT of a predicate.
    Not(Box<Predicate>),
}

impl Predicate {
    /// Create an empty predicate (matches everything).
    pub fn none() -> Self {
        Self::None
    }

    /// Check if this predicate is empty.
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Create an AND predicate, flattening out empty members.
    pub fn and(predicates: impl IntoIterator<Item = Predicate>) -> Self {
        let predicates: Vec<_> = predicates.into_iter().filter(|p| !p.is_none()).collect();
        match predicates.len() {
            0 => Self::None,
            1 => predicates.into_iter().next().unwrap(),
            _ => Self::And(predicates),
        }
    }

    /// Create an OR predicate, flattening out empty members.
    pub fn or(predicates: impl IntoIterator<Item = Predicate>) -> Self {
        let predicates: Vec<_> = predicates.into_iter().filter(|p| !p.is_none()).collect();
        match predicates.len() {
            0 => Self::None,
            1 => predicates.into_iter().next().unwrap(),
            _ => Self::Or(predicates),
        }
    }

    /// Create a NOT predicate.
    pub fn not(predicate: Predicate) -> Self {
        if predicate.is_none() {
            return Self::None;
        }
        Self::Not(Box::new(predicate))
    }

    /// Combine with another predicate using AND.
    pub fn and_then(self, other: Predicate) -> Self {
        if self.is_none() {
            return other;
        }
        if other.is_none() {
            return self;
        }
        match self {
            Self::And(mut predicates) => {
                predicates.push(other);
                Self::And(predicates)
            }
            _ => Self::And(vec![self, other]),
        }
    }

    /// Combine with another predicate using OR.
    pub fn or_else(self, other: Predicate) -> Self {
        if self.is_none() {
            return other;
        }
        if other.is_none() {
            return self;
        }
        match self {
            Self::Or(mut predicates) => {
                predicates.push(other);
                Self::Or(predicates)
            }
            _ => Self::Or(vec![self, other]),
        }
    }

    /// Number of leaf conditions in this predicate tree.
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::None => 0,
            Self::And(ps) | Self::Or(ps) => ps.iter().map(Predicate::leaf_count).sum(),
            Self::Not(p) => p.leaf_count(),
            _ => 1,
        }
    }
}

impl Default for Predicate {
    fn default() -> Self {
        Self::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_value_from() {
        assert_eq!(FilterValue::from(42i32), FilterValue::Int(42));
        assert_eq!(
            FilterValue::from("hello"),
            FilterValue::String("hello".to_string())
        );
        assert_eq!(FilterValue::from(true), FilterValue::Bool(true));
        assert_eq!(FilterValue::from(None::<i64>), FilterValue::Null);
    }

    #[test]
    fn test_filter_value_untagged_serde() {
        let value: FilterValue = serde_json::from_str(r#"[1, "a", null, true]"#).unwrap();
        assert_eq!(
            value,
            FilterValue::List(vec![
                FilterValue::Int(1),
                FilterValue::String("a".into()),
                FilterValue::Null,
                FilterValue::Bool(true),
            ])
        );
        assert_eq!(serde_json::to_string(&value).unwrap(), r#"[1,"a",null,true]"#);
    }

    #[test]
    fn test_predicate_and_flattens_none() {
        let combined = Predicate::and([
            Predicate::None,
            Predicate::Eq("name".into(), "Alice".into()),
            Predicate::None,
        ]);
        assert_eq!(combined, Predicate::Eq("name".into(), "Alice".into()));
    }

    #[test]
    fn test_predicate_and_then() {
        let p = Predicate::Eq("name".into(), "Alice".into())
            .and_then(Predicate::Gt("age".into(), FilterValue::Int(18)))
            .and_then(Predicate::None);
        match p {
            Predicate::And(parts) => assert_eq!(parts.len(), 2),
            other => panic!("expected And, got {other:?}"),
        }
    }

    #[test]
    fn test_predicate_or_else_starts_from_none() {
        let p = Predicate::None.or_else(Predicate::IsNull("street".into()));
        assert_eq!(p, Predicate::IsNull("street".into()));
    }

    #[test]
    fn test_predicate_not_of_none_is_none() {
        assert!(Predicate::not(Predicate::None).is_none());
    }

    #[test]
    fn test_leaf_count() {
        let p = Predicate::and([
            Predicate::Eq("a".into(), FilterValue::Int(1)),
            Predicate::or([
                Predicate::Contains("b".into(), "x".into()),
                Predicate::IsNull("c".into()),
            ]),
        ]);
        assert_eq!(p.leaf_count(), 3);
        assert_eq!(Predicate::None.leaf_count(), 0);
    }
}
