//! The operator registry.
//!
//! Maps operator suffix tokens to predicate-construction semantics. The
//! suffix table is ordered longest-first so that `__not_in` can never be
//! misread as `__in` or `__not` — the precedence is explicit rather than an
//! artifact of map iteration order.

use smol_str::SmolStr;

use crate::error::{FilterError, FilterResult};
use crate::filter::{FieldKind, FilterValue, Predicate};

/// The closed set of comparison, membership and pattern operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    /// Direct equality. The default when a field name carries no suffix.
    Eq,
    /// Inequality.
    Neq,
    /// Alias of [`Neq`](Self::Neq), kept for naming symmetry with `not_in`.
    Not,
    /// Membership in a finite set.
    In,
    /// Non-membership in a finite set.
    NotIn,
    /// Null check: `true` means absent/null, `false` means present.
    IsNull,
    /// Case-sensitive substring match.
    Contains,
    /// Case-insensitive substring match.
    IContains,
    /// Substring match against any entry of a list (OR-combined).
    LikeIn,
    /// Strictly less than.
    Lt,
    /// Less than or equal.
    Lte,
    /// Strictly greater than.
    Gt,
    /// Greater than or equal.
    Gte,
    /// Inclusive bound check: exactly two values, `low <= field <= high`.
    Range,
}

/// Suffix table consulted by the field-path parser, ordered longest-first.
///
/// Entries are the token after the `__` separator. Order matters: a
/// multi-token suffix must be matched before any shorter suffix it ends with.
pub const SUFFIXES: &[(&str, OperatorKind)] = &[
    ("icontains", OperatorKind::IContains),
    ("contains", OperatorKind::Contains),
    ("not_in", OperatorKind::NotIn),
    ("likein", OperatorKind::LikeIn),
    ("isnull", OperatorKind::IsNull),
    ("range", OperatorKind::Range),
    ("neq", OperatorKind::Neq),
    ("not", OperatorKind::Not),
    ("lte", OperatorKind::Lte),
    ("gte", OperatorKind::Gte),
    ("in", OperatorKind::In),
    ("lt", OperatorKind::Lt),
    ("gt", OperatorKind::Gt),
];

impl OperatorKind {
    /// The suffix token for this operator, or `None` for the implicit `Eq`.
    pub fn suffix(&self) -> Option<&'static str> {
        SUFFIXES
            .iter()
            .find(|(_, op)| op == self)
            .map(|(suffix, _)| *suffix)
    }

    /// Whether this operator takes a list of values.
    pub fn takes_list(&self) -> bool {
        matches!(self, Self::In | Self::NotIn | Self::LikeIn | Self::Range)
    }

    /// Whether this operator requires an orderable field kind.
    pub fn requires_orderable(&self) -> bool {
        matches!(self, Self::Lt | Self::Lte | Self::Gt | Self::Gte | Self::Range)
    }

    /// Whether this operator compares text, regardless of the field kind.
    ///
    /// Substring operators coerce their input as text even on numeric
    /// columns (`age__contains=3`), matching how databases cast for LIKE.
    pub fn is_pattern(&self) -> bool {
        matches!(self, Self::Contains | Self::IContains | Self::LikeIn)
    }

    /// Every operator, in suffix-table order plus the implicit `Eq`.
    pub fn all() -> impl Iterator<Item = OperatorKind> {
        std::iter::once(OperatorKind::Eq).chain(SUFFIXES.iter().map(|(_, op)| *op))
    }

    /// Default operator set for a field kind.
    ///
    /// Booleans only support equality, membership and null checks; every
    /// other kind admits the full operator set.
    pub fn defaults_for(kind: FieldKind) -> Vec<OperatorKind> {
        match kind {
            FieldKind::Bool => vec![
                Self::Eq,
                Self::Neq,
                Self::Not,
                Self::In,
                Self::NotIn,
                Self::IsNull,
            ],
            _ => Self::all().collect(),
        }
    }
}

impl std::fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.suffix() {
            Some(suffix) => write!(f, "{suffix}"),
            None => write!(f, "eq"),
        }
    }
}

/// Build the predicate for one constrained field.
///
/// `column` is the (possibly relation-qualified) column the predicate binds
/// to; `field` is the user-facing name used in error messages. The value has
/// already been coerced to the declared kind; this layer validates its shape
/// against the operator.
pub fn build(
    op: OperatorKind,
    column: &SmolStr,
    field: &str,
    kind: FieldKind,
    value: FilterValue,
) -> FilterResult<Predicate> {
    if op.requires_orderable() && !kind.is_orderable() {
        return Err(FilterError::operator_mismatch(
            field,
            format!("operator `{op}` is not valid on a boolean field"),
        ));
    }

    match op {
        OperatorKind::Eq => Ok(Predicate::Eq(column.clone(), scalar(field, value)?)),
        OperatorKind::Neq | OperatorKind::Not => {
            Ok(Predicate::Ne(column.clone(), scalar(field, value)?))
        }
        OperatorKind::Lt => Ok(Predicate::Lt(column.clone(), scalar(field, value)?)),
        OperatorKind::Lte => Ok(Predicate::Lte(column.clone(), scalar(field, value)?)),
        OperatorKind::Gt => Ok(Predicate::Gt(column.clone(), scalar(field, value)?)),
        OperatorKind::Gte => Ok(Predicate::Gte(column.clone(), scalar(field, value)?)),

        OperatorKind::In => Ok(Predicate::In(column.clone(), list(field, value)?)),
        OperatorKind::NotIn => Ok(Predicate::NotIn(column.clone(), list(field, value)?)),

        OperatorKind::Contains => Ok(Predicate::Contains(column.clone(), scalar(field, value)?)),
        OperatorKind::IContains => Ok(Predicate::IContains(column.clone(), scalar(field, value)?)),

        OperatorKind::LikeIn => {
            let patterns = list(field, value)?;
            Ok(Predicate::or(patterns.into_iter().map(|pattern| {
                Predicate::Contains(column.clone(), pattern)
            })))
        }

        OperatorKind::IsNull => match scalar(field, value)? {
            FilterValue::Bool(true) => Ok(Predicate::IsNull(column.clone())),
            FilterValue::Bool(false) => Ok(Predicate::IsNotNull(column.clone())),
            other => Err(FilterError::operator_mismatch(
                field,
                format!("isnull expects a boolean, got {other:?}"),
            )),
        },

        OperatorKind::Range => {
            let bounds = list(field, value)?;
            if bounds.len() != 2 {
                return Err(FilterError::operator_mismatch(
                    field,
                    format!("range expects exactly two values, got {}", bounds.len()),
                ));
            }
            let mut bounds = bounds.into_iter();
            let low = bounds.next().unwrap();
            let high = bounds.next().unwrap();
            Ok(Predicate::And(vec![
                Predicate::Gte(column.clone(), low),
                Predicate::Lte(column.clone(), high),
            ]))
        }
    }
}

fn scalar(field: &str, value: FilterValue) -> FilterResult<FilterValue> {
    if value.is_list() {
        return Err(FilterError::operator_mismatch(
            field,
            "expected a single value, got a list",
        ));
    }
    Ok(value)
}

fn list(field: &str, value: FilterValue) -> FilterResult<Vec<FilterValue>> {
    match value {
        FilterValue::List(items) => Ok(items),
        other => Err(FilterError::operator_mismatch(
            field,
            format!("expected a list of values, got {other:?}"),
        )),
    }
}
