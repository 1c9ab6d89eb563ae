//! Parsing of constrained field names.
//!
//! A raw key such as `address__city__in` splits into a nested segment
//! (`address`), a base field (`city`) and an operator (`in`). Parsing is a
//! pure function over the suffix table; whether the parts resolve to anything
//! declared is the specification layer's concern.

use smol_str::SmolStr;

use crate::operator::{OperatorKind, SUFFIXES};

/// Separator between nested prefix, base field and operator suffix.
pub const SEPARATOR: &str = "__";

/// Parsed identity of one constrained input key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    /// The base field name, stripped of nested prefix and operator suffix.
    pub base: SmolStr,
    /// The operator; `Eq` when no recognized suffix is present.
    pub operator: OperatorKind,
    /// The leading nested-filter segment, if the key carries one.
    pub nested: Option<SmolStr>,
}

impl FieldPath {
    /// Parse a raw field name.
    ///
    /// Longest-suffix-first: `country__not_in` yields `NotIn`, never `In` or
    /// `Not`. At most one operator suffix is consumed. An unrecognized
    /// suffix leaves the whole name as the base field with operator `Eq`.
    pub fn parse(name: &str) -> FieldPath {
        let (rest, operator) = split_operator(name);

        match rest.split_once(SEPARATOR) {
            Some((nested, base)) if !nested.is_empty() && !base.is_empty() => FieldPath {
                base: SmolStr::new(base),
                operator,
                nested: Some(SmolStr::new(nested)),
            },
            _ => FieldPath {
                base: SmolStr::new(rest),
                operator,
                nested: None,
            },
        }
    }
}

/// Strip at most one operator suffix off `name`, longest match first.
fn split_operator(name: &str) -> (&str, OperatorKind) {
    for (suffix, op) in SUFFIXES {
        let Some(stem) = name.strip_suffix(suffix) else {
            continue;
        };
        let Some(base) = stem.strip_suffix(SEPARATOR) else {
            continue;
        };
        if base.is_empty() {
            continue;
        }
        return (base, *op);
    }
    (name, OperatorKind::Eq)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parsed(name: &str) -> (String, OperatorKind, Option<String>) {
        let path = FieldPath::parse(name);
        (
            path.base.to_string(),
            path.operator,
            path.nested.map(|n| n.to_string()),
        )
    }

    #[test]
    fn test_bare_name_defaults_to_eq() {
        assert_eq!(parsed("name"), ("name".into(), OperatorKind::Eq, None));
    }

    #[test]
    fn test_single_suffix() {
        assert_eq!(
            parsed("age__gte"),
            ("age".into(), OperatorKind::Gte, None)
        );
        assert_eq!(
            parsed("name__icontains"),
            ("name".into(), OperatorKind::IContains, None)
        );
    }

    #[test]
    fn test_not_in_beats_in_and_not() {
        assert_eq!(
            parsed("country__not_in"),
            ("country".into(), OperatorKind::NotIn, None)
        );
        assert_eq!(
            parsed("name__not"),
            ("name".into(), OperatorKind::Not, None)
        );
        assert_eq!(parsed("name__in"), ("name".into(), OperatorKind::In, None));
    }

    #[test]
    fn test_at_most_one_suffix_consumed() {
        // Only the trailing suffix is an operator; the rest stays verbatim.
        let path = FieldPath::parse("name__in__in");
        assert_eq!(path.operator, OperatorKind::In);
        assert_eq!(path.base, "in");
        assert_eq!(path.nested.as_deref(), Some("name"));
    }

    #[test]
    fn test_unknown_suffix_is_not_an_error() {
        assert_eq!(
            parsed("name__bogus"),
            ("bogus".into(), OperatorKind::Eq, Some("name".into()))
        );
    }

    #[test]
    fn test_single_underscores_are_plain_name_characters() {
        assert_eq!(
            parsed("address_id__isnull"),
            ("address_id".into(), OperatorKind::IsNull, None)
        );
        assert_eq!(
            parsed("created_at"),
            ("created_at".into(), OperatorKind::Eq, None)
        );
    }

    #[test]
    fn test_nested_segment_split() {
        assert_eq!(
            parsed("address__city__in"),
            ("city".into(), OperatorKind::In, Some("address".into()))
        );
        assert_eq!(
            parsed("address__street__isnull"),
            ("street".into(), OperatorKind::IsNull, Some("address".into()))
        );
    }

    #[test]
    fn test_suffix_alone_is_a_field_name() {
        // A key that IS a suffix token has nothing to strip.
        assert_eq!(parsed("in"), ("in".into(), OperatorKind::Eq, None));
        assert_eq!(
            parsed("range"),
            ("range".into(), OperatorKind::Eq, None)
        );
    }
}
