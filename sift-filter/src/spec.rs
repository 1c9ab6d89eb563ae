//! Per-request filter specifications.
//!
//! A [`FilterSpec`] is constructed once from raw `key → value` input (the
//! shape an HTTP query string delivers), validated eagerly, and compiled
//! exactly once. Construction resolves every raw key against the schema:
//! control fields and custom markers are recognized first, nested keys are
//! stripped of their prefix and recursed, and everything else must parse to
//! a declared field with a permitted operator. The first violation aborts
//! with a typed error naming the offending key.

use indexmap::IndexMap;
use smol_str::SmolStr;
use std::sync::Arc;
use tracing::trace;

use crate::error::{FilterError, FilterResult};
use crate::field_path::{FieldPath, SEPARATOR};
use crate::filter::{FieldKind, FilterValue};
use crate::operator::OperatorKind;
use crate::ordering::{self, OrderClauses};
use crate::schema::{FieldDecl, FilterSchema};

/// One resolved, coerced constraint.
#[derive(Debug, Clone)]
pub(crate) struct Constraint {
    /// The declared base field.
    pub field: SmolStr,
    /// The full raw key, kept for error reporting.
    pub key: String,
    /// The field's declared kind.
    pub kind: FieldKind,
    /// The operator.
    pub op: OperatorKind,
    /// The coerced value.
    pub value: FilterValue,
}

/// A populated nested specification.
#[derive(Debug, Clone)]
pub(crate) struct NestedSpec {
    pub relation: SmolStr,
    pub spec: FilterSpec,
}

/// A validated, immutable set of constraints over one entity.
#[derive(Debug, Clone)]
pub struct FilterSpec {
    pub(crate) schema: Arc<FilterSchema>,
    pub(crate) constraints: Vec<Constraint>,
    pub(crate) nested: Vec<NestedSpec>,
    pub(crate) ordering: OrderClauses,
    pub(crate) search: Option<String>,
    pub(crate) markers: Vec<(SmolStr, FilterValue)>,
}

impl FilterSchema {
    /// Build a [`FilterSpec`] from raw key/value pairs.
    ///
    /// Repeated keys accumulate; list-shaped operators additionally split
    /// each occurrence on commas. Keys the schema does not declare fail with
    /// [`UnknownField`](crate::ErrorCode::UnknownField).
    pub fn parse<I, K, V>(self: &Arc<Self>, pairs: I) -> FilterResult<FilterSpec>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        // Group repeated keys, preserving first-seen order.
        let mut grouped: IndexMap<String, Vec<String>> = IndexMap::new();
        for (key, value) in pairs {
            grouped.entry(key.into()).or_default().push(value.into());
        }
        self.parse_grouped(grouped)
    }

    fn parse_grouped(
        self: &Arc<Self>,
        grouped: IndexMap<String, Vec<String>>,
    ) -> FilterResult<FilterSpec> {
        let constants = self.constants();
        let mut constraints: Vec<(usize, Constraint)> = Vec::new();
        let mut nested_raw: IndexMap<SmolStr, IndexMap<String, Vec<String>>> = IndexMap::new();
        let mut ordering_tokens: Option<Vec<String>> = None;
        let mut search = None;
        let mut markers = Vec::new();

        for (key, values) in grouped {
            if key == constants.ordering_field_name {
                ordering_tokens = Some(split_list(&values));
                continue;
            }
            if key == constants.search_field_name {
                search = Some(single(&key, &values)?.to_string());
                continue;
            }
            if self.has_marker(&key) {
                let value = FilterValue::String(single(&key, &values)?.to_string());
                markers.push((SmolStr::new(&key), value));
                continue;
            }
            if let Some((prefix, sub_key)) = key.split_once(SEPARATOR) {
                if self.nested_decl(prefix).is_some() {
                    nested_raw
                        .entry(SmolStr::new(prefix))
                        .or_default()
                        .insert(sub_key.to_string(), values);
                    continue;
                }
            }

            let path = FieldPath::parse(&key);
            let Some((decl_index, decl)) = self.field(&path.base) else {
                return Err(FilterError::unknown_field(self.entity(), &key));
            };
            if !decl.operators.contains(&path.operator) {
                return Err(FilterError::unknown_field(self.entity(), &key)
                    .with_suggestion(format!(
                        "`{}` accepts: {}",
                        path.base,
                        decl.operators
                            .iter()
                            .map(ToString::to_string)
                            .collect::<Vec<_>>()
                            .join(", ")
                    )));
            }

            let value = coerce(decl, path.operator, &key, &values)?;
            if let Some(validator) = &decl.validator {
                validator(&value).map_err(|message| FilterError::custom(&key, message))?;
            }

            trace!(entity = self.entity(), key = %key, op = %path.operator, "constraint accepted");
            constraints.push((
                decl_index,
                Constraint {
                    field: decl.name.clone(),
                    key,
                    kind: decl.kind,
                    op: path.operator,
                    value,
                },
            ));
        }

        // Declaration order, not raw-input order; stable within one field.
        constraints.sort_by_key(|(decl_index, _)| *decl_index);

        let mut nested = Vec::new();
        for (prefix, decl) in self.nested() {
            let raw = nested_raw.shift_remove(prefix).unwrap_or_default();
            let spec = decl
                .schema
                .parse_grouped(raw)
                .map_err(|err| prefix_field(err, prefix))?;
            nested.push(NestedSpec {
                relation: decl.relation.clone(),
                spec,
            });
        }

        let allowed = self.sortable_fields();
        let tokens = match &ordering_tokens {
            Some(tokens) => tokens.as_slice(),
            None => constants.default_ordering.as_slice(),
        };
        let ordering = ordering::validate(tokens, &allowed)?;

        Ok(FilterSpec {
            schema: Arc::clone(self),
            constraints: constraints.into_iter().map(|(_, c)| c).collect(),
            nested,
            ordering,
            search,
            markers,
        })
    }
}

impl FilterSpec {
    /// The schema this specification was built against.
    pub fn schema(&self) -> &Arc<FilterSchema> {
        &self.schema
    }

    /// The validated ordering clauses (directive, or schema default).
    pub fn ordering(&self) -> &OrderClauses {
        &self.ordering
    }

    /// The raw search value, if set.
    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    /// Number of set scalar constraints on this level.
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Whether nothing is set, including transitively through nested
    /// specifications. Ordering does not count: it never narrows results.
    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
            && self.search.is_none()
            && self.markers.is_empty()
            && self.nested.iter().all(|n| n.spec.is_empty())
    }
}

/// Coerce the raw occurrences of one key into a typed value.
fn coerce(
    decl: &FieldDecl,
    op: OperatorKind,
    key: &str,
    values: &[String],
) -> FilterResult<FilterValue> {
    let item_kind = if op.is_pattern() {
        // LIKE-style operators compare text even on numeric columns.
        FieldKind::String
    } else if op == OperatorKind::IsNull {
        FieldKind::Bool
    } else {
        decl.kind
    };

    if op.takes_list() {
        let items = split_list(values)
            .iter()
            .map(|raw| item_kind.coerce(raw))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|message| FilterError::operator_mismatch(key, message))?;
        return Ok(FilterValue::List(items));
    }

    let raw = single(key, values)?;
    item_kind
        .coerce(raw)
        .map_err(|message| FilterError::operator_mismatch(key, message))
}

/// Flatten repeated occurrences and comma-separated entries into one list.
fn split_list(values: &[String]) -> Vec<String> {
    values
        .iter()
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn single<'a>(key: &str, values: &'a [String]) -> FilterResult<&'a str> {
    match values {
        [value] => Ok(value),
        _ => Err(FilterError::operator_mismatch(
            key,
            format!("expected a single value, got {}", values.len()),
        )),
    }
}

fn prefix_field(mut err: FilterError, prefix: &str) -> FilterError {
    if let Some(field) = err.context.field.take() {
        err.context.field = Some(format!("{prefix}{SEPARATOR}{field}"));
    }
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FieldKind;

    fn address_schema() -> Arc<FilterSchema> {
        FilterSchema::builder("Address")
            .field("street", FieldKind::String)
            .field("city", FieldKind::String)
            .field("country", FieldKind::String)
            .build()
    }

    fn user_schema() -> Arc<FilterSchema> {
        FilterSchema::builder("User")
            .field("name", FieldKind::String)
            .field("age", FieldKind::Int)
            .field("created_at", FieldKind::DateTime)
            .nested("address", "address", address_schema())
            .search_fields(["name"])
            .build()
    }

    #[test]
    fn test_unset_fields_contribute_nothing() {
        let spec = user_schema().parse(Vec::<(String, String)>::new()).unwrap();
        assert!(spec.is_empty());
        assert_eq!(spec.constraint_count(), 0);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = user_schema().parse([("nmae", "Gumbys")]).unwrap_err();
        assert!(err.is_unknown_field());
        assert_eq!(err.field(), Some("nmae"));
    }

    #[test]
    fn test_unknown_suffix_treated_as_whole_name() {
        let err = user_schema().parse([("age__bogus", "3")]).unwrap_err();
        assert!(err.is_unknown_field());
    }

    #[test]
    fn test_operator_outside_allowed_set_rejected() {
        let schema = FilterSchema::builder("Sport")
            .field_with_operators("name", FieldKind::String, [OperatorKind::Eq])
            .build();
        let err = schema.parse([("name__contains", "Ten")]).unwrap_err();
        assert!(err.is_unknown_field());
        assert!(err.display_full().contains("accepts"));
    }

    #[test]
    fn test_coercion_follows_declared_kind() {
        let spec = user_schema().parse([("age__gte", "30")]).unwrap();
        assert_eq!(spec.constraints[0].value, FilterValue::Int(30));

        let err = user_schema().parse([("age__gte", "old")]).unwrap_err();
        assert!(err.is_operator_mismatch());
    }

    #[test]
    fn test_pattern_operator_coerces_text_on_int_field() {
        let spec = user_schema().parse([("age__contains", "3")]).unwrap();
        assert_eq!(spec.constraints[0].value, FilterValue::String("3".into()));
    }

    #[test]
    fn test_list_values_from_commas_and_repeats() {
        let spec = user_schema()
            .parse([("name__in", "Mr Praline, Gumbys"), ("name__in", "The colonel")])
            .unwrap();
        assert_eq!(
            spec.constraints[0].value,
            FilterValue::List(vec![
                "Mr Praline".into(),
                "Gumbys".into(),
                "The colonel".into()
            ])
        );
    }

    #[test]
    fn test_scalar_operator_rejects_repeated_key() {
        let err = user_schema()
            .parse([("name", "a"), ("name", "b")])
            .unwrap_err();
        assert!(err.is_operator_mismatch());
    }

    #[test]
    fn test_constraints_follow_declaration_order() {
        let spec = user_schema()
            .parse([("age__gte", "30"), ("name", "Gumbys"), ("age__lte", "60")])
            .unwrap();
        let keys: Vec<_> = spec.constraints.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, ["name", "age__gte", "age__lte"]);
    }

    #[test]
    fn test_nested_keys_routed_by_prefix() {
        let spec = user_schema()
            .parse([("address__city", "Nantes"), ("name", "Mr Praline")])
            .unwrap();
        let nested = &spec.nested[0];
        assert_eq!(nested.relation, "address");
        assert_eq!(nested.spec.constraint_count(), 1);
        assert_eq!(nested.spec.constraints[0].field, "city");
    }

    #[test]
    fn test_nested_error_reports_prefixed_key() {
        let err = user_schema()
            .parse([("address__zipcode", "44000")])
            .unwrap_err();
        assert!(err.is_unknown_field());
        assert_eq!(err.field(), Some("address__zipcode"));
    }

    #[test]
    fn test_empty_nested_spec_is_transitively_empty() {
        let spec = user_schema().parse([("order_by", "age")]).unwrap();
        assert!(spec.is_empty());
        assert_eq!(spec.ordering().len(), 1);
    }

    #[test]
    fn test_ordering_tokens_captured_and_validated() {
        let spec = user_schema().parse([("order_by", "-age,name")]).unwrap();
        let fields: Vec<_> = spec.ordering().iter().map(|c| c.field.as_str()).collect();
        assert_eq!(fields, ["age", "name"]);

        let err = user_schema().parse([("order_by", "salary")]).unwrap_err();
        assert!(err.is_invalid_ordering());
    }

    #[test]
    fn test_default_ordering_applies_when_directive_absent() {
        let schema = FilterSchema::builder("User")
            .field("age", FieldKind::Int)
            .default_ordering(["age"])
            .build();
        let spec = schema.parse(Vec::<(String, String)>::new()).unwrap();
        assert_eq!(spec.ordering()[0].field, "age");

        let spec = schema.parse([("order_by", "-age")]).unwrap();
        assert_eq!(spec.ordering()[0].order, crate::SortOrder::Desc);
    }

    #[test]
    fn test_custom_ordering_field_name() {
        let schema = FilterSchema::builder("Address")
            .field("city", FieldKind::String)
            .ordering_field_name("custom_order_by")
            .build();
        let spec = schema.parse([("custom_order_by", "-city")]).unwrap();
        assert_eq!(spec.ordering()[0].field, "city");

        // The default name is now an ordinary (undeclared) key.
        let err = schema.parse([("order_by", "city")]).unwrap_err();
        assert!(err.is_unknown_field());
    }

    #[test]
    fn test_custom_search_field_name() {
        let schema = FilterSchema::builder("Sport")
            .field("name", FieldKind::String)
            .search_fields(["name"])
            .search_field_name("custom_search")
            .build();
        let spec = schema.parse([("custom_search", "Ten")]).unwrap();
        assert_eq!(spec.search(), Some("Ten"));

        let err = schema.parse([("search", "Ten")]).unwrap_err();
        assert!(err.is_unknown_field());
    }

    #[test]
    fn test_restricted_ordering_names_allowed_set() {
        let schema = FilterSchema::builder("User")
            .field("name", FieldKind::String)
            .field("age", FieldKind::Int)
            .field("created_at", FieldKind::DateTime)
            .sortable_fields(["age", "created_at"])
            .build();
        let err = schema.parse([("order_by", "name")]).unwrap_err();
        assert!(err.is_invalid_ordering());
        assert!(err.display_full().contains("age, created_at"));
    }

    #[test]
    fn test_search_value_captured() {
        let spec = user_schema().parse([("search", "Mr")]).unwrap();
        assert_eq!(spec.search(), Some("Mr"));
        assert!(!spec.is_empty());
    }

    #[test]
    fn test_validator_rejection_is_custom_validation() {
        let schema = FilterSchema::builder("Sport")
            .field("name", FieldKind::String)
            .field("bogus_filter", FieldKind::String)
            .validated_by(|_| Err("You can't use this bogus filter".into()))
            .build();
        let err = schema.parse([("bogus_filter", "x")]).unwrap_err();
        assert!(err.is_custom_validation());
        assert_eq!(err.field(), Some("bogus_filter"));
        assert!(err.message.contains("bogus"));
    }

    #[test]
    fn test_isnull_value_parsed_as_bool() {
        let schema = address_schema();
        let spec = schema.parse([("street__isnull", "true")]).unwrap();
        assert_eq!(spec.constraints[0].value, FilterValue::Bool(true));

        let err = schema.parse([("street__isnull", "maybe")]).unwrap_err();
        assert!(err.is_operator_mismatch());
    }

    #[test]
    fn test_datetime_kind_requires_rfc3339() {
        let spec = user_schema()
            .parse([("created_at__gte", "2021-12-01T00:00:00Z")])
            .unwrap();
        assert_eq!(spec.constraint_count(), 1);

        let err = user_schema()
            .parse([("created_at__gte", "yesterday")])
            .unwrap_err();
        assert!(err.is_operator_mismatch());
    }
}
