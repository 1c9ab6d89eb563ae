//! Static filter declarations.
//!
//! A [`FilterSchema`] is the explicit field table a concrete filter is built
//! from: which fields may be constrained, with which operators, which nested
//! schemas hang off which relations, and the [`Constants`] configuration
//! (search fields, ordering field name, sortable allow-list, default
//! ordering). Schemas are built once at startup and shared; per-request
//! state lives in [`FilterSpec`](crate::FilterSpec).
//!
//! Customization is composition, not inheritance: a filter that sorts by a
//! different field name is the same schema built with a different
//! `Constants` value.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::compile::QueryState;
use crate::error::FilterResult;
use crate::filter::{FieldKind, FilterValue};
use crate::operator::OperatorKind;

/// Hook invoked for a set custom-predicate marker.
///
/// Receives the accumulated query state and the marker's raw value; returns
/// the (possibly further-restricted) state the compiler continues from.
pub type CustomHook =
    Arc<dyn Fn(QueryState, &FilterValue) -> FilterResult<QueryState> + Send + Sync>;

/// Per-field validation rule. A rejection message becomes a
/// [`CustomValidation`](crate::ErrorCode::CustomValidation) error naming the
/// field.
pub type FieldValidator = Arc<dyn Fn(&FilterValue) -> Result<(), String> + Send + Sync>;

/// One declared constrainable field.
#[derive(Clone)]
pub struct FieldDecl {
    /// The field name.
    pub name: SmolStr,
    /// The scalar kind raw input is coerced to.
    pub kind: FieldKind,
    /// Operators this field accepts.
    pub operators: Vec<OperatorKind>,
    /// Optional custom validation rule.
    pub validator: Option<FieldValidator>,
}

impl fmt::Debug for FieldDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDecl")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("operators", &self.operators)
            .field("validator", &self.validator.is_some())
            .finish()
    }
}

/// A nested schema bound to a related entity.
#[derive(Debug, Clone)]
pub struct NestedDecl {
    /// The join relation name handed to the queryable adapter.
    pub relation: SmolStr,
    /// The nested schema raw sub-keys are handed to.
    pub schema: Arc<FilterSchema>,
}

/// Static configuration of a concrete filter.
#[derive(Debug, Clone)]
pub struct Constants {
    /// The entity this filter is bound to.
    pub entity: SmolStr,
    /// Name of the control field carrying ordering tokens.
    pub ordering_field_name: SmolStr,
    /// Name of the control field carrying the search value.
    pub search_field_name: SmolStr,
    /// Fields the search shortcut expands over. Empty disables the shortcut.
    pub search_fields: Vec<SmolStr>,
    /// Explicit sortable allow-list. `None` means every declared field.
    pub sortable_fields: Option<Vec<SmolStr>>,
    /// Ordering tokens used when the request carries none.
    pub default_ordering: Vec<String>,
}

impl Constants {
    /// Configuration with default control-field names.
    pub fn new(entity: impl Into<SmolStr>) -> Self {
        Self {
            entity: entity.into(),
            ordering_field_name: SmolStr::new_static("order_by"),
            search_field_name: SmolStr::new_static("search"),
            search_fields: Vec::new(),
            sortable_fields: None,
            default_ordering: Vec::new(),
        }
    }
}

/// The static declaration a concrete filter compiles against.
#[derive(Clone)]
pub struct FilterSchema {
    constants: Constants,
    fields: IndexMap<SmolStr, FieldDecl>,
    nested: IndexMap<SmolStr, NestedDecl>,
    markers: IndexMap<SmolStr, CustomHook>,
}

impl fmt::Debug for FilterSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterSchema")
            .field("constants", &self.constants)
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .field("nested", &self.nested.keys().collect::<Vec<_>>())
            .field("markers", &self.markers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl FilterSchema {
    /// Start declaring a schema for the given entity.
    pub fn builder(entity: impl Into<SmolStr>) -> FilterSchemaBuilder {
        FilterSchemaBuilder {
            constants: Constants::new(entity),
            fields: IndexMap::new(),
            nested: IndexMap::new(),
            markers: IndexMap::new(),
        }
    }

    /// The static configuration.
    pub fn constants(&self) -> &Constants {
        &self.constants
    }

    /// The entity this schema is bound to.
    pub fn entity(&self) -> &str {
        &self.constants.entity
    }

    /// Declared fields, in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDecl> {
        self.fields.values()
    }

    /// Look up a declared field with its declaration index.
    pub fn field(&self, name: &str) -> Option<(usize, &FieldDecl)> {
        self.fields.get_full(name).map(|(idx, _, decl)| (idx, decl))
    }

    /// Declared nested schemas, keyed by name prefix, in declaration order.
    pub fn nested(&self) -> impl Iterator<Item = (&SmolStr, &NestedDecl)> {
        self.nested.iter()
    }

    /// Look up a nested schema by its prefix.
    pub fn nested_decl(&self, prefix: &str) -> Option<&NestedDecl> {
        self.nested.get(prefix)
    }

    /// Whether a custom-predicate marker with this name is declared.
    pub fn has_marker(&self, name: &str) -> bool {
        self.markers.contains_key(name)
    }

    /// The hook registered for a marker.
    pub fn hook(&self, name: &str) -> Option<&CustomHook> {
        self.markers.get(name)
    }

    /// The sortable allow-list: the explicit override, or every declared
    /// field.
    pub fn sortable_fields(&self) -> Vec<SmolStr> {
        match &self.constants.sortable_fields {
            Some(fields) => fields.clone(),
            None => self.fields.keys().cloned().collect(),
        }
    }
}

/// Builder for [`FilterSchema`].
///
/// Declaration conflicts (a name reused across fields, nested prefixes and
/// markers) are programmer errors and panic at build time rather than
/// surfacing per request.
pub struct FilterSchemaBuilder {
    constants: Constants,
    fields: IndexMap<SmolStr, FieldDecl>,
    nested: IndexMap<SmolStr, NestedDecl>,
    markers: IndexMap<SmolStr, CustomHook>,
}

impl FilterSchemaBuilder {
    /// Declare a field with the default operator set for its kind.
    pub fn field(self, name: impl Into<SmolStr>, kind: FieldKind) -> Self {
        let operators = OperatorKind::defaults_for(kind);
        self.field_with_operators(name, kind, operators)
    }

    /// Declare a field restricted to an explicit operator set.
    pub fn field_with_operators(
        mut self,
        name: impl Into<SmolStr>,
        kind: FieldKind,
        operators: impl IntoIterator<Item = OperatorKind>,
    ) -> Self {
        let name = name.into();
        self.assert_fresh(&name);
        self.fields.insert(
            name.clone(),
            FieldDecl {
                name,
                kind,
                operators: operators.into_iter().collect(),
                validator: None,
            },
        );
        self
    }

    /// Attach a validation rule to the most recently declared field.
    pub fn validated_by(
        mut self,
        validator: impl Fn(&FilterValue) -> Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        let decl = self
            .fields
            .last_mut()
            .expect("validated_by requires a declared field")
            .1;
        decl.validator = Some(Arc::new(validator));
        self
    }

    /// Bind a nested schema under a name prefix, joined via `relation`.
    pub fn nested(
        mut self,
        prefix: impl Into<SmolStr>,
        relation: impl Into<SmolStr>,
        schema: Arc<FilterSchema>,
    ) -> Self {
        let prefix = prefix.into();
        self.assert_fresh(&prefix);
        self.nested.insert(
            prefix,
            NestedDecl {
                relation: relation.into(),
                schema,
            },
        );
        self
    }

    /// Declare a custom-predicate marker and register its hook.
    pub fn custom(
        mut self,
        name: impl Into<SmolStr>,
        hook: impl Fn(QueryState, &FilterValue) -> FilterResult<QueryState> + Send + Sync + 'static,
    ) -> Self {
        let name = name.into();
        self.assert_fresh(&name);
        self.markers.insert(name, Arc::new(hook));
        self
    }

    /// Set the fields the search shortcut expands over.
    pub fn search_fields(
        mut self,
        fields: impl IntoIterator<Item = impl Into<SmolStr>>,
    ) -> Self {
        self.constants.search_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Override the name of the search control field.
    pub fn search_field_name(mut self, name: impl Into<SmolStr>) -> Self {
        self.constants.search_field_name = name.into();
        self
    }

    /// Override the name of the ordering control field.
    pub fn ordering_field_name(mut self, name: impl Into<SmolStr>) -> Self {
        self.constants.ordering_field_name = name.into();
        self
    }

    /// Restrict the sortable allow-list to an explicit set.
    pub fn sortable_fields(
        mut self,
        fields: impl IntoIterator<Item = impl Into<SmolStr>>,
    ) -> Self {
        self.constants.sortable_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Ordering tokens applied when the request carries none.
    pub fn default_ordering(
        mut self,
        tokens: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.constants.default_ordering = tokens.into_iter().map(Into::into).collect();
        self
    }

    /// Finish the declaration.
    pub fn build(self) -> Arc<FilterSchema> {
        Arc::new(FilterSchema {
            constants: self.constants,
            fields: self.fields,
            nested: self.nested,
            markers: self.markers,
        })
    }

    fn assert_fresh(&self, name: &SmolStr) {
        assert!(
            !self.fields.contains_key(name)
                && !self.nested.contains_key(name)
                && !self.markers.contains_key(name),
            "duplicate filter declaration `{name}` on {}",
            self.constants.entity
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address_schema() -> Arc<FilterSchema> {
        FilterSchema::builder("Address")
            .field("street", FieldKind::String)
            .field("city", FieldKind::String)
            .field("country", FieldKind::String)
            .build()
    }

    #[test]
    fn test_declaration_order_is_preserved() {
        let schema = address_schema();
        let names: Vec<_> = schema.fields().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["street", "city", "country"]);
    }

    #[test]
    fn test_field_lookup_carries_declaration_index() {
        let schema = address_schema();
        let (idx, decl) = schema.field("country").unwrap();
        assert_eq!(idx, 2);
        assert_eq!(decl.kind, FieldKind::String);
        assert!(schema.field("zipcode").is_none());
    }

    #[test]
    fn test_sortable_defaults_to_all_declared_fields() {
        let schema = address_schema();
        assert_eq!(schema.sortable_fields(), ["street", "city", "country"]);
    }

    #[test]
    fn test_sortable_override() {
        let schema = FilterSchema::builder("User")
            .field("name", FieldKind::String)
            .field("age", FieldKind::Int)
            .sortable_fields(["age"])
            .build();
        assert_eq!(schema.sortable_fields(), ["age"]);
    }

    #[test]
    fn test_constants_default_control_fields() {
        let constants = Constants::new("User");
        assert_eq!(constants.ordering_field_name, "order_by");
        assert_eq!(constants.search_field_name, "search");
    }

    #[test]
    fn test_nested_lookup() {
        let schema = FilterSchema::builder("User")
            .field("name", FieldKind::String)
            .nested("address", "address", address_schema())
            .build();
        assert!(schema.nested_decl("address").is_some());
        assert!(schema.nested_decl("sports").is_none());
    }

    #[test]
    #[should_panic(expected = "duplicate filter declaration")]
    fn test_duplicate_declaration_panics() {
        let _ = FilterSchema::builder("User")
            .field("name", FieldKind::String)
            .field("name", FieldKind::Int);
    }

    #[test]
    fn test_validator_attaches_to_last_field() {
        let schema = FilterSchema::builder("Sport")
            .field("name", FieldKind::String)
            .field("bogus", FieldKind::String)
            .validated_by(|_| Err("You can't use this bogus filter".into()))
            .build();
        assert!(schema.field("bogus").unwrap().1.validator.is_some());
        assert!(schema.field("name").unwrap().1.validator.is_none());
    }
}
