//! Error types for filter construction and compilation.
//!
//! Every error carries a code for programmatic handling, the offending field
//! where one exists, and suggestions the boundary layer can forward to the
//! client. All errors are raised during construction or compilation — never
//! while the resulting query executes — so bad input is rejected before the
//! data source is touched.
//!
//! ```rust
//! use sift_filter::{FilterError, ErrorCode};
//!
//! let err = FilterError::unknown_field("User", "nmae");
//! assert_eq!(err.code, ErrorCode::UnknownField);
//! assert!(err.to_string().contains("nmae"));
//! ```

use std::fmt;
use thiserror::Error;

/// Result type for filter operations.
pub type FilterResult<T> = Result<T, FilterError>;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// A raw input key resolves to no declared field, nested prefix, search
    /// field or custom marker (S1001).
    UnknownField = 1001,
    /// A value's shape is incompatible with its operator (S1002).
    OperatorValueMismatch = 1002,
    /// An ordering token references a field outside the sortable allow-list
    /// (S1003).
    InvalidOrderingField = 1003,
    /// A concrete filter's own validation rule rejected a value (S1004).
    CustomValidation = 1004,
}

impl ErrorCode {
    /// Get the error code string (e.g., "S1001").
    pub fn code(&self) -> String {
        format!("S{}", *self as u16)
    }

    /// Get a short description of the error code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::UnknownField => "Unknown filter field",
            Self::OperatorValueMismatch => "Value incompatible with operator",
            Self::InvalidOrderingField => "Field is not sortable",
            Self::CustomValidation => "Custom validation failed",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Additional context for an error.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The entity the filter is bound to.
    pub entity: Option<String>,
    /// The field involved.
    pub field: Option<String>,
    /// Suggestions for fixing the error.
    pub suggestions: Vec<String>,
}

/// Errors raised while building or compiling a filter specification.
#[derive(Error, Debug)]
pub struct FilterError {
    /// The error code.
    pub code: ErrorCode,
    /// The error message.
    pub message: String,
    /// Additional context.
    pub context: ErrorContext,
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)
    }
}

impl FilterError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    /// Set the entity.
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.context.entity = Some(entity.into());
        self
    }

    /// Set the offending field.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.context.field = Some(field.into());
        self
    }

    /// Add a suggestion for fixing the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context.suggestions.push(suggestion.into());
        self
    }

    // ============== Constructor Functions ==============

    /// A raw key that resolves to nothing the schema declares.
    pub fn unknown_field(entity: impl Into<String>, field: impl Into<String>) -> Self {
        let entity = entity.into();
        let field = field.into();
        Self::new(
            ErrorCode::UnknownField,
            format!("Unknown filter field `{field}` for {entity}"),
        )
        .with_entity(entity)
        .with_field(field)
        .with_suggestion("Check the field name against the declared filter schema")
    }

    /// A value whose shape does not fit its operator.
    pub fn operator_mismatch(field: impl Into<String>, message: impl Into<String>) -> Self {
        let field = field.into();
        Self::new(
            ErrorCode::OperatorValueMismatch,
            format!("Invalid value for `{}`: {}", field, message.into()),
        )
        .with_field(field)
    }

    /// An ordering token outside the sortable allow-list. Names the allowed
    /// set so the caller can self-correct.
    pub fn invalid_ordering(field: impl Into<String>, allowed: &[&str]) -> Self {
        let field = field.into();
        Self::new(
            ErrorCode::InvalidOrderingField,
            format!("Cannot sort by `{field}`"),
        )
        .with_field(field)
        .with_suggestion(format!("You may only sort by: {}", allowed.join(", ")))
    }

    /// A concrete filter's own rule rejected a value.
    pub fn custom(field: impl Into<String>, message: impl Into<String>) -> Self {
        let field = field.into();
        Self::new(ErrorCode::CustomValidation, message.into()).with_field(field)
    }

    // ============== Error Checks ==============

    /// Check if this is an unknown-field error.
    pub fn is_unknown_field(&self) -> bool {
        self.code == ErrorCode::UnknownField
    }

    /// Check if this is an operator/value mismatch.
    pub fn is_operator_mismatch(&self) -> bool {
        self.code == ErrorCode::OperatorValueMismatch
    }

    /// Check if this is an invalid-ordering error.
    pub fn is_invalid_ordering(&self) -> bool {
        self.code == ErrorCode::InvalidOrderingField
    }

    /// Check if this is a custom-validation error.
    pub fn is_custom_validation(&self) -> bool {
        self.code == ErrorCode::CustomValidation
    }

    /// The offending field, if recorded.
    pub fn field(&self) -> Option<&str> {
        self.context.field.as_deref()
    }

    /// Display the full error with all context and suggestions.
    pub fn display_full(&self) -> String {
        let mut output = String::new();
        output.push_str(&format!("Error [{}]: {}\n", self.code.code(), self.message));

        if let Some(ref entity) = self.context.entity {
            output.push_str(&format!("  → Entity: {entity}\n"));
        }
        if let Some(ref field) = self.context.field {
            output.push_str(&format!("  → Field: {field}\n"));
        }
        if !self.context.suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for (i, suggestion) in self.context.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion));
            }
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_format() {
        assert_eq!(ErrorCode::UnknownField.code(), "S1001");
        assert_eq!(ErrorCode::CustomValidation.code(), "S1004");
    }

    #[test]
    fn test_unknown_field_error() {
        let err = FilterError::unknown_field("User", "nmae");
        assert!(err.is_unknown_field());
        assert_eq!(err.field(), Some("nmae"));
        assert_eq!(err.context.entity, Some("User".to_string()));
        assert!(!err.context.suggestions.is_empty());
    }

    #[test]
    fn test_operator_mismatch_error() {
        let err = FilterError::operator_mismatch("age__range", "expected exactly two values");
        assert!(err.is_operator_mismatch());
        assert!(err.message.contains("age__range"));
    }

    #[test]
    fn test_invalid_ordering_names_allowed_set() {
        let err = FilterError::invalid_ordering("salary", &["age", "created_at"]);
        assert!(err.is_invalid_ordering());
        let full = err.display_full();
        assert!(full.contains("age, created_at"));
    }

    #[test]
    fn test_display_full() {
        let err = FilterError::unknown_field("Sport", "speed").with_suggestion("Declare the field");
        let output = err.display_full();
        assert!(output.contains("S1001"));
        assert!(output.contains("speed"));
        assert!(output.contains("Suggestions"));
    }
}
