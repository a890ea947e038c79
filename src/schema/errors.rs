//! Schema error types
//!
//! Construction errors (abort the current `parse` call):
//! - GAPX_SCHEMA_MISSING_FIELD
//! - GAPX_SCHEMA_VALIDATION_FAILED
//! - GAPX_SCHEMA_TYPE_COERCION
//! - GAPX_SCHEMA_KEY_COLLISION
//! - GAPX_SCHEMA_UNKNOWN_FIELD
//!
//! Declaration errors (reported by `SchemaBuilder::link`):
//! - GAPX_SCHEMA_UNKNOWN_SHAPE, GAPX_SCHEMA_UNKNOWN_PARENT,
//!   GAPX_SCHEMA_INHERITANCE_CYCLE, GAPX_SCHEMA_DUPLICATE_SHAPE,
//!   GAPX_SCHEMA_DUPLICATE_FIELD, GAPX_SCHEMA_UNKNOWN_VALIDATOR_FIELD,
//!   GAPX_SCHEMA_CONFLICTING_DEFAULTS, GAPX_SCHEMA_DEFAULT_CYCLE

use std::fmt;

use thiserror::Error;

/// Validator phase relative to coercion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Runs on the raw value, before coercion
    Pre,
    /// Runs on the coerced value, before it is stored
    Post,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Pre => "pre",
            Phase::Post => "post",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Schema declaration and construction errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("missing required field '{field}' for {shape} (at '{path}')")]
    MissingField {
        shape: String,
        field: String,
        path: String,
    },

    #[error("{phase}-validator '{validator}' rejected field '{field}' of {shape} (at '{path}'): {reason}")]
    Validation {
        shape: String,
        field: String,
        path: String,
        phase: Phase,
        validator: String,
        reason: String,
    },

    #[error("cannot coerce field '{field}' of {shape} (at '{path}'): expected {expected}, got {actual}")]
    TypeCoercion {
        shape: String,
        field: String,
        path: String,
        expected: String,
        actual: String,
    },

    #[error("mapping key '{key}' collides after coercion in field '{field}' of {shape} (at '{path}')")]
    MappingKeyCollision {
        shape: String,
        field: String,
        path: String,
        key: String,
    },

    #[error("undeclared field '{field}' for {shape} (at '{path}')")]
    UnknownField {
        shape: String,
        field: String,
        path: String,
    },

    #[error("shape '{shape}' is not declared (referenced from {referenced_by})")]
    UnknownShape { shape: String, referenced_by: String },

    #[error("shape '{shape}' extends undeclared shape '{parent}'")]
    UnknownParent { shape: String, parent: String },

    #[error("inheritance cycle through shape '{shape}'")]
    InheritanceCycle { shape: String },

    #[error("shape '{shape}' is declared more than once")]
    DuplicateShape { shape: String },

    #[error("field '{field}' is declared more than once in shape '{shape}'")]
    DuplicateField { shape: String, field: String },

    #[error("validator '{validator}' of shape '{shape}' is bound to unknown field '{field}'")]
    UnknownValidatorField {
        shape: String,
        field: String,
        validator: String,
    },

    #[error("a field default cannot have both a value and a factory")]
    ConflictingDefaults,

    #[error("defaulted nested records form a cycle through shape '{shape}' ({path})")]
    DefaultCycle { shape: String, path: String },
}

impl SchemaError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaError::MissingField { .. } => "GAPX_SCHEMA_MISSING_FIELD",
            SchemaError::Validation { .. } => "GAPX_SCHEMA_VALIDATION_FAILED",
            SchemaError::TypeCoercion { .. } => "GAPX_SCHEMA_TYPE_COERCION",
            SchemaError::MappingKeyCollision { .. } => "GAPX_SCHEMA_KEY_COLLISION",
            SchemaError::UnknownField { .. } => "GAPX_SCHEMA_UNKNOWN_FIELD",
            SchemaError::UnknownShape { .. } => "GAPX_SCHEMA_UNKNOWN_SHAPE",
            SchemaError::UnknownParent { .. } => "GAPX_SCHEMA_UNKNOWN_PARENT",
            SchemaError::InheritanceCycle { .. } => "GAPX_SCHEMA_INHERITANCE_CYCLE",
            SchemaError::DuplicateShape { .. } => "GAPX_SCHEMA_DUPLICATE_SHAPE",
            SchemaError::DuplicateField { .. } => "GAPX_SCHEMA_DUPLICATE_FIELD",
            SchemaError::UnknownValidatorField { .. } => "GAPX_SCHEMA_UNKNOWN_VALIDATOR_FIELD",
            SchemaError::ConflictingDefaults => "GAPX_SCHEMA_CONFLICTING_DEFAULTS",
            SchemaError::DefaultCycle { .. } => "GAPX_SCHEMA_DEFAULT_CYCLE",
        }
    }

    /// True for errors raised while declaring or linking shapes, as opposed
    /// to errors raised while constructing an instance.
    pub fn is_declaration_error(&self) -> bool {
        !matches!(
            self,
            SchemaError::MissingField { .. }
                | SchemaError::Validation { .. }
                | SchemaError::TypeCoercion { .. }
                | SchemaError::MappingKeyCollision { .. }
                | SchemaError::UnknownField { .. }
        )
    }

    /// Field path of a construction error
    pub fn path(&self) -> Option<&str> {
        match self {
            SchemaError::MissingField { path, .. }
            | SchemaError::Validation { path, .. }
            | SchemaError::TypeCoercion { path, .. }
            | SchemaError::MappingKeyCollision { path, .. }
            | SchemaError::UnknownField { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_names_shape_and_field() {
        let err = SchemaError::MissingField {
            shape: "RunConfig".into(),
            field: "name".into(),
            path: "run.name".into(),
        };
        let display = err.to_string();
        assert!(display.contains("RunConfig"));
        assert!(display.contains("'name'"));
        assert_eq!(err.code(), "GAPX_SCHEMA_MISSING_FIELD");
        assert_eq!(err.path(), Some("run.name"));
    }

    #[test]
    fn test_validation_error_mentions_phase_and_validator() {
        let err = SchemaError::Validation {
            shape: "InitPopulationMix".into(),
            field: "random".into(),
            path: "random".into(),
            phase: Phase::Post,
            validator: "non_negative".into(),
            reason: "must be non-negative".into(),
        };
        let display = err.to_string();
        assert!(display.starts_with("post-validator 'non_negative'"));
        assert!(display.contains("must be non-negative"));
    }

    #[test]
    fn test_declaration_classifier() {
        assert!(SchemaError::ConflictingDefaults.is_declaration_error());
        assert!(SchemaError::InheritanceCycle { shape: "A".into() }.is_declaration_error());
        let err = SchemaError::UnknownField {
            shape: "A".into(),
            field: "x".into(),
            path: "x".into(),
        };
        assert!(!err.is_declaration_error());
        assert_eq!(SchemaError::ConflictingDefaults.path(), None);
    }
}
