//! Field definitions and default sources

use std::fmt;
use std::sync::Arc;

use super::errors::{SchemaError, SchemaResult};
use super::types::TypeDescriptor;
use super::value::{Mapping, Value};

/// Produces a fresh default value on every construction
pub type DefaultFactory = Arc<dyn Fn() -> Value + Send + Sync>;

/// Resolved default source of a field. At most one source exists.
#[derive(Clone, Default)]
pub enum FieldDefault {
    /// Required unless the descriptor is optional
    #[default]
    None,
    Value(Value),
    Factory(DefaultFactory),
}

impl FieldDefault {
    pub fn value(value: impl Into<Value>) -> Self {
        FieldDefault::Value(value.into())
    }

    pub fn factory<F>(factory: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        FieldDefault::Factory(Arc::new(factory))
    }

    /// Factory for an empty mapping; a nested record field defaulted this
    /// way is constructed from its own defaults.
    pub fn empty_mapping() -> Self {
        Self::factory(|| Value::Mapping(Mapping::new()))
    }

    /// Factory for an empty sequence
    pub fn empty_sequence() -> Self {
        Self::factory(|| Value::Sequence(Vec::new()))
    }

    /// Value, then factory. `None` when the field has no default.
    pub fn resolve(&self) -> Option<Value> {
        match self {
            FieldDefault::None => None,
            FieldDefault::Value(value) => Some(value.clone()),
            FieldDefault::Factory(factory) => Some(factory()),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, FieldDefault::None)
    }
}

impl fmt::Debug for FieldDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldDefault::None => f.write_str("None"),
            FieldDefault::Value(value) => f.debug_tuple("Value").field(value).finish(),
            FieldDefault::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

/// Builds a default from an optional value and an optional factory.
///
/// # Errors
///
/// `ConflictingDefaults` when both are given.
pub fn field(default: Option<Value>, default_factory: Option<DefaultFactory>) -> SchemaResult<FieldDefault> {
    match (default, default_factory) {
        (Some(_), Some(_)) => Err(SchemaError::ConflictingDefaults),
        (Some(value), None) => Ok(FieldDefault::Value(value)),
        (None, Some(factory)) => Ok(FieldDefault::Factory(factory)),
        (None, None) => Ok(FieldDefault::None),
    }
}

/// A declared field
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: String,
    pub descriptor: TypeDescriptor,
    pub default: FieldDefault,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, descriptor: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            descriptor,
            default: FieldDefault::None,
        }
    }

    pub fn with_default(mut self, default: FieldDefault) -> Self {
        self.default = default;
        self
    }

    /// Required when there is no default and the descriptor is not optional
    pub fn is_required(&self) -> bool {
        self.default.is_none() && !self.descriptor.is_optional()
    }
}
