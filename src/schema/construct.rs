//! Instance construction
//!
//! For every effective field of the shape, in declaration order:
//! 1. take the raw value, else the default value, else the default factory
//! 2. a still-absent non-optional field is a `MissingField` error
//! 3. run pre-validators (an absent optional field receives `Null`)
//! 4. coerce against the field's descriptor
//! 5. run post-validators
//! 6. store the value
//!
//! An absent optional field that pre-validators leave as `Null` is stored as
//! `Null` without coercion or post-validation. The first error aborts the
//! whole construction.

use super::coerce::{coerce, CoerceSite};
use super::errors::{Phase, SchemaError, SchemaResult};
use super::registry::{Schema, UnknownFields};
use super::validator::{run_validators, FieldSite};
use super::value::{Mapping, Value};

/// A constructed, validated and coerced value of a shape
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    shape: String,
    fields: Vec<(String, Value)>,
}

impl Instance {
    /// Name of the shape this instance was constructed for
    pub fn shape(&self) -> &str {
        &self.shape
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fields in declaration order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == field).map(|(_, v)| v)
    }

    /// Resolves a dotted path through records, mappings and sequence
    /// indices, e.g. `tasks.tasks.0.id`.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.get(segments.next()?)?;
        for segment in segments {
            current = match current {
                Value::Record(instance) => instance.get(segment)?,
                Value::Mapping(map) => map.get(segment)?,
                Value::Sequence(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    pub fn get_int(&self, field: &str) -> Option<i64> {
        self.get(field).and_then(Value::as_i64)
    }

    pub fn get_float(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(Value::as_f64)
    }

    pub fn get_bool(&self, field: &str) -> Option<bool> {
        self.get(field).and_then(Value::as_bool)
    }

    pub fn get_record(&self, field: &str) -> Option<&Instance> {
        self.get(field).and_then(Value::as_record)
    }

    pub fn get_sequence(&self, field: &str) -> Option<&[Value]> {
        self.get(field).and_then(Value::as_sequence)
    }

    pub fn get_mapping(&self, field: &str) -> Option<&Mapping> {
        self.get(field).and_then(Value::as_mapping)
    }
}

impl Schema {
    /// Constructs an instance of `shape` from a raw mapping.
    ///
    /// # Errors
    ///
    /// `UnknownShape` if `shape` is not declared, otherwise the first
    /// construction error (`MissingField`, `Validation`, `TypeCoercion`,
    /// `MappingKeyCollision`, `UnknownField`).
    pub fn parse(&self, shape: &str, raw: &Mapping) -> SchemaResult<Instance> {
        self.construct(shape, raw, "")
    }

    /// Like `parse`, for a raw value that must be a mapping.
    pub fn parse_value(&self, shape: &str, raw: &Value) -> SchemaResult<Instance> {
        match raw {
            Value::Mapping(map) => self.parse(shape, map),
            other => Err(SchemaError::TypeCoercion {
                shape: shape.to_string(),
                field: "$root".into(),
                path: "$root".into(),
                expected: "mapping".into(),
                actual: other.type_name().into(),
            }),
        }
    }

    pub(crate) fn construct(&self, shape_name: &str, raw: &Mapping, prefix: &str) -> SchemaResult<Instance> {
        let shape = self.shape(shape_name).ok_or_else(|| SchemaError::UnknownShape {
            shape: shape_name.to_string(),
            referenced_by: if prefix.is_empty() { "$root".into() } else { prefix.to_string() },
        })?;

        if shape.unknown_fields() == UnknownFields::Reject {
            if let Some(key) = raw.keys().find(|key| shape.field(key).is_none()) {
                return Err(SchemaError::UnknownField {
                    shape: shape.name().to_string(),
                    field: key.to_string(),
                    path: make_path(prefix, key),
                });
            }
        }

        let mut fields = Vec::with_capacity(shape.fields().len());
        for def in shape.fields() {
            let path = make_path(prefix, &def.name);
            let site = FieldSite {
                shape: shape.name(),
                field: &def.name,
                path: &path,
            };

            let provided = raw.get(&def.name).cloned().or_else(|| def.default.resolve());
            let absent = provided.is_none();
            if absent && !def.descriptor.is_optional() {
                return Err(SchemaError::MissingField {
                    shape: shape.name().to_string(),
                    field: def.name.clone(),
                    path,
                });
            }

            let validators = shape.validators_for(&def.name);
            let value = run_validators(validators, Phase::Pre, &site, provided.unwrap_or_default())?;

            let value = if absent && value.is_null() {
                Value::Null
            } else {
                let coerce_site = CoerceSite {
                    shape: shape.name(),
                    field: &def.name,
                };
                let coerced = coerce(self, &def.descriptor, value, &coerce_site, &path)?;
                run_validators(validators, Phase::Post, &site, coerced)?
            };

            fields.push((def.name.clone(), value));
        }

        Ok(Instance {
            shape: shape.name().to_string(),
            fields,
        })
    }
}

/// Creates a field path from prefix and field name.
pub(crate) fn make_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", prefix, field)
    }
}
