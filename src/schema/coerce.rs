//! Coercion engine
//!
//! Recursively reshapes a present value into its declared descriptor.
//! Scalars and literal sets pass through untouched; containers are rebuilt
//! element by element; raw mappings under a record descriptor are
//! constructed into nested instances.
//!
//! Mapping keys arrive as text. Under an int, float or bool key descriptor
//! they are parsed and re-rendered, so `"01"` and `"1"` name the same int key
//! and collide.

use super::construct::make_path;
use super::errors::{SchemaError, SchemaResult};
use super::registry::Schema;
use super::types::{ScalarKind, TypeDescriptor};
use super::value::{Mapping, Value};

/// Field being coerced, for error reporting
pub(crate) struct CoerceSite<'a> {
    pub shape: &'a str,
    pub field: &'a str,
}

impl CoerceSite<'_> {
    fn mismatch(&self, path: &str, expected: String, actual: &Value) -> SchemaError {
        SchemaError::TypeCoercion {
            shape: self.shape.to_string(),
            field: self.field.to_string(),
            path: path.to_string(),
            expected,
            actual: match actual {
                Value::Record(instance) => format!("record<{}>", instance.shape()),
                other => other.type_name().to_string(),
            },
        }
    }
}

pub(crate) fn coerce(
    schema: &Schema,
    descriptor: &TypeDescriptor,
    value: Value,
    site: &CoerceSite<'_>,
    path: &str,
) -> SchemaResult<Value> {
    match descriptor {
        TypeDescriptor::Scalar(_) | TypeDescriptor::LiteralSet(_) => Ok(value),

        TypeDescriptor::Optional(inner) => {
            if value.is_null() {
                Ok(Value::Null)
            } else {
                coerce(schema, inner, value, site, path)
            }
        }

        TypeDescriptor::Sequence(element) => match value {
            Value::Sequence(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| coerce(schema, element, item, site, &format!("{}[{}]", path, i)))
                .collect::<SchemaResult<Vec<_>>>()
                .map(Value::Sequence),
            other => Err(site.mismatch(path, descriptor.describe(), &other)),
        },

        TypeDescriptor::Mapping { key, value: value_desc } => match value {
            Value::Mapping(map) => {
                let mut out = Mapping::with_capacity(map.len());
                for (raw_key, raw_value) in map {
                    let entry_path = make_path(path, &raw_key);
                    let key_text = coerce_key(key, raw_key, site, &entry_path)?;
                    let coerced_value = coerce(schema, value_desc, raw_value, site, &entry_path)?;
                    if out.contains_key(&key_text) {
                        return Err(SchemaError::MappingKeyCollision {
                            shape: site.shape.to_string(),
                            field: site.field.to_string(),
                            path: path.to_string(),
                            key: key_text,
                        });
                    }
                    out.insert(key_text, coerced_value);
                }
                Ok(Value::Mapping(out))
            }
            other => Err(site.mismatch(path, descriptor.describe(), &other)),
        },

        TypeDescriptor::Record(shape_name) => match value {
            Value::Record(instance)
                if schema
                    .shape(instance.shape())
                    .is_some_and(|shape| shape.is_a(shape_name)) =>
            {
                Ok(Value::Record(instance))
            }
            Value::Mapping(map) => schema.construct(shape_name, &map, path).map(Value::Record),
            other => Err(site.mismatch(path, descriptor.describe(), &other)),
        },
    }
}

/// Canonical text of a mapping key under its key descriptor
fn coerce_key(
    descriptor: &TypeDescriptor,
    raw_key: String,
    site: &CoerceSite<'_>,
    path: &str,
) -> SchemaResult<String> {
    let parsed = match descriptor {
        TypeDescriptor::Optional(inner) => return coerce_key(inner, raw_key, site, path),
        TypeDescriptor::Scalar(ScalarKind::Int) => raw_key.trim().parse::<i64>().ok().map(Value::Int),
        TypeDescriptor::Scalar(ScalarKind::Float) => raw_key.trim().parse::<f64>().ok().map(Value::Float),
        TypeDescriptor::Scalar(ScalarKind::Bool) => match raw_key.trim() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        TypeDescriptor::Scalar(_) | TypeDescriptor::LiteralSet(_) => return Ok(raw_key),
        TypeDescriptor::Sequence(_) | TypeDescriptor::Mapping { .. } | TypeDescriptor::Record(_) => None,
    };

    match parsed.as_ref().and_then(Value::to_key) {
        Some(key) => Ok(key),
        None => Err(site.mismatch(path, format!("{} key", descriptor.describe()), &Value::Text(raw_key))),
    }
}
