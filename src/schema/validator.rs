//! Validator pipeline
//!
//! Validators are registered per shape with the field names they apply to
//! and a phase. Each receives the shape name and the current value and
//! returns the (possibly transformed) value, or a rejection reason.
//!
//! Ordering for a field: ancestor validators before subtype validators,
//! declaration order within a shape.

use std::fmt;
use std::sync::Arc;

use super::errors::{Phase, SchemaError, SchemaResult};
use super::value::Value;

/// Validator function: `(shape name, value) -> value`
pub type ValidatorFn = Arc<dyn Fn(&str, Value) -> Result<Value, String> + Send + Sync>;

/// A validator bound to a field at a phase
#[derive(Clone)]
pub struct ValidatorEntry {
    pub name: String,
    pub phase: Phase,
    pub func: ValidatorFn,
}

impl fmt::Debug for ValidatorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorEntry")
            .field("name", &self.name)
            .field("phase", &self.phase)
            .finish()
    }
}

/// Field location used in validator errors
pub(crate) struct FieldSite<'a> {
    pub shape: &'a str,
    pub field: &'a str,
    pub path: &'a str,
}

/// Runs the entries of `phase` in order, threading the value through.
pub(crate) fn run_validators(
    entries: &[ValidatorEntry],
    phase: Phase,
    site: &FieldSite<'_>,
    mut value: Value,
) -> SchemaResult<Value> {
    for entry in entries.iter().filter(|e| e.phase == phase) {
        value = (entry.func)(site.shape, value).map_err(|reason| SchemaError::Validation {
            shape: site.shape.to_string(),
            field: site.field.to_string(),
            path: site.path.to_string(),
            phase,
            validator: entry.name.clone(),
            reason,
        })?;
    }
    Ok(value)
}

/// Rejects values outside a literal set. Null passes.
pub fn one_of(allowed: Vec<Value>) -> ValidatorFn {
    Arc::new(move |_shape: &str, value: Value| {
        if value.is_null() || allowed.contains(&value) {
            return Ok(value);
        }
        let names: Vec<String> = allowed.iter().filter_map(Value::to_key).collect();
        Err(format!(
            "{} is not one of [{}]",
            value.to_key().unwrap_or_else(|| value.type_name().to_string()),
            names.join(", ")
        ))
    })
}

/// Rejects integers below `min`. Null passes.
pub fn min_int(min: i64) -> ValidatorFn {
    Arc::new(move |_shape: &str, value: Value| match value {
        Value::Null => Ok(value),
        Value::Int(i) if i >= min => Ok(value),
        Value::Int(i) => Err(format!("{} is less than {}", i, min)),
        other => Err(format!("expected int, got {}", other.type_name())),
    })
}

/// Rejects numbers outside `[min, max]`. Null passes.
pub fn float_range(min: f64, max: f64) -> ValidatorFn {
    Arc::new(move |_shape: &str, value: Value| {
        if value.is_null() {
            return Ok(value);
        }
        match value.as_f64() {
            Some(f) if (min..=max).contains(&f) => Ok(value),
            Some(f) => Err(format!("{} is outside [{}, {}]", f, min, max)),
            None => Err(format!("expected number, got {}", value.type_name())),
        }
    })
}

/// Rejects negative numbers. Null passes.
pub fn non_negative() -> ValidatorFn {
    Arc::new(|_shape: &str, value: Value| {
        if value.is_null() {
            return Ok(value);
        }
        match value.as_f64() {
            Some(f) if f >= 0.0 => Ok(value),
            Some(_) => Err("must be non-negative".to_string()),
            None => Err(format!("expected number, got {}", value.type_name())),
        }
    })
}

/// Accepts non-empty text as a path. Null passes.
pub fn path_like() -> ValidatorFn {
    Arc::new(|_shape: &str, value: Value| {
        let verdict = match &value {
            Value::Null => Ok(()),
            Value::Text(s) if !s.trim().is_empty() => Ok(()),
            Value::Text(_) => Err("path must not be empty".to_string()),
            other => Err(format!("expected path text, got {}", other.type_name())),
        };
        verdict.map(|()| value)
    })
}
