//! Schema Invariant Tests
//!
//! - Serialization reproduces the declared key set
//! - Required fields must be present
//! - Absent optionals serialize as explicit null
//! - Pre-validators see raw values, post-validators see coerced values
//! - Ancestor validators run before subtype validators
//! - Subtype defaults override ancestor defaults
//! - Nested records and sequences of records coerce recursively
//! - Serialization is idempotent
//! - Int-keyed mappings reject keys that collide once normalised
//! - Defaulted records may not default back into themselves

use std::sync::{Arc, Mutex};

use gapx::schema::{
    to_plain_data, to_text, FieldDefault, Mapping, Phase, Schema, SchemaBuilder, SchemaError, ShapeBuilder,
    TypeDescriptor as T, ValidatorFn, Value,
};
use serde_json::json;

// =============================================================================
// Helper Functions
// =============================================================================

fn raw(json: serde_json::Value) -> Mapping {
    match Value::from(json) {
        Value::Mapping(map) => map,
        other => panic!("expected mapping, got {}", other.type_name()),
    }
}

fn nested_schema() -> Schema {
    SchemaBuilder::new()
        .shape(ShapeBuilder::new("Outer").field("item", T::record("Inner")))
        .shape(ShapeBuilder::new("Outer2").field("items", T::sequence(T::record("Inner"))))
        .shape(ShapeBuilder::new("Inner").field("v", T::int()))
        .link()
        .unwrap()
}

fn run_schema() -> Schema {
    SchemaBuilder::new()
        .shape(
            ShapeBuilder::new("Run")
                .field("name", T::text())
                .field_with("seed", T::int(), FieldDefault::value(42))
                .field("note", T::optional(T::text()))
                .field_with("tags", T::sequence(T::text()), FieldDefault::empty_sequence())
                .field_with("weights", T::mapping(T::text(), T::float()), FieldDefault::empty_mapping()),
        )
        .link()
        .unwrap()
}

/// Validator that records what it saw under `label` and passes the value on
fn recorder(label: &'static str, seen: &Arc<Mutex<Vec<String>>>) -> ValidatorFn {
    let seen = Arc::clone(seen);
    Arc::new(move |_shape: &str, value: Value| {
        seen.lock().unwrap().push(format!("{}:{}", label, value.type_name()));
        Ok(value)
    })
}

// =============================================================================
// Round-Trip Tests
// =============================================================================

/// Serialization emits exactly the declared keys.
#[test]
fn test_round_trip_key_set() {
    let schema = run_schema();
    let input = json!({
        "name": "demo",
        "seed": 7,
        "note": "hello",
        "tags": ["a", "b"],
        "weights": {"task": 1.0}
    });
    let instance = schema.parse("Run", &raw(input.clone())).unwrap();

    let plain = to_plain_data(&instance);
    let keys: Vec<&str> = plain.as_mapping().unwrap().keys().collect();
    assert_eq!(keys, vec!["name", "seed", "note", "tags", "weights"]);
    assert_eq!(plain, Value::from(input));
}

/// Defaults fill in absent fields and show up in the output.
#[test]
fn test_round_trip_with_defaults() {
    let schema = run_schema();
    let instance = schema.parse("Run", &raw(json!({"name": "demo"}))).unwrap();
    assert_eq!(
        to_text(&instance).unwrap(),
        r#"{"name":"demo","seed":42,"note":null,"tags":[],"weights":{}}"#
    );
}

/// Serializing twice gives identical output.
#[test]
fn test_serialize_is_idempotent() {
    let schema = run_schema();
    let instance = schema
        .parse("Run", &raw(json!({"name": "demo", "weights": {"b": 2.0, "a": 1.0}})))
        .unwrap();
    assert_eq!(to_text(&instance).unwrap(), to_text(&instance).unwrap());
    assert_eq!(to_plain_data(&instance), to_plain_data(&instance));
}

// =============================================================================
// Required And Optional Field Tests
// =============================================================================

/// A field with no default that is not optional must be present.
#[test]
fn test_missing_required_field() {
    let schema = run_schema();
    let err = schema.parse("Run", &raw(json!({"seed": 1}))).unwrap_err();
    match err {
        SchemaError::MissingField { shape, field, path } => {
            assert_eq!(shape, "Run");
            assert_eq!(field, "name");
            assert_eq!(path, "name");
        }
        other => panic!("unexpected error: {other}"),
    }
}

/// Missing nested fields are reported with their full path.
#[test]
fn test_missing_nested_field_path() {
    let schema = nested_schema();
    let err = schema
        .parse("Outer2", &raw(json!({"items": [{"v": 1}, {}]})))
        .unwrap_err();
    assert_eq!(err.code(), "GAPX_SCHEMA_MISSING_FIELD");
    assert_eq!(err.path(), Some("items[1].v"));
}

/// An absent optional field is null and serializes as explicit null.
#[test]
fn test_absent_optional_is_null() {
    let schema = run_schema();
    let instance = schema.parse("Run", &raw(json!({"name": "demo"}))).unwrap();
    assert_eq!(instance.get("note"), Some(&Value::Null));

    let plain = to_plain_data(&instance);
    let map = plain.as_mapping().unwrap();
    assert!(map.contains_key("note"));
    assert!(map.get("note").unwrap().is_null());
}

// =============================================================================
// Validator Pipeline Tests
// =============================================================================

/// Pre-validators see the raw mapping; post-validators see the record.
#[test]
fn test_pre_sees_raw_post_sees_coerced() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let schema = SchemaBuilder::new()
        .shape(
            ShapeBuilder::new("Outer")
                .field("item", T::record("Inner"))
                .validator("before", &["item"], Phase::Pre, recorder("pre", &seen))
                .validator("after", &["item"], Phase::Post, recorder("post", &seen)),
        )
        .shape(ShapeBuilder::new("Inner").field("v", T::int()))
        .link()
        .unwrap();

    schema.parse("Outer", &raw(json!({"item": {"v": 5}}))).unwrap();
    assert_eq!(*seen.lock().unwrap(), vec!["pre:mapping", "post:record"]);
}

/// Ancestor validators run first, then the subtype's, each in declaration
/// order.
#[test]
fn test_validator_ordering_across_inheritance() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let schema = SchemaBuilder::new()
        .shape(
            ShapeBuilder::new("Child")
                .extends("Parent")
                .validator("c1", &["x"], Phase::Post, recorder("child1", &seen))
                .validator("c2", &["x"], Phase::Post, recorder("child2", &seen)),
        )
        .shape(
            ShapeBuilder::new("Parent")
                .field("x", T::int())
                .validator("p1", &["x"], Phase::Post, recorder("parent1", &seen))
                .validator("p2", &["x"], Phase::Post, recorder("parent2", &seen)),
        )
        .link()
        .unwrap();

    schema.parse("Child", &raw(json!({"x": 1}))).unwrap();
    assert_eq!(
        *seen.lock().unwrap(),
        vec!["parent1:int", "parent2:int", "child1:int", "child2:int"]
    );
}

/// A validator's return value replaces the field value.
#[test]
fn test_validator_output_threads_through() {
    let double: ValidatorFn = Arc::new(|_shape: &str, value: Value| match value {
        Value::Int(i) => Ok(Value::Int(i * 2)),
        other => Ok(other),
    });
    let schema = SchemaBuilder::new()
        .shape(
            ShapeBuilder::new("Counter")
                .field("n", T::int())
                .validator("double_pre", &["n"], Phase::Pre, double.clone())
                .validator("double_post", &["n"], Phase::Post, double),
        )
        .link()
        .unwrap();

    let instance = schema.parse("Counter", &raw(json!({"n": 3}))).unwrap();
    assert_eq!(instance.get_int("n"), Some(12));
}

/// A rejecting validator stops construction with a validation error.
#[test]
fn test_validator_rejection() {
    let reject: ValidatorFn = Arc::new(|_shape: &str, _value: Value| Err("nope".to_string()));
    let schema = SchemaBuilder::new()
        .shape(
            ShapeBuilder::new("S")
                .field("x", T::int())
                .validator("reject", &["x"], Phase::Pre, reject),
        )
        .link()
        .unwrap();

    let err = schema.parse("S", &raw(json!({"x": 1}))).unwrap_err();
    match err {
        SchemaError::Validation { phase, validator, reason, .. } => {
            assert_eq!(phase, Phase::Pre);
            assert_eq!(validator, "reject");
            assert_eq!(reason, "nope");
        }
        other => panic!("unexpected error: {other}"),
    }
}

// =============================================================================
// Subtyping Tests
// =============================================================================

/// The subtype's redeclared default wins.
#[test]
fn test_subtype_default_overrides_ancestor() {
    let schema = SchemaBuilder::new()
        .shape(ShapeBuilder::new("P").field_with("x", T::int(), FieldDefault::value(1)))
        .shape(
            ShapeBuilder::new("C")
                .extends("P")
                .field_with("x", T::int(), FieldDefault::value(2)),
        )
        .link()
        .unwrap();

    let child = schema.parse("C", &Mapping::new()).unwrap();
    assert_eq!(child.get_int("x"), Some(2));
    let parent = schema.parse("P", &Mapping::new()).unwrap();
    assert_eq!(parent.get_int("x"), Some(1));
}

/// A record field accepts an instance of a descendant shape.
#[test]
fn test_record_accepts_subshape_instance() {
    let schema = SchemaBuilder::new()
        .shape(ShapeBuilder::new("Holder").field("item", T::record("Base")))
        .shape(ShapeBuilder::new("Base").field_with("x", T::int(), FieldDefault::value(1)))
        .shape(ShapeBuilder::new("Derived").extends("Base").field("y", T::text()))
        .link()
        .unwrap();

    let derived = schema.parse("Derived", &raw(json!({"y": "why"}))).unwrap();
    let mut input = Mapping::new();
    input.insert("item", Value::Record(derived.clone()));

    let holder = schema.parse("Holder", &input).unwrap();
    assert_eq!(holder.get_record("item"), Some(&derived));
}

// =============================================================================
// Nested Coercion Tests
// =============================================================================

/// A nested mapping becomes an instance of the nested shape.
#[test]
fn test_nested_record_coercion() {
    let schema = nested_schema();
    let outer = schema.parse("Outer", &raw(json!({"item": {"v": 5}}))).unwrap();

    let inner = outer.get_record("item").unwrap();
    assert_eq!(inner.shape(), "Inner");
    assert_eq!(inner.get_int("v"), Some(5));
}

/// A scalar where a record is declared is a coercion error.
#[test]
fn test_nested_record_rejects_scalar() {
    let schema = nested_schema();
    let err = schema.parse("Outer", &raw(json!({"item": 5}))).unwrap_err();
    match err {
        SchemaError::TypeCoercion { field, expected, actual, .. } => {
            assert_eq!(field, "item");
            assert_eq!(expected, "record<Inner>");
            assert_eq!(actual, "int");
        }
        other => panic!("unexpected error: {other}"),
    }
}

/// Sequences of records keep their order and length.
#[test]
fn test_sequence_coercion_preserves_order() {
    let schema = nested_schema();
    let outer = schema
        .parse("Outer2", &raw(json!({"items": [{"v": 1}, {"v": 2}]})))
        .unwrap();

    let items = outer.get_sequence("items").unwrap();
    assert_eq!(items.len(), 2);
    let values: Vec<i64> = items
        .iter()
        .map(|item| item.as_record().unwrap().get_int("v").unwrap())
        .collect();
    assert_eq!(values, vec![1, 2]);
}

/// Int-keyed mappings treat "01" and "1" as the same key.
#[test]
fn test_int_keyed_mapping_collision() {
    let schema = SchemaBuilder::new()
        .shape(ShapeBuilder::new("Counts").field("by_id", T::mapping(T::int(), T::text())))
        .link()
        .unwrap();

    let counts = schema.parse("Counts", &raw(json!({"by_id": {"007": "a"}}))).unwrap();
    assert_eq!(counts.lookup("by_id.7").and_then(Value::as_str), Some("a"));

    let err = schema
        .parse("Counts", &raw(json!({"by_id": {"01": "a", "1": "b"}})))
        .unwrap_err();
    assert_eq!(err.code(), "GAPX_SCHEMA_KEY_COLLISION");
    assert_eq!(err.path(), Some("by_id"));
}

/// Self-referential shapes link and construct.
#[test]
fn test_self_reference_links() {
    let schema = SchemaBuilder::new()
        .shape(
            ShapeBuilder::new("Node")
                .field("value", T::int())
                .field("next", T::optional(T::record("Node"))),
        )
        .link()
        .unwrap();

    let list = schema
        .parse("Node", &raw(json!({"value": 1, "next": {"value": 2}})))
        .unwrap();
    assert_eq!(list.lookup("next.value"), Some(&Value::Int(2)));
    assert_eq!(list.lookup("next.next"), Some(&Value::Null));
}

// =============================================================================
// Declaration Tests
// =============================================================================

/// References to undeclared shapes fail at link time.
#[test]
fn test_unknown_shape_reference_fails_link() {
    let err = SchemaBuilder::new()
        .shape(ShapeBuilder::new("Outer").field("items", T::sequence(T::record("Missing"))))
        .link()
        .unwrap_err();
    assert_eq!(err.code(), "GAPX_SCHEMA_UNKNOWN_SHAPE");
    assert!(err.is_declaration_error());
}

/// Inheritance cycles fail at link time.
#[test]
fn test_inheritance_cycle_fails_link() {
    let err = SchemaBuilder::new()
        .shape(ShapeBuilder::new("A").extends("B"))
        .shape(ShapeBuilder::new("B").extends("A"))
        .link()
        .unwrap_err();
    assert!(matches!(err, SchemaError::InheritanceCycle { .. }));
}

/// A record field that defaults to its own shape fails at link time
/// instead of recursing on construction.
#[test]
fn test_self_defaulting_record_fails_link() {
    let err = SchemaBuilder::new()
        .shape(ShapeBuilder::new("Node").field_with("next", T::record("Node"), FieldDefault::empty_mapping()))
        .link()
        .unwrap_err();
    assert_eq!(err.code(), "GAPX_SCHEMA_DEFAULT_CYCLE");
    assert!(err.is_declaration_error());

    let err = SchemaBuilder::new()
        .shape(ShapeBuilder::new("A").field_with("b", T::optional(T::record("B")), FieldDefault::empty_mapping()))
        .shape(ShapeBuilder::new("B").field_with("a", T::record("A"), FieldDefault::empty_mapping()))
        .link()
        .unwrap_err();
    assert!(matches!(err, SchemaError::DefaultCycle { .. }));
}

/// Extra keys are ignored unless the shape denies them.
#[test]
fn test_unknown_fields_policy() {
    let schema = SchemaBuilder::new()
        .shape(ShapeBuilder::new("Loose").field("x", T::int()))
        .shape(ShapeBuilder::new("Strict").field("x", T::int()).deny_unknown_fields())
        .link()
        .unwrap();
    let input = raw(json!({"x": 1, "extra": true}));

    let loose = schema.parse("Loose", &input).unwrap();
    assert_eq!(loose.len(), 1);

    let err = schema.parse("Strict", &input).unwrap_err();
    assert_eq!(err.code(), "GAPX_SCHEMA_UNKNOWN_FIELD");
}
