//! Serializer
//!
//! Walks an instance back into plain data: records become mappings in field
//! declaration order, sequences and mappings are rebuilt from serialized
//! elements, scalars are returned unchanged. Absent optional fields stay as
//! explicit `Null` so exported keys match the shape's field set.

use super::construct::Instance;
use super::value::{Mapping, Value};

/// Converts an instance into plain data (no `Record` values remain).
pub fn to_plain_data(instance: &Instance) -> Value {
    Value::Mapping(record_to_mapping(instance))
}

/// Plain-data form of any value
pub fn plain_value(value: &Value) -> Value {
    match value {
        Value::Record(instance) => Value::Mapping(record_to_mapping(instance)),
        Value::Sequence(items) => Value::Sequence(items.iter().map(plain_value).collect()),
        Value::Mapping(map) => Value::Mapping(
            map.iter()
                .map(|(k, v)| (k.to_string(), plain_value(v)))
                .collect(),
        ),
        scalar => scalar.clone(),
    }
}

fn record_to_mapping(instance: &Instance) -> Mapping {
    let mut out = Mapping::with_capacity(instance.len());
    for (name, value) in instance.fields() {
        out.insert(name, plain_value(value));
    }
    out
}

/// Compact JSON text of an instance.
///
/// Non-finite floats are written as `null`.
pub fn to_text(instance: &Instance) -> serde_json::Result<String> {
    serde_json::to_string(&to_plain_data(instance))
}

/// Indented JSON text of an instance
pub fn to_text_pretty(instance: &Instance) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&to_plain_data(instance))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::field::FieldDefault;
    use crate::schema::registry::{Schema, SchemaBuilder, ShapeBuilder};
    use crate::schema::types::TypeDescriptor;
    use serde_json::json;

    fn schema() -> Schema {
        SchemaBuilder::new()
            .shape(
                ShapeBuilder::new("Outer")
                    .field("name", TypeDescriptor::text())
                    .field("items", TypeDescriptor::sequence(TypeDescriptor::record("Inner")))
                    .field("by_id", TypeDescriptor::mapping(TypeDescriptor::text(), TypeDescriptor::record("Inner")))
                    .field("maybe", TypeDescriptor::optional(TypeDescriptor::record("Inner")))
                    .field_with("ratio", TypeDescriptor::float(), FieldDefault::value(0.5)),
            )
            .shape(ShapeBuilder::new("Inner").field("v", TypeDescriptor::int()))
            .link()
            .unwrap()
    }

    #[test]
    fn test_plain_data_has_no_records() {
        let schema = schema();
        let inst = schema
            .parse_value(
                "Outer",
                &Value::from(json!({
                    "name": "x",
                    "items": [{"v": 1}, {"v": 2}],
                    "by_id": {"a": {"v": 3}}
                })),
            )
            .unwrap();

        let plain = to_plain_data(&inst);
        let expected = Value::from(json!({
            "name": "x",
            "items": [{"v": 1}, {"v": 2}],
            "by_id": {"a": {"v": 3}},
            "maybe": null,
            "ratio": 0.5
        }));
        assert_eq!(plain, expected);
    }

    #[test]
    fn test_text_keeps_declaration_order_and_explicit_null() {
        let schema = schema();
        let inst = schema
            .parse_value("Outer", &Value::from(json!({"name": "x", "items": [], "by_id": {}})))
            .unwrap();
        let text = to_text(&inst).unwrap();
        assert_eq!(
            text,
            r#"{"name":"x","items":[],"by_id":{},"maybe":null,"ratio":0.5}"#
        );
    }

    #[test]
    fn test_serialize_is_idempotent() {
        let schema = schema();
        let inst = schema
            .parse_value("Outer", &Value::from(json!({"name": "x", "items": [{"v": 1}], "by_id": {}})))
            .unwrap();
        assert_eq!(to_plain_data(&inst), to_plain_data(&inst));
        assert_eq!(to_text_pretty(&inst).unwrap(), to_text_pretty(&inst).unwrap());
    }
}
