//! Tagged value model shared by raw input and constructed instances
//!
//! Raw documents deserialize into `Value` from any self-describing serde
//! format (YAML, JSON). Raw values never contain `Record`; constructed
//! values may.

use std::fmt;

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use super::construct::Instance;

/// A raw or coerced value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Explicit null, also used as the absence marker
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Sequence(Vec<Value>),
    Mapping(Mapping),
    /// A constructed nested instance
    Record(Instance),
}

impl Value {
    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Sequence(_) => "sequence",
            Value::Mapping(_) => "mapping",
            Value::Record(_) => "record",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view; integers are widened.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Value::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Instance> {
        match self {
            Value::Record(instance) => Some(instance),
            _ => None,
        }
    }

    /// Renders a scalar as mapping-key text. Composite values have no key form.
    pub fn to_key(&self) -> Option<String> {
        match self {
            Value::Null => Some("null".into()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Int(i) => Some(i.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::Text(s) => Some(s.clone()),
            Value::Sequence(_) | Value::Mapping(_) | Value::Record(_) => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Sequence(items)
    }
}

impl From<Mapping> for Value {
    fn from(map: Mapping) -> Self {
        Value::Mapping(map)
    }
}

impl From<Instance> for Value {
    fn from(instance: Instance) -> Self {
        Value::Record(instance)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => {
                Value::Sequence(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(obj) => Value::Mapping(
                obj.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            ),
        }
    }
}

/// Insertion-ordered mapping with text keys
///
/// Inserting an existing key replaces its value in place. Equality ignores
/// order. Lookups and inserts scan the entries linearly, so building a
/// mapping of n keys costs O(n^2); configuration documents stay small.
#[derive(Debug, Clone, Default)]
pub struct Mapping {
    entries: Vec<(String, Value)>,
}

impl PartialEq for Mapping {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Inserts a value, returning the previous value for the key.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl FromIterator<(String, Value)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut map = Mapping::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl IntoIterator for Mapping {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Mapping(map) => map.serialize(serializer),
            Value::Record(instance) => {
                let mut out = serializer.serialize_map(Some(instance.len()))?;
                for (name, value) in instance.fields() {
                    out.serialize_entry(name, value)?;
                }
                out.end()
            }
        }
    }
}

impl Serialize for Mapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut out = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self.iter() {
            out.serialize_entry(k, v)?;
        }
        out.end()
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a null, bool, number, string, sequence or mapping")
    }

    fn visit_bool<E: de::Error>(self, b: bool) -> Result<Value, E> {
        Ok(Value::Bool(b))
    }

    fn visit_i64<E: de::Error>(self, i: i64) -> Result<Value, E> {
        Ok(Value::Int(i))
    }

    fn visit_u64<E: de::Error>(self, u: u64) -> Result<Value, E> {
        Ok(match i64::try_from(u) {
            Ok(i) => Value::Int(i),
            Err(_) => Value::Float(u as f64),
        })
    }

    fn visit_f64<E: de::Error>(self, f: f64) -> Result<Value, E> {
        Ok(Value::Float(f))
    }

    fn visit_str<E: de::Error>(self, s: &str) -> Result<Value, E> {
        Ok(Value::Text(s.to_string()))
    }

    fn visit_string<E: de::Error>(self, s: String) -> Result<Value, E> {
        Ok(Value::Text(s))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        Value::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element::<Value>()? {
            items.push(item);
        }
        Ok(Value::Sequence(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Value, A::Error> {
        let mut map = Mapping::with_capacity(access.size_hint().unwrap_or(0));
        while let Some(key) = access.next_key::<Value>()? {
            let key = key
                .to_key()
                .ok_or_else(|| de::Error::custom("mapping keys must be scalars"))?;
            if map.contains_key(&key) {
                return Err(de::Error::custom(format!("duplicate mapping key '{}'", key)));
            }
            let value = access.next_value::<Value>()?;
            map.insert(key, value);
        }
        Ok(Value::Mapping(map))
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mapping_insert_replaces_in_place() {
        let mut map = Mapping::new();
        map.insert("b", Value::Int(1));
        map.insert("a", Value::Int(2));
        let previous = map.insert("b", Value::Int(3));

        assert_eq!(previous, Some(Value::Int(1)));
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(map.get("b"), Some(&Value::Int(3)));
    }

    #[test]
    fn test_yaml_preserves_key_order() {
        let value: Value = serde_yaml::from_str("zeta: 1\nalpha: two\nmid: [1, 2.5, null]\n").unwrap();
        let map = value.as_mapping().unwrap();
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["zeta", "alpha", "mid"]);
        assert_eq!(map.get("alpha"), Some(&Value::from("two")));
        assert_eq!(
            map.get("mid"),
            Some(&Value::Sequence(vec![Value::Int(1), Value::Float(2.5), Value::Null]))
        );
    }

    #[test]
    fn test_yaml_scalar_keys_are_stringified() {
        let value: Value = serde_yaml::from_str("1: one\ntrue: yes\n").unwrap();
        let map = value.as_mapping().unwrap();
        assert_eq!(map.get("1"), Some(&Value::from("one")));
        assert!(map.contains_key("true"));
    }

    #[test]
    fn test_yaml_duplicate_keys_rejected() {
        let err = serde_yaml::from_str::<Value>("a: 1\na: 2\n").unwrap_err();
        assert!(err.to_string().contains("duplicate mapping key 'a'"));

        let err = serde_yaml::from_str::<Value>("1: x\n\"1\": y\n").unwrap_err();
        assert!(err.to_string().contains("duplicate mapping key '1'"));

        let nested = serde_yaml::from_str::<Value>("outer:\n  k: 1\n  k: 2\n");
        assert!(nested.is_err());
    }

    #[test]
    fn test_json_duplicate_keys_rejected() {
        let err = serde_json::from_str::<Value>(r#"{"a": 1, "a": 2}"#).unwrap_err();
        assert!(err.to_string().contains("duplicate mapping key 'a'"));
    }

    #[test]
    fn test_json_conversion() {
        let value = Value::from(json!({"a": [1, 2.0, "x"], "b": {"c": null}, "d": true}));
        let map = value.as_mapping().unwrap();
        assert_eq!(map.get("d"), Some(&Value::Bool(true)));
        assert_eq!(
            map.get("a"),
            Some(&Value::Sequence(vec![Value::Int(1), Value::Float(2.0), Value::from("x")]))
        );
        assert!(map.get("b").and_then(Value::as_mapping).unwrap().get("c").unwrap().is_null());
    }

    #[test]
    fn test_serialize_keeps_mapping_order() {
        let map: Mapping = vec![
            ("z".to_string(), Value::Int(1)),
            ("a".to_string(), Value::Null),
        ]
        .into_iter()
        .collect();
        let text = serde_json::to_string(&Value::Mapping(map)).unwrap();
        assert_eq!(text, r#"{"z":1,"a":null}"#);
    }

    #[test]
    fn test_mapping_equality_ignores_order() {
        let a: Mapping = vec![("x".to_string(), Value::Int(1)), ("y".to_string(), Value::Int(2))]
            .into_iter()
            .collect();
        let b: Mapping = vec![("y".to_string(), Value::Int(2)), ("x".to_string(), Value::Int(1))]
            .into_iter()
            .collect();
        assert_eq!(a, b);
        assert_ne!(a, Mapping::new());
    }

    #[test]
    fn test_numeric_views() {
        assert_eq!(Value::Int(3).as_f64(), Some(3.0));
        assert_eq!(Value::Float(3.5).as_i64(), None);
        assert_eq!(Value::from("x").type_name(), "text");
        assert_eq!(Value::Sequence(vec![]).to_key(), None);
    }
}
