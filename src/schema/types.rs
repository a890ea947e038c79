//! Type descriptors
//!
//! Every field declares its type explicitly as a `TypeDescriptor`. The
//! grammar is closed:
//! - scalar: pass-through, the kind is declarative only
//! - optional: wraps another descriptor, admits absence (`Value::Null`)
//! - sequence: homogeneous ordered collection
//! - mapping: text-keyed collection with key and value descriptors; int,
//!   float and bool key descriptors normalise the key text
//! - record: nested shape, referenced by name and resolved at link time
//! - literal set: fixed enumeration, pass-through (membership is checked by
//!   validators such as `one_of`)

use super::value::Value;

/// Declared kind of a scalar field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    /// Explicit untyped passthrough
    Any,
    Bool,
    Int,
    Float,
    Text,
    /// Filesystem path carried as text
    Path,
}

impl ScalarKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            ScalarKind::Any => "any",
            ScalarKind::Bool => "bool",
            ScalarKind::Int => "int",
            ScalarKind::Float => "float",
            ScalarKind::Text => "text",
            ScalarKind::Path => "path",
        }
    }
}

/// Structural classification of a declared field type
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescriptor {
    Scalar(ScalarKind),
    Optional(Box<TypeDescriptor>),
    Sequence(Box<TypeDescriptor>),
    Mapping {
        key: Box<TypeDescriptor>,
        value: Box<TypeDescriptor>,
    },
    /// Nested shape, by shape name
    Record(String),
    LiteralSet(Vec<Value>),
}

impl TypeDescriptor {
    pub fn any() -> Self {
        TypeDescriptor::Scalar(ScalarKind::Any)
    }

    pub fn bool() -> Self {
        TypeDescriptor::Scalar(ScalarKind::Bool)
    }

    pub fn int() -> Self {
        TypeDescriptor::Scalar(ScalarKind::Int)
    }

    pub fn float() -> Self {
        TypeDescriptor::Scalar(ScalarKind::Float)
    }

    pub fn text() -> Self {
        TypeDescriptor::Scalar(ScalarKind::Text)
    }

    pub fn path() -> Self {
        TypeDescriptor::Scalar(ScalarKind::Path)
    }

    pub fn optional(inner: TypeDescriptor) -> Self {
        TypeDescriptor::Optional(Box::new(inner))
    }

    pub fn sequence(element: TypeDescriptor) -> Self {
        TypeDescriptor::Sequence(Box::new(element))
    }

    pub fn mapping(key: TypeDescriptor, value: TypeDescriptor) -> Self {
        TypeDescriptor::Mapping {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    pub fn record(shape: impl Into<String>) -> Self {
        TypeDescriptor::Record(shape.into())
    }

    /// Literal set of text values
    pub fn literal<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Value>,
    {
        TypeDescriptor::LiteralSet(allowed.into_iter().map(Into::into).collect())
    }

    /// Whether absence is admitted. Only `Optional` admits absence.
    pub fn is_optional(&self) -> bool {
        matches!(self, TypeDescriptor::Optional(_))
    }

    /// Every shape name referenced at any depth
    pub fn referenced_shapes(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_shapes(&mut out);
        out
    }

    fn collect_shapes<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            TypeDescriptor::Scalar(_) | TypeDescriptor::LiteralSet(_) => {}
            TypeDescriptor::Optional(inner) | TypeDescriptor::Sequence(inner) => {
                inner.collect_shapes(out)
            }
            TypeDescriptor::Mapping { key, value } => {
                key.collect_shapes(out);
                value.collect_shapes(out);
            }
            TypeDescriptor::Record(name) => out.push(name),
        }
    }

    /// Human-readable rendering, e.g. `optional<sequence<record<Inner>>>`
    pub fn describe(&self) -> String {
        match self {
            TypeDescriptor::Scalar(kind) => kind.type_name().to_string(),
            TypeDescriptor::Optional(inner) => format!("optional<{}>", inner.describe()),
            TypeDescriptor::Sequence(inner) => format!("sequence<{}>", inner.describe()),
            TypeDescriptor::Mapping { key, value } => {
                format!("mapping<{}, {}>", key.describe(), value.describe())
            }
            TypeDescriptor::Record(name) => format!("record<{}>", name),
            TypeDescriptor::LiteralSet(allowed) => {
                let items: Vec<String> = allowed
                    .iter()
                    .map(|v| v.to_key().unwrap_or_else(|| v.type_name().to_string()))
                    .collect();
                format!("literal<{}>", items.join("|"))
            }
        }
    }
}
