//! Schema declaration, validation and coercion
//!
//! A shape is a named set of typed fields with defaults and validators.
//! Shapes are declared with `ShapeBuilder`, linked once into an immutable
//! `Schema`, and then used to construct `Instance`s from raw mappings.
//!
//! # Order of operations per field
//!
//! default resolution, pre-validators, coercion, post-validators.
//!
//! # Usage
//!
//! ```ignore
//! use gapx::schema::{SchemaBuilder, ShapeBuilder, TypeDescriptor, FieldDefault};
//!
//! let schema = SchemaBuilder::new()
//!     .shape(ShapeBuilder::new("Outer").field("item", TypeDescriptor::record("Inner")))
//!     .shape(ShapeBuilder::new("Inner").field_with("v", TypeDescriptor::int(), FieldDefault::value(1)))
//!     .link()?;
//! let outer = schema.parse_value("Outer", &raw)?;
//! let plain = gapx::schema::to_plain_data(&outer);
//! ```

mod coerce;
mod construct;
mod errors;
mod field;
mod registry;
mod serialize;
mod types;
mod validator;
mod value;

pub use construct::Instance;
pub use errors::{Phase, SchemaError, SchemaResult};
pub use field::{field, DefaultFactory, FieldDef, FieldDefault};
pub use registry::{Schema, SchemaBuilder, Shape, ShapeBuilder, UnknownFields};
pub use serialize::{plain_value, to_plain_data, to_text, to_text_pretty};
pub use types::{ScalarKind, TypeDescriptor};
pub use validator::{float_range, min_int, non_negative, one_of, path_like, ValidatorEntry, ValidatorFn};
pub use value::{Mapping, Value};
