//! Shape declaration and linking
//!
//! Shapes are declared in two passes:
//! 1. `SchemaBuilder::shape` collects declarations in any order. Nested
//!    records and parents are referenced by name, so forward and
//!    self-references are allowed.
//! 2. `SchemaBuilder::link` resolves every reference, merges fields and
//!    validators along each inheritance chain exactly once, rejects record
//!    fields whose defaults lead back to their own shape, and freezes the
//!    result into a `Schema`.
//!
//! A `Schema` is immutable after linking and can be shared across threads.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::observability::Logger;

use super::errors::{Phase, SchemaError, SchemaResult};
use super::field::{FieldDef, FieldDefault};
use super::types::TypeDescriptor;
use super::validator::{ValidatorEntry, ValidatorFn};
use super::value::Value;

/// Policy for raw keys that name no declared field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownFields {
    #[default]
    Ignore,
    Reject,
}

#[derive(Clone)]
struct ValidatorDecl {
    name: String,
    fields: Vec<String>,
    phase: Phase,
    func: ValidatorFn,
}

/// Declaration of one shape
#[derive(Clone)]
pub struct ShapeBuilder {
    name: String,
    parent: Option<String>,
    fields: Vec<FieldDef>,
    validators: Vec<ValidatorDecl>,
    unknown_fields: Option<UnknownFields>,
}

impl ShapeBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            fields: Vec::new(),
            validators: Vec::new(),
            unknown_fields: None,
        }
    }

    /// Single inheritance
    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Declares a field with no default
    pub fn field(self, name: impl Into<String>, descriptor: TypeDescriptor) -> Self {
        self.field_def(FieldDef::new(name, descriptor))
    }

    /// Declares a field with a default source
    pub fn field_with(
        self,
        name: impl Into<String>,
        descriptor: TypeDescriptor,
        default: FieldDefault,
    ) -> Self {
        self.field_def(FieldDef::new(name, descriptor).with_default(default))
    }

    pub fn field_def(mut self, def: FieldDef) -> Self {
        self.fields.push(def);
        self
    }

    /// Binds `func` to each of `fields` at `phase`
    pub fn validator(
        mut self,
        name: impl Into<String>,
        fields: &[&str],
        phase: Phase,
        func: ValidatorFn,
    ) -> Self {
        self.validators.push(ValidatorDecl {
            name: name.into(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
            phase,
            func,
        });
        self
    }

    pub fn deny_unknown_fields(mut self) -> Self {
        self.unknown_fields = Some(UnknownFields::Reject);
        self
    }

    pub fn allow_unknown_fields(mut self) -> Self {
        self.unknown_fields = Some(UnknownFields::Ignore);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Collects shape declarations until `link`
#[derive(Clone, Default)]
pub struct SchemaBuilder {
    shapes: Vec<ShapeBuilder>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shape(mut self, shape: ShapeBuilder) -> Self {
        self.shapes.push(shape);
        self
    }

    /// Resolves all references and computes every effective shape.
    ///
    /// # Errors
    ///
    /// Returns a declaration error for duplicate shapes or fields, unknown
    /// parents or nested shapes, inheritance cycles, and validators bound to
    /// undeclared fields.
    pub fn link(self) -> SchemaResult<Schema> {
        let mut decls: HashMap<&str, &ShapeBuilder> = HashMap::with_capacity(self.shapes.len());
        for decl in &self.shapes {
            if decls.insert(decl.name.as_str(), decl).is_some() {
                return Err(SchemaError::DuplicateShape {
                    shape: decl.name.clone(),
                });
            }
        }

        for decl in &self.shapes {
            check_declaration(decl, &decls)?;
        }

        let mut shapes = HashMap::with_capacity(self.shapes.len());
        for decl in &self.shapes {
            let chain = inheritance_chain(decl, &decls)?;
            let shape = merge_chain(decl, &chain)?;
            shapes.insert(decl.name.clone(), shape);
        }
        check_default_cycles(&shapes)?;

        let count = shapes.len().to_string();
        Logger::trace("SCHEMA_LINKED", &[("shapes", count.as_str())]);

        Ok(Schema {
            shapes: Arc::new(shapes),
        })
    }
}

/// Per-declaration checks that need no inheritance context
fn check_declaration(decl: &ShapeBuilder, decls: &HashMap<&str, &ShapeBuilder>) -> SchemaResult<()> {
    let mut seen = HashSet::new();
    for field in &decl.fields {
        if !seen.insert(field.name.as_str()) {
            return Err(SchemaError::DuplicateField {
                shape: decl.name.clone(),
                field: field.name.clone(),
            });
        }
        for referenced in field.descriptor.referenced_shapes() {
            if !decls.contains_key(referenced) {
                return Err(SchemaError::UnknownShape {
                    shape: referenced.to_string(),
                    referenced_by: format!("{}.{}", decl.name, field.name),
                });
            }
        }
    }

    if let Some(parent) = &decl.parent {
        if !decls.contains_key(parent.as_str()) {
            return Err(SchemaError::UnknownParent {
                shape: decl.name.clone(),
                parent: parent.clone(),
            });
        }
    }

    Ok(())
}

/// Declarations from the root ancestor down to `decl`
fn inheritance_chain<'a>(
    decl: &'a ShapeBuilder,
    decls: &HashMap<&str, &'a ShapeBuilder>,
) -> SchemaResult<Vec<&'a ShapeBuilder>> {
    let mut chain = vec![decl];
    let mut visited = HashSet::from([decl.name.as_str()]);
    let mut current = decl;

    while let Some(parent) = &current.parent {
        if !visited.insert(parent.as_str()) {
            return Err(SchemaError::InheritanceCycle {
                shape: decl.name.clone(),
            });
        }
        current = decls.get(parent.as_str()).copied().ok_or_else(|| SchemaError::UnknownParent {
            shape: current.name.clone(),
            parent: parent.clone(),
        })?;
        chain.push(current);
    }

    chain.reverse();
    Ok(chain)
}

/// Merges a root-first chain. A redeclared field replaces the ancestor's
/// definition at the ancestor's position; validators concatenate.
fn merge_chain(decl: &ShapeBuilder, chain: &[&ShapeBuilder]) -> SchemaResult<Shape> {
    let mut fields: Vec<FieldDef> = Vec::new();
    let mut validators: HashMap<String, Vec<ValidatorEntry>> = HashMap::new();
    let mut unknown_fields = UnknownFields::default();

    for link in chain {
        for def in &link.fields {
            match fields.iter_mut().find(|f| f.name == def.name) {
                Some(slot) => *slot = def.clone(),
                None => fields.push(def.clone()),
            }
        }

        for v in &link.validators {
            for field in &v.fields {
                if !fields.iter().any(|f| f.name == *field) {
                    return Err(SchemaError::UnknownValidatorField {
                        shape: link.name.clone(),
                        field: field.clone(),
                        validator: v.name.clone(),
                    });
                }
                validators.entry(field.clone()).or_default().push(ValidatorEntry {
                    name: v.name.clone(),
                    phase: v.phase,
                    func: v.func.clone(),
                });
            }
        }

        if let Some(policy) = link.unknown_fields {
            unknown_fields = policy;
        }
    }

    Ok(Shape {
        name: decl.name.clone(),
        ancestors: chain
            .iter()
            .filter(|d| d.name != decl.name)
            .map(|d| d.name.clone())
            .collect(),
        fields,
        validators,
        unknown_fields,
    })
}

/// Target shape of a record field, looking through optionals
fn record_target(descriptor: &TypeDescriptor) -> Option<&str> {
    match descriptor {
        TypeDescriptor::Record(name) => Some(name),
        TypeDescriptor::Optional(inner) => record_target(inner),
        _ => None,
    }
}

/// Record fields of `shape` whose default is a mapping, so that omitting
/// the field constructs the target shape
fn defaulted_records(shape: &Shape) -> Vec<(&str, &str)> {
    shape
        .fields
        .iter()
        .filter_map(|def| {
            let target = record_target(&def.descriptor)?;
            matches!(def.default.resolve(), Some(Value::Mapping(_))).then_some((def.name.as_str(), target))
        })
        .collect()
}

/// Rejects shapes whose defaulted record fields lead back to themselves.
/// Constructing such a shape from an empty mapping never terminates.
fn check_default_cycles(shapes: &HashMap<String, Shape>) -> SchemaResult<()> {
    let mut names: Vec<&str> = shapes.keys().map(String::as_str).collect();
    names.sort_unstable();

    let mut finished = HashSet::new();
    for name in names {
        let mut trail = Vec::new();
        walk_defaults(name, shapes, &mut trail, &mut finished)?;
    }
    Ok(())
}

fn walk_defaults<'a>(
    name: &'a str,
    shapes: &'a HashMap<String, Shape>,
    trail: &mut Vec<(&'a str, &'a str)>,
    finished: &mut HashSet<&'a str>,
) -> SchemaResult<()> {
    if finished.contains(name) {
        return Ok(());
    }
    let Some(shape) = shapes.get(name) else {
        return Ok(());
    };

    for (field, target) in defaulted_records(shape) {
        trail.push((shape.name(), field));
        if let Some(start) = trail.iter().position(|(owner, _)| *owner == target) {
            let mut steps: Vec<String> = trail[start..]
                .iter()
                .map(|(owner, field)| format!("{}.{}", owner, field))
                .collect();
            steps.push(target.to_string());
            return Err(SchemaError::DefaultCycle {
                shape: target.to_string(),
                path: steps.join(" -> "),
            });
        }
        walk_defaults(target, shapes, trail, finished)?;
        trail.pop();
    }

    finished.insert(name);
    Ok(())
}

/// Effective field registry of one shape
#[derive(Debug)]
pub struct Shape {
    name: String,
    /// Root-first, excluding the shape itself
    ancestors: Vec<String>,
    fields: Vec<FieldDef>,
    validators: HashMap<String, Vec<ValidatorEntry>>,
    unknown_fields: UnknownFields,
}

impl Shape {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ancestors(&self) -> &[String] {
        &self.ancestors
    }

    /// Effective fields in declaration order
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Validators for a field, ancestors first
    pub fn validators_for(&self, field: &str) -> &[ValidatorEntry] {
        self.validators.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn unknown_fields(&self) -> UnknownFields {
        self.unknown_fields
    }

    /// True if this shape is `name` or descends from it
    pub fn is_a(&self, name: &str) -> bool {
        self.name == name || self.ancestors.iter().any(|a| a == name)
    }
}

/// Linked, immutable set of shapes
#[derive(Debug, Clone)]
pub struct Schema {
    shapes: Arc<HashMap<String, Shape>>,
}

impl Schema {
    pub fn shape(&self, name: &str) -> Option<&Shape> {
        self.shapes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.shapes.contains_key(name)
    }

    /// Shape names, sorted
    pub fn shape_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.shapes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}
