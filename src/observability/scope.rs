//! ObservationScope for automatic begin/complete logging
//!
//! - `{name}_BEGIN` on creation (INFO)
//! - `{name}_COMPLETE` on `complete()` (INFO)
//! - `{name}_FAILED` on `fail()` (ERROR)
//! - `{name}_FAILED` on `abandon()` (WARN), for errors returned to a caller
//!   that reports them itself
//! - `{name}_INCOMPLETE` on drop without either (WARN)

use std::cell::Cell;

use super::logger::Logger;

/// A scope that logs its own begin and end events
///
/// ```ignore
/// let scope = ObservationScope::with_fields("CONFIG_LOAD", &[("path", "run.yaml")]);
/// // ... do work ...
/// scope.complete();
/// ```
pub struct ObservationScope<'a> {
    name: &'a str,
    completed: Cell<bool>,
    fields: Vec<(&'a str, String)>,
}

impl<'a> ObservationScope<'a> {
    pub fn new(name: &'a str) -> Self {
        Self::with_fields(name, &[])
    }

    /// Scope whose fields are repeated on every event it emits
    pub fn with_fields(name: &'a str, fields: &[(&'a str, &str)]) -> Self {
        let scope = Self {
            name,
            completed: Cell::new(false),
            fields: fields.iter().map(|(k, v)| (*k, v.to_string())).collect(),
        };
        Logger::info(&format!("{}_BEGIN", name), &scope.field_refs());
        scope
    }

    fn field_refs(&self) -> Vec<(&str, &str)> {
        self.fields.iter().map(|(k, v)| (*k, v.as_str())).collect()
    }

    pub fn complete(self) {
        self.complete_with_fields(&[]);
    }

    pub fn complete_with_fields(self, extra_fields: &[(&str, &str)]) {
        self.completed.set(true);
        let mut all_fields = self.field_refs();
        all_fields.extend(extra_fields.iter().copied());
        Logger::info(&format!("{}_COMPLETE", self.name), &all_fields);
    }

    pub fn fail(self, reason: &str) {
        self.completed.set(true);
        let (event, fields) = self.failure(reason);
        Logger::error(&event, &fields);
    }

    /// Ends the scope as failed at WARN. The error itself travels back to
    /// the caller, which decides how loudly to report it.
    pub fn abandon(self, reason: &str) {
        self.completed.set(true);
        let (event, fields) = self.failure(reason);
        Logger::warn(&event, &fields);
    }

    fn failure<'s>(&'s self, reason: &'s str) -> (String, Vec<(&'s str, &'s str)>) {
        let mut fields = self.field_refs();
        fields.push(("reason", reason));
        (format!("{}_FAILED", self.name), fields)
    }

    pub fn is_completed(&self) -> bool {
        self.completed.get()
    }
}

impl Drop for ObservationScope<'_> {
    fn drop(&mut self) {
        if !self.completed.get() {
            Logger::warn(
                &format!("{}_INCOMPLETE", self.name),
                &[("reason", "scope dropped without completion")],
            );
        }
    }
}
