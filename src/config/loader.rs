//! Run-configuration loading
//!
//! A root document names the section documents it is assembled from under
//! `inputs`. Section paths resolve against the root document's directory.
//! The assembled bundle is constructed in one call, so a bad section leaves
//! nothing half-loaded.

use std::fs;
use std::path::{Path, PathBuf};

use super::errors::{ConfigError, ConfigResult};
use super::models::{self, RUN_BUNDLE};
use crate::observability::{Logger, ObservationScope};
use crate::schema::{to_text_pretty, Instance, Mapping, Value};

/// Section key, and whether the section document may wrap its body under
/// that same key.
const SECTIONS: &[(&str, bool)] = &[
    ("model_sources", false),
    ("tasks", false),
    ("ga", true),
    ("thermo", true),
    ("genomic_evidence", true),
    ("scoring", false),
    ("essentiality", true),
    ("omics", true),
];

fn is_json(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some("json")
}

/// Whitespace, comments and bare document markers only
fn is_blank_yaml(text: &str) -> bool {
    text.lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with('#') || line == "---")
}

/// Reads a YAML or JSON document whose root is a mapping.
///
/// `.json` files are read as JSON, anything else as YAML. An empty
/// document is an empty mapping.
pub fn read_document(path: &Path) -> ConfigResult<Mapping> {
    let text = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;

    let value: Value = if is_json(path) {
        serde_json::from_str(&text).map_err(|e| ConfigError::Json {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
    } else if is_blank_yaml(&text) {
        Value::Null
    } else {
        serde_yaml::from_str(&text).map_err(|e| ConfigError::Yaml {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
    };

    match value {
        Value::Mapping(map) => Ok(map),
        Value::Null => Ok(Mapping::new()),
        other => Err(ConfigError::NotAMapping {
            path: path.to_path_buf(),
            actual: other.type_name().to_string(),
        }),
    }
}

/// Returns the body nested under `key` when it is a mapping, otherwise the
/// whole document.
pub fn unwrap_section(mut document: Mapping, key: &str) -> Mapping {
    match document.remove(key) {
        Some(Value::Mapping(inner)) => inner,
        Some(other) => {
            document.insert(key, other);
            document
        }
        None => document,
    }
}

/// Loads a root run configuration and every section it references.
///
/// # Errors
///
/// I/O and parse failures name the offending document. Schema failures in
/// the root are reported against the root path; failures in the assembled
/// bundle carry the field path of the section that broke.
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<Instance> {
    let path = path.as_ref();
    let display = path.display().to_string();
    let scope = ObservationScope::with_fields("CONFIG_LOAD", &[("path", display.as_str())]);

    match assemble(path) {
        Ok(bundle) => {
            scope.complete();
            Ok(bundle)
        }
        Err(err) => {
            scope.abandon(&err.to_string());
            Err(err)
        }
    }
}

fn assemble(path: &Path) -> ConfigResult<Instance> {
    let schema = models::schema()?;
    let mut root = read_document(path)?;

    let first = schema
        .parse(RUN_BUNDLE, &root)
        .map_err(|e| ConfigError::invalid(path, e))?;

    let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
    for &(key, wrapped) in SECTIONS {
        // Optional inputs are null when absent
        let reference = first.lookup(&format!("inputs.{}", key)).and_then(Value::as_str);
        let Some(reference) = reference else {
            continue;
        };
        let section_path = base_dir.join(reference);
        let mut document = read_document(&section_path)?;
        if wrapped {
            document = unwrap_section(document, key);
        }
        let shown = section_path.display().to_string();
        Logger::info("CONFIG_SECTION_LOADED", &[("section", key), ("path", shown.as_str())]);
        root.insert(key, Value::Mapping(document));
    }

    schema
        .parse(RUN_BUNDLE, &root)
        .map_err(|e| ConfigError::invalid(path, e))
}

/// Writes the bundle as pretty JSON, creating parent directories.
pub fn dump_manifest(bundle: &Instance, path: impl AsRef<Path>) -> ConfigResult<PathBuf> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ConfigError::io(parent, e))?;
    }

    let mut text = to_text_pretty(bundle).map_err(|e| ConfigError::Encode(e.to_string()))?;
    text.push('\n');
    fs::write(path, text).map_err(|e| ConfigError::io(path, e))?;

    let shown = path.display().to_string();
    Logger::info("MANIFEST_WRITTEN", &[("path", shown.as_str())]);
    Ok(path.to_path_buf())
}

/// Reads a manifest written by `dump_manifest`.
pub fn load_manifest(path: impl AsRef<Path>) -> ConfigResult<Instance> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
    let value: Value = serde_json::from_str(&text).map_err(|e| ConfigError::Json {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    models::schema()?
        .parse_value(RUN_BUNDLE, &value)
        .map_err(|e| ConfigError::invalid(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_read_document_yaml_and_json() {
        let dir = TempDir::new().unwrap();
        let yaml = write(&dir, "a.yaml", "b: 1\na: two\n");
        let json = write(&dir, "a.json", r#"{"b": 1, "a": "two"}"#);

        let from_yaml = read_document(&yaml).unwrap();
        assert_eq!(from_yaml.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(from_yaml, read_document(&json).unwrap());
    }

    #[test]
    fn test_read_document_empty_is_empty_mapping() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "empty.yaml", "\n# nothing here\n");
        assert!(read_document(&path).unwrap().is_empty());
    }

    #[test]
    fn test_read_document_rejects_non_mapping_root() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "list.yaml", "- 1\n- 2\n");
        match read_document(&path) {
            Err(ConfigError::NotAMapping { actual, .. }) => assert_eq!(actual, "sequence"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_read_document_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = read_document(&dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_unwrap_section() {
        let mut wrapped = Mapping::new();
        let mut inner = Mapping::new();
        inner.insert("generations", Value::Int(5));
        wrapped.insert("ga", Value::Mapping(inner.clone()));
        assert_eq!(unwrap_section(wrapped, "ga"), inner);

        assert_eq!(unwrap_section(inner.clone(), "ga"), inner);

        let mut scalar = Mapping::new();
        scalar.insert("ga", Value::Int(1));
        assert_eq!(unwrap_section(scalar.clone(), "ga"), scalar);
    }
}
