//! Run configuration for gapx
//!
//! The run-configuration shapes are declared with the schema engine in
//! `models`; `loader` assembles a root document and its section documents
//! into one validated `RunBundle` instance and writes or reads manifests.

mod errors;
mod loader;
pub mod models;

pub use errors::{ConfigError, ConfigResult};
pub use loader::{dump_manifest, load_config, load_manifest, read_document, unwrap_section};
pub use models::{schema, RUN_BUNDLE};
