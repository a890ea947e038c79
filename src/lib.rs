//! gapx - GA-based gap-filling and pruning configuration toolkit
//!
//! - `schema`: declarative shapes with defaults, validators and coercion
//! - `config`: run-configuration shapes and the document loader
//! - `runner`: records a run's manifest
//! - `observability`: structured JSON logging
//! - `cli`: command-line front end

pub mod cli;
pub mod config;
pub mod observability;
pub mod runner;
pub mod schema;
