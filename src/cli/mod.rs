//! CLI module for gapx
//!
//! Provides command-line interface for:
//! - validate: Load a run configuration and print a summary
//! - run: Load, run and write the manifest
//! - report: Report on an existing manifest

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{execute, report, resolve_manifest, run, run_command, run_command_to, summary_rows, validate};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_json, write_line, write_table};
