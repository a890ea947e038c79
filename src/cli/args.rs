//! CLI argument definitions using clap
//!
//! Commands:
//! - gapx validate --run <path>
//! - gapx run --run <path> [--resume]
//! - gapx report --run <path> [--format html|json]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::observability::Severity;

/// GAPx - GA-based integrated gap-filling and pruning
#[derive(Parser, Debug)]
#[command(name = "gapx")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Log threshold (trace, info, warn, error, fatal); overrides GAPX_LOG
    #[arg(long, global = true)]
    pub log_level: Option<Severity>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a configuration bundle and print a summary
    Validate {
        /// Root run configuration
        #[arg(long)]
        run: PathBuf,
    },

    /// Execute the workflow for a configuration bundle
    Run {
        /// Root run configuration
        #[arg(long)]
        run: PathBuf,

        /// Resume from a previous manifest
        #[arg(long)]
        resume: bool,
    },

    /// Generate a report from an existing manifest
    Report {
        /// Manifest, root configuration or run directory
        #[arg(long)]
        run: PathBuf,

        /// Output format (html/json)
        #[arg(long, default_value = "html")]
        format: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
