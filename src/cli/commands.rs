//! CLI command implementations
//!
//! Commands write their output to a caller-supplied writer; `run` wires
//! that to stdout after applying the log threshold.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::config::{load_config, load_manifest};
use crate::observability::{self, Logger};
use crate::runner::{Runner, MANIFEST_FILE};
use crate::schema::{to_plain_data, Instance, Value};

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::{write_json, write_line, write_table};

/// Parse arguments, configure logging and run the command
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    observability::init_from_env();
    if let Some(level) = cli.log_level {
        Logger::set_threshold(level);
    }
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_command_to(cmd, &mut out)
}

/// Same as `run_command`, writing to `out`
pub fn run_command_to<W: Write>(cmd: Command, out: &mut W) -> CliResult<()> {
    match cmd {
        Command::Validate { run } => validate(&run, out),
        Command::Run { run, resume } => execute(&run, resume, out),
        Command::Report { run, format } => report(&run, &format, out),
    }
}

fn text_at<'a>(bundle: &'a Instance, path: &str) -> &'a str {
    bundle.lookup(path).and_then(Value::as_str).unwrap_or("")
}

/// `?` when the section or field is absent
fn scalar_at(bundle: &Instance, path: &str) -> String {
    match bundle.lookup(path) {
        None | Some(Value::Null) => "?".to_string(),
        Some(value) => value.to_key().unwrap_or_else(|| "?".to_string()),
    }
}

/// Rows of the validate summary table
pub fn summary_rows(bundle: &Instance) -> Vec<(&'static str, String)> {
    let tasks = bundle
        .lookup("tasks.tasks")
        .and_then(Value::as_sequence)
        .map_or(0, <[Value]>::len);

    vec![
        ("Seed", scalar_at(bundle, "run.seed")),
        ("Output Dir", text_at(bundle, "run.output_dir").to_string()),
        ("Tasks", tasks.to_string()),
        ("GA Generations", scalar_at(bundle, "ga.generations")),
        ("Population", scalar_at(bundle, "ga.population")),
    ]
}

/// Validate a configuration bundle and print a summary
pub fn validate<W: Write>(run: &Path, out: &mut W) -> CliResult<()> {
    let bundle = load_config(run)?;
    let name = text_at(&bundle, "run.name");

    write_line(out, &format!("Configuration '{}' validated successfully.", name))?;
    write_table(
        out,
        &format!("GAPx Run: {}", name),
        ("Section", "Details"),
        &summary_rows(&bundle),
    )
}

/// Execute the workflow and report where the manifest went
pub fn execute<W: Write>(run: &Path, resume: bool, out: &mut W) -> CliResult<()> {
    let bundle = load_config(run)?;
    let result = Runner::new(bundle).run(resume)?;
    write_line(
        out,
        &format!("Run completed. Manifest saved to {}", result.manifest_path.display()),
    )
}

/// A directory means its `manifest.json`
pub fn resolve_manifest(run: &Path) -> CliResult<PathBuf> {
    let manifest = if run.is_dir() {
        run.join(MANIFEST_FILE)
    } else {
        run.to_path_buf()
    };
    if !manifest.exists() {
        return Err(CliError::manifest_not_found(&manifest));
    }
    Ok(manifest)
}

/// Print a report for a manifest, run directory or root configuration
pub fn report<W: Write>(run: &Path, format: &str, out: &mut W) -> CliResult<()> {
    let manifest = resolve_manifest(run)?;
    let is_json = manifest.extension().and_then(|ext| ext.to_str()) == Some("json");
    let bundle = if is_json {
        load_manifest(&manifest)?
    } else {
        load_config(&manifest)?
    };

    if format == "json" {
        return write_json(out, &to_plain_data(&bundle));
    }
    write_line(
        out,
        &format!(
            "Report generation stub for run '{}' in format {}",
            text_at(&bundle, "run.name"),
            format
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{schema, RUN_BUNDLE};
    use serde_json::json;
    use tempfile::TempDir;

    fn bundle(extra: serde_json::Value) -> Instance {
        let mut raw = json!({
            "run": {"name": "unit", "output_dir": "out", "seed": 7},
            "inputs": {
                "model_sources": "m.yaml",
                "tasks": "t.yaml",
                "ga": "g.yaml",
                "thermo": "th.yaml",
                "genomic_evidence": "e.yaml",
                "scoring": "s.yaml"
            },
            "export": {"best_model": {"path": "best"}}
        });
        if let (Some(target), Some(source)) = (raw.as_object_mut(), extra.as_object()) {
            target.extend(source.clone());
        }
        schema().unwrap().parse_value(RUN_BUNDLE, &Value::from(raw)).unwrap()
    }

    #[test]
    fn test_summary_rows_without_sections() {
        let rows = summary_rows(&bundle(json!({})));
        assert_eq!(rows[0], ("Seed", "7".to_string()));
        assert_eq!(rows[1], ("Output Dir", "out".to_string()));
        assert_eq!(rows[2], ("Tasks", "0".to_string()));
        assert_eq!(rows[3], ("GA Generations", "?".to_string()));
    }

    #[test]
    fn test_summary_rows_with_ga() {
        let rows = summary_rows(&bundle(json!({"ga": {"generations": 150}})));
        assert_eq!(rows[3], ("GA Generations", "150".to_string()));
        assert_eq!(rows[4], ("Population", "100".to_string()));
    }

    #[test]
    fn test_resolve_manifest_missing() {
        let dir = TempDir::new().unwrap();
        let err = resolve_manifest(dir.path()).unwrap_err();
        assert_eq!(err.code_str(), "GAPX_CLI_MANIFEST_NOT_FOUND");
    }
}
