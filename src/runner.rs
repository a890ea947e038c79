//! Run orchestration
//!
//! Records the resolved configuration of a run as `manifest.json` in the
//! run's output directory. No optimisation happens here yet, so
//! `best_individual` is always empty.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use crc32fast::Hasher;

use crate::config::{dump_manifest, ConfigError, ConfigResult, RUN_BUNDLE};
use crate::observability::{Logger, ObservationScope};
use crate::schema::{Instance, Mapping, SchemaError};

/// Manifest file name inside the output directory
pub const MANIFEST_FILE: &str = "manifest.json";

/// Outcome of one run
#[derive(Debug, Clone)]
pub struct RunResult {
    pub bundle: Instance,
    pub best_individual: Option<Mapping>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub manifest_path: PathBuf,
    /// CRC32 of the manifest bytes as written
    pub manifest_checksum: u32,
}

pub struct Runner {
    bundle: Instance,
}

impl Runner {
    pub fn new(bundle: Instance) -> Self {
        Self { bundle }
    }

    pub fn bundle(&self) -> &Instance {
        &self.bundle
    }

    /// Directory named by `run.output_dir`
    pub fn output_dir(&self) -> ConfigResult<PathBuf> {
        self.bundle
            .lookup("run.output_dir")
            .and_then(|v| v.as_str())
            .map(PathBuf::from)
            .ok_or_else(|| {
                ConfigError::Schema(SchemaError::MissingField {
                    shape: RUN_BUNDLE.to_string(),
                    field: "output_dir".to_string(),
                    path: "run.output_dir".to_string(),
                })
            })
    }

    /// Writes the manifest and returns the run record.
    ///
    /// `resume` is recorded in the log only.
    pub fn run(&self, resume: bool) -> ConfigResult<RunResult> {
        let started_at = Utc::now();
        let name = self.bundle.lookup("run.name").and_then(|v| v.as_str()).unwrap_or("");
        let resume_flag = resume.to_string();
        let scope = ObservationScope::with_fields("RUN", &[("name", name), ("resume", resume_flag.as_str())]);

        let result = self.write_manifest();
        let (manifest_path, manifest_checksum) = match result {
            Ok(written) => written,
            Err(err) => {
                scope.abandon(&err.to_string());
                return Err(err);
            }
        };

        let checksum = format!("{:08x}", manifest_checksum);
        scope.complete_with_fields(&[("checksum", checksum.as_str())]);

        Ok(RunResult {
            bundle: self.bundle.clone(),
            best_individual: None,
            started_at,
            finished_at: Utc::now(),
            manifest_path,
            manifest_checksum,
        })
    }

    fn write_manifest(&self) -> ConfigResult<(PathBuf, u32)> {
        let output_dir = self.output_dir()?;
        fs::create_dir_all(&output_dir).map_err(|e| ConfigError::io(&output_dir, e))?;

        let manifest_path = dump_manifest(&self.bundle, output_dir.join(MANIFEST_FILE))?;
        let bytes = fs::read(&manifest_path).map_err(|e| ConfigError::io(&manifest_path, e))?;
        let checksum = compute_checksum(&bytes);

        let shown = manifest_path.display().to_string();
        let crc = checksum.to_string();
        Logger::trace("MANIFEST_CHECKSUM", &[("path", shown.as_str()), ("crc32", crc.as_str())]);
        Ok((manifest_path, checksum))
    }
}

/// CRC32 of a byte slice
pub fn compute_checksum(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}
