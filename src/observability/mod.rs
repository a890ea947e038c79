//! Observability for gapx
//!
//! Structured JSON logging on stderr with a process-wide severity
//! threshold, plus scope-based begin/complete events.
//!
//! The threshold defaults to WARN and is read from `GAPX_LOG` by
//! `init_from_env`; the CLI `--log-level` flag overrides it.
//!
//! ```ignore
//! use gapx::observability::{Logger, ObservationScope};
//!
//! Logger::info("MANIFEST_WRITTEN", &[("path", "out/manifest.json")]);
//!
//! let scope = ObservationScope::new("RUN");
//! // ... do work ...
//! scope.complete();
//! ```

mod logger;
mod scope;

pub use logger::{Logger, Severity};
pub use scope::ObservationScope;

/// Environment variable holding the log threshold
pub const LOG_ENV: &str = "GAPX_LOG";

/// Applies `GAPX_LOG` if it is set to a known level. Unknown values are
/// reported and ignored.
pub fn init_from_env() {
    let Ok(raw) = std::env::var(LOG_ENV) else {
        return;
    };
    match raw.parse::<Severity>() {
        Ok(severity) => Logger::set_threshold(severity),
        Err(reason) => Logger::warn("LOG_LEVEL_IGNORED", &[("reason", reason.as_str())]),
    }
}
