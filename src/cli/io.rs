//! Text and JSON output for the CLI
//!
//! Command output goes to the given writer (stdout in the binary); logs
//! stay on stderr.

use std::io::Write;

use serde::Serialize;

use super::errors::CliResult;

/// Writes one line
pub fn write_line<W: Write>(out: &mut W, line: &str) -> CliResult<()> {
    writeln!(out, "{}", line)?;
    Ok(())
}

/// Writes pretty-printed JSON followed by a newline
pub fn write_json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> CliResult<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

/// Writes a two-column table under a title, left-aligned on the widest
/// first-column entry.
pub fn write_table<W: Write>(out: &mut W, title: &str, header: (&str, &str), rows: &[(&str, String)]) -> CliResult<()> {
    let width = rows
        .iter()
        .map(|(label, _)| label.len())
        .chain(std::iter::once(header.0.len()))
        .max()
        .unwrap_or(0);

    writeln!(out, "{}", title)?;
    writeln!(out, "{:<width$}  {}", header.0, header.1, width = width)?;
    writeln!(out, "{}  {}", "-".repeat(width), "-".repeat(header.1.len().max(7)))?;
    for (label, details) in rows {
        writeln!(out, "{:<width$}  {}", label, details, width = width)?;
    }
    out.flush()?;
    Ok(())
}
