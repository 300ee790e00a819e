//! Just-in-time context fetch: resolve a registry key and print its documents.

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};

use aiprotocol_markdown::extract_section;
use aiprotocol_shared::{ProtocolError, Result};

use crate::registry::Registry;

/// Outcome of a successful [`fetch_context`] call.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct FetchReport {
    /// Entries whose content (or extractor result) was written.
    pub printed: usize,
    /// Whole-file entries that could not be read.
    pub missing: Vec<PathBuf>,
}

/// Write the context for `key` to `out`, reporting soft misses to `err`.
///
/// Metadata keys, unknown keys, and keys with no usable entries fail before
/// anything is written. A missing whole-file entry is reported and skipped;
/// the remaining entries and the footer are still written.
#[instrument(skip(registry, root, out, err), fields(root = %root.display()))]
pub fn fetch_context<W: Write, E: Write>(
    key: &str,
    registry: &Registry,
    root: &Path,
    out: &mut W,
    err: &mut E,
) -> Result<FetchReport> {
    let entries = registry.resolve(key)?;
    let mut report = FetchReport::default();

    writeln!(out, "--- Context: {key} ---").map_err(stdout_error)?;

    for entry in &entries {
        let file_path = root.join(&entry.file);

        if let Some(section) = &entry.section {
            writeln!(out, "{}", extract_section(&file_path, section)).map_err(stdout_error)?;
            report.printed += 1;
            continue;
        }

        if !file_path.exists() {
            warn!(path = %file_path.display(), "context file not found");
            writeln!(err, "Error: File not found: {}", file_path.display()).map_err(stderr_error)?;
            report.missing.push(file_path);
            continue;
        }

        match std::fs::read_to_string(&file_path) {
            Ok(content) => {
                writeln!(out, "{content}").map_err(stdout_error)?;
                report.printed += 1;
            }
            Err(e) => {
                warn!(path = %file_path.display(), error = %e, "context file unreadable");
                writeln!(err, "Error reading {}: {e}", file_path.display())
                    .map_err(stderr_error)?;
                report.missing.push(file_path);
            }
        }
    }

    writeln!(out, "\n--- End of Context ---").map_err(stdout_error)?;

    info!(
        key,
        printed = report.printed,
        missing = report.missing.len(),
        "context fetched"
    );
    Ok(report)
}

fn stdout_error(e: std::io::Error) -> ProtocolError {
    ProtocolError::io("<stdout>", e)
}

fn stderr_error(e: std::io::Error) -> ProtocolError {
    ProtocolError::io("<stderr>", e)
}
