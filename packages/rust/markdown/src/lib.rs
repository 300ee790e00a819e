//! Markdown section extraction.
//!
//! Pulls a single header's section (nested subsections included) out of a
//! markdown document. Fenced code blocks are respected so `#` comments in
//! code samples never end a section early.

mod heading;

use std::path::Path;

use tracing::{debug, instrument};

use aiprotocol_shared::SECTION_NOT_FOUND;

pub use heading::{Heading, is_fence, parse_heading};

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Extract the section headed by `header_title` from a markdown file.
///
/// Never fails: a missing or unreadable file yields an `Error: ...` string
/// and a miss yields [`SECTION_NOT_FOUND`], so callers can print the result
/// inline either way.
#[instrument(skip_all, fields(path = %file_path.display(), title = header_title))]
pub fn extract_section(file_path: &Path, header_title: &str) -> String {
    if !file_path.exists() {
        return format!("Error: File not found: {}", file_path.display());
    }

    let content = match std::fs::read_to_string(file_path) {
        Ok(content) => content,
        Err(e) => return format!("Error reading {}: {e}", file_path.display()),
    };

    extract_section_from_str(&content, header_title)
        .unwrap_or_else(|| SECTION_NOT_FOUND.to_string())
}

/// Extract a section from in-memory markdown.
///
/// The first header (outside code fences) whose title contains the trimmed,
/// lower-cased query starts the capture. Capture ends just before the next
/// header at the same or a shallower level. Returns `None` if no header
/// matched.
pub fn extract_section_from_str(content: &str, header_title: &str) -> Option<String> {
    let query = header_title.trim().to_lowercase();

    let mut captured = String::new();
    let mut capturing = false;
    let mut target_level = 0;
    let mut in_code_block = false;

    for line in content.split_inclusive('\n') {
        // Toggle first: a fence line is never a header, and headers are
        // only suppressed strictly between fence pairs.
        if is_fence(line) {
            in_code_block = !in_code_block;
        }

        if !in_code_block {
            if let Some(heading) = parse_heading(line) {
                if !capturing && heading.matches(&query) {
                    debug!(level = heading.level, title = %heading.title, "section matched");
                    capturing = true;
                    target_level = heading.level;
                    captured.push_str(line);
                    continue;
                }
                if capturing && heading.level <= target_level {
                    break;
                }
            }
        }

        if capturing {
            captured.push_str(line);
        }
    }

    capturing.then(|| captured.trim_end().to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
