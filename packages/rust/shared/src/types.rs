//! Core domain types for ai-protocol registries and payloads.

use serde::{Deserialize, Serialize};

/// Registry location relative to a project root.
pub const REGISTRY_FILE: &str = "docs/context_registry.json";

/// Plain-text protocol version file at the protocol root.
pub const VERSION_FILE: &str = "VERSION";

/// Directory under the protocol root holding the injected payload.
pub const TEMPLATES_DIR: &str = "templates";

/// Registry key holding protocol bookkeeping.
pub const META_KEY: &str = "_meta";

/// Sentinel returned by section extraction when no header matched.
pub const SECTION_NOT_FOUND: &str = "Section not found.";

/// Whether a registry key is reserved metadata (never fetchable or listed).
pub fn is_meta_key(key: &str) -> bool {
    key.starts_with('_')
}

// ---------------------------------------------------------------------------
// ContextEntry
// ---------------------------------------------------------------------------

/// A normalized registry entry: one file, optionally narrowed to a section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextEntry {
    /// Path relative to the repository root.
    pub file: String,
    /// Header title to extract (substring, case-insensitive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

impl ContextEntry {
    /// Entry covering a whole file.
    pub fn whole(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            section: None,
        }
    }

    /// Entry narrowed to one section of a file.
    pub fn section(file: impl Into<String>, section: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            section: Some(section.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// ProtocolMeta
// ---------------------------------------------------------------------------

/// The `_meta` object of a context registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolMeta {
    /// Protocol version the project was bootstrapped with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol_version: Option<String>,
}
