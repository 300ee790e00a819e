//! Protocol injection into a target project.
//!
//! Copies a fixed manifest of template files from `templates/` into the
//! target, creating directories as needed. Existing files are left alone
//! unless `force` is set.

use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};

use aiprotocol_shared::{ProtocolError, Result};

/// Agent file template for a standalone project.
pub const BOOTLOADER_TEMPLATE: &str = "PROTOCOL_BOOTLOADER.md";

/// Thin agent file template for a monorepo submodule delegating to its root.
pub const SUBMODULE_TEMPLATE: &str = "AGENT_SUBMODULE.md";

/// Payload copied verbatim (same relative path on both sides).
pub const PAYLOAD_FILES: &[&str] = &[
    "SCRIPTS-CATALOG.md",
    "PROTOCOL.md",
    "docs/CODING_STANDARDS.md",
    "docs/TESTING.md",
    "docs/PROGRESS.md",
    "docs/context_registry.json",
    "docs/requirements/TEMPLATE.md",
];

const MODULE_NAME_PLACEHOLDER: &str = "{{MODULE_NAME}}";
const DESCRIPTION_PLACEHOLDER: &str = "{{ONE_LINE_DESCRIPTION}}";

// ---------------------------------------------------------------------------
// Options & report
// ---------------------------------------------------------------------------

/// Configuration for a single bootstrap run.
#[derive(Debug, Clone)]
pub struct BootstrapOptions {
    /// Project directory receiving the payload.
    pub target: PathBuf,
    /// Agent name; the agent file is `<AGENT>.md`.
    pub agent: String,
    /// Overwrite existing destination files.
    pub force: bool,
    /// Use the submodule agent template (with optional placeholder values).
    pub submodule: Option<SubmoduleOptions>,
}

/// Placeholder values for the submodule agent template.
#[derive(Debug, Clone, Default)]
pub struct SubmoduleOptions {
    /// Replaces `{{MODULE_NAME}}`.
    pub module_name: Option<String>,
    /// Replaces `{{ONE_LINE_DESCRIPTION}}`.
    pub description: Option<String>,
}

/// What happened to one manifest entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Created,
    Overwritten,
    /// Destination existed and `force` was not set.
    Skipped,
    /// Template source absent; entry ignored.
    MissingSource,
    Failed(String),
}

/// Per-file line of a [`BootstrapReport`].
#[derive(Debug, Clone)]
pub struct FileReport {
    /// Destination path relative to the target.
    pub dest: String,
    pub outcome: FileOutcome,
}

/// Result of [`bootstrap`].
#[derive(Debug)]
pub struct BootstrapReport {
    /// Agent file name written into the target (e.g. `CLAUDE.md`).
    pub agent_file: String,
    /// Outcomes in manifest order.
    pub files: Vec<FileReport>,
    /// Whether placeholders were substituted in the agent file.
    pub substituted: bool,
}

impl BootstrapReport {
    /// Files written (created or overwritten).
    pub fn created(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.outcome, FileOutcome::Created | FileOutcome::Overwritten))
            .count()
    }

    /// Files left untouched because they already existed.
    pub fn skipped(&self) -> usize {
        self.files
            .iter()
            .filter(|f| f.outcome == FileOutcome::Skipped)
            .count()
    }
}

/// Agent file name for an agent, e.g. `claude` -> `CLAUDE.md`.
pub fn agent_file_name(agent: &str) -> String {
    format!("{}.md", agent.trim().to_uppercase())
}

/// The full `(source, destination)` manifest for an agent file.
pub fn manifest(agent_source: &str, agent_file: &str) -> Vec<(String, String)> {
    std::iter::once((agent_source.to_string(), agent_file.to_string()))
        .chain(PAYLOAD_FILES.iter().map(|f| (f.to_string(), f.to_string())))
        .collect()
}

// ---------------------------------------------------------------------------
// Bootstrap
// ---------------------------------------------------------------------------

/// Inject the protocol payload from `templates_root` into `opts.target`.
///
/// Fails only when the target, the templates directory, or the agent
/// template is missing. Per-file problems are recorded in the report.
#[instrument(skip_all, fields(target = %opts.target.display(), agent = %opts.agent))]
pub fn bootstrap(templates_root: &Path, opts: &BootstrapOptions) -> Result<BootstrapReport> {
    if !opts.target.is_dir() {
        return Err(ProtocolError::TargetNotFound {
            path: opts.target.clone(),
        });
    }
    if !templates_root.is_dir() {
        return Err(ProtocolError::TemplateMissing {
            path: templates_root.to_path_buf(),
        });
    }

    let agent_source = if opts.submodule.is_some() {
        SUBMODULE_TEMPLATE
    } else {
        BOOTLOADER_TEMPLATE
    };
    if !templates_root.join(agent_source).is_file() {
        return Err(ProtocolError::TemplateMissing {
            path: templates_root.join(agent_source),
        });
    }

    let agent_file = agent_file_name(&opts.agent);
    let files = manifest(agent_source, &agent_file)
        .into_iter()
        .map(|(src, dest)| {
            let outcome = install_file(
                &templates_root.join(&src),
                &opts.target.join(&dest),
                opts.force,
            );
            info!(dest = %dest, ?outcome, "payload file");
            FileReport { dest, outcome }
        })
        .collect();

    let substituted = match &opts.submodule {
        Some(sub) if sub.module_name.is_some() || sub.description.is_some() => {
            substitute_placeholders(&opts.target.join(&agent_file), sub)
        }
        _ => false,
    };

    Ok(BootstrapReport {
        agent_file,
        files,
        substituted,
    })
}

fn install_file(src: &Path, dest: &Path, force: bool) -> FileOutcome {
    if !src.is_file() {
        warn!(src = %src.display(), "template source missing");
        return FileOutcome::MissingSource;
    }

    if let Some(parent) = dest.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            return FileOutcome::Failed(e.to_string());
        }
    }

    let existed = dest.exists();
    if existed && !force {
        return FileOutcome::Skipped;
    }

    match std::fs::copy(src, dest) {
        Ok(_) if existed => FileOutcome::Overwritten,
        Ok(_) => FileOutcome::Created,
        Err(e) => FileOutcome::Failed(e.to_string()),
    }
}

fn substitute_placeholders(agent_path: &Path, sub: &SubmoduleOptions) -> bool {
    let mut content = match std::fs::read_to_string(agent_path) {
        Ok(content) => content,
        Err(e) => {
            warn!(path = %agent_path.display(), error = %e, "failed to substitute placeholders");
            return false;
        }
    };

    if let Some(name) = &sub.module_name {
        content = content.replace(MODULE_NAME_PLACEHOLDER, name);
    }
    if let Some(description) = &sub.description {
        content = content.replace(DESCRIPTION_PLACEHOLDER, description);
    }

    match std::fs::write(agent_path, content) {
        Ok(()) => true,
        Err(e) => {
            warn!(path = %agent_path.display(), error = %e, "failed to substitute placeholders");
            false
        }
    }
}
