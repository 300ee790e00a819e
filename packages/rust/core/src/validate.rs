//! Consistency checks for registries and the shipped template payload.

use std::fmt;
use std::path::Path;

use tracing::{debug, instrument};

use aiprotocol_markdown::extract_section_from_str;
use aiprotocol_shared::{ProtocolError, Result, TEMPLATES_DIR};

use crate::bootstrap::{BOOTLOADER_TEMPLATE, PAYLOAD_FILES, SUBMODULE_TEMPLATE};
use crate::drift::read_protocol_version;
use crate::registry::{Registry, normalize_entries, registry_path};

/// A single consistency problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    /// Registry key the problem belongs to, if any.
    pub key: Option<String>,
    pub message: String,
}

impl Issue {
    fn keyed(key: &str, message: impl Into<String>) -> Self {
        Self {
            key: Some(key.to_string()),
            message: message.into(),
        }
    }

    fn general(message: impl Into<String>) -> Self {
        Self {
            key: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            Some(key) => write!(f, "[{key}] {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Check that every content key resolves to real files and sections under `root`.
#[instrument(skip_all, fields(root = %root.display()))]
pub fn check_registry(registry: &Registry, root: &Path) -> Vec<Issue> {
    let mut issues = Vec::new();

    for key in registry.content_keys() {
        let entries = registry.get(key).map(normalize_entries).unwrap_or_default();
        if entries.is_empty() {
            issues.push(Issue::keyed(key, "value has no usable entries"));
            continue;
        }

        for entry in entries {
            let path = root.join(&entry.file);
            if !path.is_file() {
                issues.push(Issue::keyed(key, format!("file not found: {}", entry.file)));
                continue;
            }

            let Some(section) = &entry.section else {
                continue;
            };
            match std::fs::read_to_string(&path) {
                Ok(content) if extract_section_from_str(&content, section).is_none() => {
                    issues.push(Issue::keyed(
                        key,
                        format!("section '{section}' not found in {}", entry.file),
                    ));
                }
                Ok(_) => {}
                Err(e) => issues.push(Issue::keyed(key, format!("cannot read {}: {e}", entry.file))),
            }
        }
    }

    debug!(issues = issues.len(), "registry checked");
    issues
}

/// Check the template payload under `protocol_root/templates`.
///
/// Covers manifest completeness, the template registry, and agreement
/// between `VERSION` and the registry's `_meta.protocol_version`.
#[instrument(skip_all, fields(root = %protocol_root.display()))]
pub fn check_templates(protocol_root: &Path) -> Result<Vec<Issue>> {
    let templates_root = protocol_root.join(TEMPLATES_DIR);
    if !templates_root.is_dir() {
        return Err(ProtocolError::TemplateMissing {
            path: templates_root,
        });
    }

    let mut issues: Vec<Issue> = [BOOTLOADER_TEMPLATE, SUBMODULE_TEMPLATE]
        .iter()
        .chain(PAYLOAD_FILES)
        .filter(|f| !templates_root.join(f).is_file())
        .map(|f| Issue::general(format!("missing template: {f}")))
        .collect();

    let registry = Registry::load(&registry_path(&templates_root))?;
    issues.extend(check_registry(&registry, &templates_root));

    let file_version = read_protocol_version(protocol_root);
    let meta_version = registry.meta().protocol_version;
    match (file_version, meta_version) {
        (None, _) => issues.push(Issue::general("VERSION file not found")),
        (Some(file), Some(meta)) if file == meta => {}
        (Some(file), meta) => issues.push(Issue::general(format!(
            "version mismatch: VERSION={file}, _meta.protocol_version={}",
            meta.as_deref().unwrap_or("<missing>")
        ))),
    }

    Ok(issues)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aiprotocol_shared::REGISTRY_FILE;
    use serde_json::json;

    fn registry(value: serde_json::Value) -> Registry {
        Registry::from_value(value).unwrap()
    }

    #[test]
    fn clean_registry_has_no_issues() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.md"), "## Intro\nhi\n").unwrap();
        let reg = registry(json!({
            "_meta": {"protocol_version": "1.0.0"},
            "whole": "a.md",
            "part": {"file": "a.md", "section": "intro"},
        }));
        assert!(check_registry(&reg, dir.path()).is_empty());
    }

    #[test]
    fn reports_missing_files_sections_and_empty_values() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.md"), "## Intro\nhi\n").unwrap();
        let reg = registry(json!({
            "gone": "missing.md",
            "bad_section": {"file": "a.md", "section": "Nowhere"},
            "empty": {"description": "no file"},
        }));

        let issues = check_registry(&reg, dir.path());
        let rendered: Vec<String> = issues.iter().map(ToString::to_string).collect();
        assert_eq!(issues.len(), 3);
        assert!(rendered[0].starts_with("[gone] file not found"));
        assert!(rendered[1].contains("section 'Nowhere' not found"));
        assert!(rendered[2].contains("no usable entries"));
    }

    #[test]
    fn templates_version_mismatch_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let templates = dir.path().join(TEMPLATES_DIR);
        std::fs::create_dir_all(templates.join("docs")).unwrap();
        std::fs::write(dir.path().join("VERSION"), "2.0.0\n").unwrap();
        std::fs::write(
            templates.join(REGISTRY_FILE),
            r#"{"_meta": {"protocol_version": "1.0.0"}}"#,
        )
        .unwrap();

        let issues = check_templates(dir.path()).unwrap();
        assert!(issues.iter().any(|i| i.message.contains("version mismatch")));
        assert!(issues.iter().any(|i| i.message == "missing template: PROTOCOL.md"));
    }

    #[test]
    fn missing_templates_dir_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            check_templates(dir.path()),
            Err(ProtocolError::TemplateMissing { .. })
        ));
    }
}
