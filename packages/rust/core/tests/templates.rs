//! Checks against the template payload shipped at the workspace root.

use std::path::{Path, PathBuf};

use aiprotocol_core::bootstrap::{BootstrapOptions, PAYLOAD_FILES, bootstrap};
use aiprotocol_core::drift::{DriftStatus, check_drift, read_protocol_version};
use aiprotocol_core::validate::check_templates;
use aiprotocol_core::{Registry, fetch_context};
use aiprotocol_shared::{REGISTRY_FILE, TEMPLATES_DIR};

fn protocol_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../..")
}

fn templates_root() -> PathBuf {
    protocol_root().join(TEMPLATES_DIR)
}

#[test]
fn shipped_templates_are_consistent() {
    let issues = check_templates(&protocol_root()).expect("templates present");
    assert!(issues.is_empty(), "template issues: {issues:#?}");
}

#[test]
fn shipped_version_is_set() {
    assert!(read_protocol_version(&protocol_root()).is_some());
}

#[test]
fn progress_template_is_generic() {
    let content = std::fs::read_to_string(templates_root().join("docs/PROGRESS.md")).unwrap();
    for term in ["ai-protocol", "bootstrap"] {
        assert!(!content.contains(term), "PROGRESS.md mentions '{term}'");
    }
}

#[test]
fn bootstrapped_project_matches_protocol_version() {
    let target = tempfile::tempdir().unwrap();
    let opts = BootstrapOptions {
        target: target.path().to_path_buf(),
        agent: "claude".into(),
        force: false,
        submodule: None,
    };

    let report = bootstrap(&templates_root(), &opts).unwrap();
    assert_eq!(report.created(), PAYLOAD_FILES.len() + 1);
    assert!(target.path().join("CLAUDE.md").is_file());

    let status = check_drift(&protocol_root(), target.path()).unwrap();
    assert!(matches!(status, DriftStatus::Match { .. }), "got {status:?}");
}

#[test]
fn every_shipped_key_fetches_from_a_bootstrapped_project() {
    let target = tempfile::tempdir().unwrap();
    let opts = BootstrapOptions {
        target: target.path().to_path_buf(),
        agent: "gemini".into(),
        force: false,
        submodule: None,
    };
    bootstrap(&templates_root(), &opts).unwrap();

    let registry = Registry::load(&target.path().join(REGISTRY_FILE)).unwrap();
    let keys: Vec<String> = registry.content_keys().map(String::from).collect();
    assert!(!keys.is_empty());

    for key in keys {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let report = fetch_context(&key, &registry, target.path(), &mut out, &mut err).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(report.missing.is_empty(), "{key}: {:?}", report.missing);
        assert!(!out.contains("Section not found."), "{key}: section missing");
        assert!(!out.contains("Error: File not found"), "{key}: {out}");
    }
}
