//! Protocol version drift between the protocol root and a bootstrapped target.
//!
//! Read-only: compares `VERSION` with the target registry's
//! `_meta.protocol_version` and never modifies either side.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use aiprotocol_shared::{ProtocolError, Result, VERSION_FILE};

use crate::registry::{Registry, registry_path};

/// Result of comparing protocol and target versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriftStatus {
    /// Versions are equal.
    Match { version: String },
    /// Versions differ; the target should be refreshed.
    Drift { protocol: String, target: String },
    /// The target has no registry or no `_meta.protocol_version`.
    TargetUnversioned,
    /// The protocol root has no usable `VERSION` file; nothing to compare.
    ProtocolUnversioned,
}

impl DriftStatus {
    /// Only an actual drift is a failure; everything else is advisory.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Drift { .. })
    }
}

/// Read the protocol version (`VERSION`, trimmed). Missing or empty is `None`.
pub fn read_protocol_version(protocol_root: &Path) -> Option<String> {
    let content = std::fs::read_to_string(protocol_root.join(VERSION_FILE)).ok()?;
    let version = content.trim();
    (!version.is_empty()).then(|| version.to_string())
}

/// Read the target's registered protocol version.
///
/// Missing, unreadable, or malformed registries all read as `None`.
pub fn read_target_version(target_root: &Path) -> Option<String> {
    let path = registry_path(target_root);
    match Registry::load(&path) {
        Ok(registry) => registry.meta().protocol_version,
        Err(e) => {
            debug!(error = %e, "target registry unavailable");
            None
        }
    }
}

/// Compare the protocol root's version against the target's.
#[instrument(skip_all, fields(target = %target_root.display()))]
pub fn check_drift(protocol_root: &Path, target_root: &Path) -> Result<DriftStatus> {
    if !target_root.is_dir() {
        return Err(ProtocolError::TargetNotFound {
            path: PathBuf::from(target_root),
        });
    }

    let Some(protocol) = read_protocol_version(protocol_root) else {
        return Ok(DriftStatus::ProtocolUnversioned);
    };
    let Some(target) = read_target_version(target_root) else {
        return Ok(DriftStatus::TargetUnversioned);
    };

    let status = if protocol == target {
        DriftStatus::Match { version: protocol }
    } else {
        DriftStatus::Drift { protocol, target }
    };
    info!(?status, "drift check complete");
    Ok(status)
}
