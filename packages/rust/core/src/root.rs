//! Repository root resolution.
//!
//! Tiers, in order: `git rev-parse --show-toplevel` (bounded by a timeout),
//! an explicit override directory (`REPO_ROOT`), then the working directory.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, instrument};

/// Resolve the repository root for `cwd`.
///
/// Every failure (git missing, not a checkout, timeout, override absent)
/// falls through to the next tier; this never errors.
#[instrument(skip_all, fields(cwd = %cwd.display()))]
pub async fn resolve_repo_root(
    cwd: &Path,
    override_root: Option<&Path>,
    timeout: Duration,
) -> PathBuf {
    if let Some(root) = git_toplevel(cwd, timeout).await {
        debug!(root = %root.display(), "root from git");
        return root;
    }

    if let Some(root) = override_root.and_then(|p| std::fs::canonicalize(p).ok()) {
        debug!(root = %root.display(), "root from override");
        return root;
    }

    debug!("root from working directory");
    cwd.to_path_buf()
}

/// Ask git for the checkout's top-level directory. The child is killed if
/// it outlives `timeout`.
async fn git_toplevel(cwd: &Path, timeout: Duration) -> Option<PathBuf> {
    let child = Command::new("git")
        .args(["rev-parse", "--show-toplevel"])
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .inspect_err(|e| debug!(error = %e, "git not available"))
        .ok()?;

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            debug!(error = %e, "failed waiting for git");
            return None;
        }
        Err(_) => {
            debug!(?timeout, "git timed out");
            return None;
        }
    };

    if !output.status.success() {
        return None;
    }

    let stdout = String::from_utf8(output.stdout).ok()?;
    let top = stdout.trim();
    (!top.is_empty()).then(|| PathBuf::from(top))
}
