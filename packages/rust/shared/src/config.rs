//! Application configuration for ai-protocol.
//!
//! User config lives at `~/.ai-protocol/ai-protocol.toml`.
//! CLI flags and environment override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "ai-protocol.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".ai-protocol";

// ---------------------------------------------------------------------------
// Config structs (matching ai-protocol.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Where the protocol payload lives.
    #[serde(default)]
    pub protocol: ProtocolConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Agent name used by bootstrap when `--agent` is omitted.
    #[serde(default = "default_agent")]
    pub agent: String,

    /// Upper bound on the `git rev-parse` call during root resolution.
    #[serde(default = "default_git_timeout_secs")]
    pub git_timeout_secs: u64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            agent: default_agent(),
            git_timeout_secs: default_git_timeout_secs(),
        }
    }
}

fn default_agent() -> String {
    "GEMINI".into()
}
fn default_git_timeout_secs() -> u64 {
    5
}

/// `[protocol]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// Protocol root containing `VERSION` and `templates/`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
}

impl AppConfig {
    /// Timeout applied to the version-control root query.
    pub fn git_timeout(&self) -> Duration {
        Duration::from_secs(self.defaults.git_timeout_secs)
    }

    /// Resolve the protocol root: explicit override, then config, then `cwd`.
    pub fn protocol_root(&self, flag: Option<&Path>, cwd: &Path) -> PathBuf {
        if let Some(p) = flag {
            return p.to_path_buf();
        }
        match &self.protocol.root {
            Some(root) if !root.is_empty() => PathBuf::from(root),
            _ => cwd.to_path_buf(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.ai-protocol/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ProtocolError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.ai-protocol/ai-protocol.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ProtocolError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        ProtocolError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    init_config_in(&dir)
}

/// Write a default config file into `dir`, creating it if needed.
pub fn init_config_in(dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|e| ProtocolError::io(dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| ProtocolError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ProtocolError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
