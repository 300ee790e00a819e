//! Error types for ai-protocol.
//!
//! Library crates use [`ProtocolError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` and decides the process exit code.

use std::path::PathBuf;

/// Top-level error type for all ai-protocol operations.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The context registry file does not exist (project never bootstrapped).
    #[error("registry not found: {}", path.display())]
    RegistryNotFound { path: PathBuf },

    /// The context registry exists but is not a valid JSON object.
    #[error("invalid JSON in registry {}: {message}", path.display())]
    InvalidRegistry { path: PathBuf, message: String },

    /// Unknown key, or a reserved `_`-prefixed metadata key.
    #[error("key not found: {key}")]
    KeyNotFound { key: String },

    /// The key exists but its value yields no usable entries.
    #[error("key not found or invalid: {key}")]
    InvalidEntry { key: String },

    /// Target directory missing or not a directory.
    #[error("target directory does not exist or is not a directory: {}", path.display())]
    TargetNotFound { path: PathBuf },

    /// A required template file or directory is missing.
    #[error("template not found: {}", path.display())]
    TemplateMissing { path: PathBuf },

    /// Data validation error.
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ProtocolError>;

impl ProtocolError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a key-not-found error.
    pub fn key_not_found(key: impl Into<String>) -> Self {
        Self::KeyNotFound { key: key.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = ProtocolError::config("missing home directory");
        assert_eq!(err.to_string(), "config error: missing home directory");

        let err = ProtocolError::key_not_found("_meta");
        assert_eq!(err.to_string(), "key not found: _meta");
    }

    #[test]
    fn registry_errors_are_distinguishable() {
        let missing = ProtocolError::RegistryNotFound {
            path: PathBuf::from("docs/context_registry.json"),
        };
        let corrupt = ProtocolError::InvalidRegistry {
            path: PathBuf::from("docs/context_registry.json"),
            message: "expected value at line 1 column 2".into(),
        };
        assert!(missing.to_string().starts_with("registry not found"));
        assert!(corrupt.to_string().starts_with("invalid JSON in registry"));
        assert!(corrupt.to_string().contains("line 1 column 2"));
    }
}
