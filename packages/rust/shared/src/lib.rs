//! Shared types, error model, and configuration for ai-protocol.
//!
//! This crate is the foundation depended on by all other ai-protocol crates.
//! It provides:
//! - [`ProtocolError`] — the unified error type
//! - Domain types ([`ContextEntry`], [`ProtocolMeta`]) and well-known paths
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, ProtocolConfig, config_dir, config_file_path, init_config,
    init_config_in, load_config, load_config_from,
};
pub use error::{ProtocolError, Result};
pub use types::{
    ContextEntry, META_KEY, ProtocolMeta, REGISTRY_FILE, SECTION_NOT_FOUND, TEMPLATES_DIR,
    VERSION_FILE, is_meta_key,
};
