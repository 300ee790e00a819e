//! Core domain logic for ai-protocol.
//!
//! Registry loading and normalization, context fetch, repository root
//! resolution, version drift checks, protocol bootstrap, and validation.
//! Nothing here exits the process; the CLI maps results to exit codes.

pub mod bootstrap;
pub mod context;
pub mod drift;
pub mod registry;
pub mod root;
pub mod validate;

pub use context::{FetchReport, fetch_context};
pub use registry::{Registry, normalize_entries};
pub use root::resolve_repo_root;
