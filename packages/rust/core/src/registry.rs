//! Context registry loading and entry normalization.
//!
//! The registry maps lookup keys to one or more documentation locations.
//! Values arrive in three shapes (string, `{file, section?}` object, or a
//! list mixing both) and are flattened by [`normalize_entries`] before
//! anything else looks at them.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

use aiprotocol_shared::{
    ContextEntry, META_KEY, ProtocolError, ProtocolMeta, REGISTRY_FILE, Result, is_meta_key,
};

/// A loaded context registry. Immutable once loaded; key order follows the file.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: Map<String, Value>,
}

impl Registry {
    /// Load a registry from disk.
    ///
    /// A missing file and a malformed file produce different errors
    /// ([`ProtocolError::RegistryNotFound`] vs [`ProtocolError::InvalidRegistry`]).
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ProtocolError::RegistryNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| ProtocolError::io(path, e))?;
        let invalid = |message: String| ProtocolError::InvalidRegistry {
            path: path.to_path_buf(),
            message,
        };

        let value: Value = serde_json::from_str(&content).map_err(|e| invalid(e.to_string()))?;
        let registry = match value {
            Value::Object(entries) => Self { entries },
            other => return Err(invalid(not_an_object(&other))),
        };

        debug!(keys = registry.entries.len(), "registry loaded");
        Ok(registry)
    }

    /// Build a registry from an already-parsed JSON value (must be an object).
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(entries) => Ok(Self { entries }),
            other => Err(ProtocolError::validation(not_an_object(&other))),
        }
    }

    /// Raw value stored under `key`, metadata keys included.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Fetchable keys in file order (metadata keys excluded).
    pub fn content_keys(&self) -> impl Iterator<Item = &str> {
        self.entries
            .keys()
            .map(String::as_str)
            .filter(|key| !is_meta_key(key))
    }

    /// The `_meta` block. Absent or malformed fields read as `None`.
    pub fn meta(&self) -> ProtocolMeta {
        let protocol_version = self
            .entries
            .get(META_KEY)
            .and_then(|meta| meta.get("protocol_version"))
            .and_then(Value::as_str)
            .filter(|v| !v.is_empty())
            .map(String::from);

        ProtocolMeta { protocol_version }
    }

    /// Resolve a content key to its normalized entries.
    ///
    /// Metadata keys and unknown keys are [`ProtocolError::KeyNotFound`];
    /// a present key whose value yields nothing usable is
    /// [`ProtocolError::InvalidEntry`].
    pub fn resolve(&self, key: &str) -> Result<Vec<ContextEntry>> {
        if is_meta_key(key) {
            return Err(ProtocolError::key_not_found(key));
        }

        let value = self
            .entries
            .get(key)
            .ok_or_else(|| ProtocolError::key_not_found(key))?;

        let entries = normalize_entries(value);
        if entries.is_empty() {
            return Err(ProtocolError::InvalidEntry { key: key.into() });
        }
        Ok(entries)
    }
}

/// Path of the registry under a repository root.
pub fn registry_path(root: &Path) -> PathBuf {
    root.join(REGISTRY_FILE)
}

fn not_an_object(value: &Value) -> String {
    format!("registry must be a JSON object, found {}", json_kind(value))
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Flatten any registry value into an ordered list of entries.
///
/// Total and pure: unusable items (non-string scalars, objects without a
/// non-empty string `file`) are dropped, never reported as errors.
pub fn normalize_entries(value: &Value) -> Vec<ContextEntry> {
    match value {
        Value::String(_) | Value::Object(_) => entry_from_item(value).into_iter().collect(),
        Value::Array(items) => items.iter().filter_map(entry_from_item).collect(),
        other => {
            debug!(kind = json_kind(other), "registry value has no entries");
            Vec::new()
        }
    }
}

fn entry_from_item(item: &Value) -> Option<ContextEntry> {
    match item {
        Value::String(file) if !file.is_empty() => Some(ContextEntry::whole(file.as_str())),
        Value::Object(obj) => {
            let Some(file) = obj.get("file").and_then(Value::as_str).filter(|f| !f.is_empty())
            else {
                warn!("dropping registry object without a file");
                return None;
            };
            let section = obj
                .get("section")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(String::from);
            Some(ContextEntry {
                file: file.to_string(),
                section,
            })
        }
        other => {
            debug!(kind = json_kind(other), "dropping registry item");
            None
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn registry(value: Value) -> Registry {
        Registry::from_value(value).unwrap()
    }

    // --- normalize_entries ---

    #[test]
    fn normalizes_string() {
        assert_eq!(normalize_entries(&json!("file.md")), vec![ContextEntry::whole("file.md")]);
    }

    #[test]
    fn normalizes_object_with_file() {
        assert_eq!(
            normalize_entries(&json!({"file": "a.md", "section": "Intro"})),
            vec![ContextEntry::section("a.md", "Intro")]
        );
    }

    #[test]
    fn object_without_file_is_empty() {
        assert_eq!(normalize_entries(&json!({"description": "meta stuff"})), Vec::<ContextEntry>::new());
    }

    #[test]
    fn normalizes_mixed_list_in_order() {
        assert_eq!(
            normalize_entries(&json!(["a.md", {"file": "b.md"}, {"file": "c.md", "section": "X"}])),
            vec![
                ContextEntry::whole("a.md"),
                ContextEntry::whole("b.md"),
                ContextEntry::section("c.md", "X"),
            ]
        );
    }

    #[test]
    fn drops_invalid_list_items() {
        assert_eq!(
            normalize_entries(&json!([42, {"no_file": true}, null, ["nested.md"], "ok.md"])),
            vec![ContextEntry::whole("ok.md")]
        );
    }

    #[test]
    fn scalars_yield_nothing() {
        for value in [json!(42), json!(true), json!(null), json!(1.5)] {
            assert_eq!(normalize_entries(&value), Vec::<ContextEntry>::new());
        }
    }

    #[test]
    fn never_invents_file_paths() {
        let value = json!(["", {"file": ""}, {"file": 7}, {"file": null, "section": "S"}]);
        assert_eq!(normalize_entries(&value), Vec::<ContextEntry>::new());
        assert_eq!(normalize_entries(&json!("")), Vec::<ContextEntry>::new());
    }

    #[test]
    fn empty_or_non_string_section_means_whole_file() {
        assert_eq!(
            normalize_entries(&json!([{"file": "a.md", "section": ""}, {"file": "b.md", "section": 3}])),
            vec![ContextEntry::whole("a.md"), ContextEntry::whole("b.md")]
        );
    }

    // --- Registry ---

    #[test]
    fn content_keys_skip_meta_and_keep_order() {
        let reg = registry(json!({
            "_meta": {"protocol_version": "1.0.0"},
            "zeta": "z.md",
            "alpha": "a.md",
            "_private": "p.md",
        }));
        let keys: Vec<&str> = reg.content_keys().collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
    }

    #[test]
    fn meta_version_is_read() {
        let reg = registry(json!({"_meta": {"protocol_version": "2.1.0"}}));
        assert_eq!(reg.meta().protocol_version.as_deref(), Some("2.1.0"));

        let reg = registry(json!({"_meta": {"protocol_version": 2}}));
        assert_eq!(reg.meta().protocol_version, None);

        let reg = registry(json!({"key": "value"}));
        assert_eq!(reg.meta(), ProtocolMeta::default());
    }

    #[test]
    fn resolve_rejects_meta_unknown_and_unusable() {
        let reg = registry(json!({
            "_meta": {"protocol_version": "1.0.0"},
            "broken": {"description": "no file"},
            "ok": "ok.md",
        }));
        assert!(matches!(reg.resolve("_meta"), Err(ProtocolError::KeyNotFound { .. })));
        assert!(matches!(reg.resolve("missing"), Err(ProtocolError::KeyNotFound { .. })));
        assert!(matches!(reg.resolve("broken"), Err(ProtocolError::InvalidEntry { .. })));
        assert_eq!(reg.resolve("ok").unwrap(), vec![ContextEntry::whole("ok.md")]);
    }

    #[test]
    fn non_object_registry_is_rejected() {
        assert!(Registry::from_value(json!(["a.md"])).is_err());
    }

    // --- Loading ---

    #[test]
    fn load_valid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reg.json");
        std::fs::write(&path, r#"{"key": "value"}"#).unwrap();
        let reg = Registry::load(&path).unwrap();
        assert_eq!(reg.get("key"), Some(&json!("value")));
    }

    #[test]
    fn load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Registry::load(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, ProtocolError::RegistryNotFound { .. }));
    }

    #[test]
    fn load_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not valid json").unwrap();
        let err = Registry::load(&path).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidRegistry { .. }));
        assert!(err.to_string().contains("bad.json"));
    }

    #[test]
    fn load_non_object_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("list.json");
        std::fs::write(&path, "[1, 2]").unwrap();
        let err = Registry::load(&path).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidRegistry { .. }));

        let message = err.to_string();
        assert!(message.contains("registry must be a JSON object, found array"), "{message}");
        assert!(!message.contains("validation error"), "{message}");
    }

    #[test]
    fn registry_path_is_fixed_under_root() {
        assert_eq!(
            registry_path(Path::new("/repo")),
            PathBuf::from("/repo/docs/context_registry.json")
        );
    }
}
