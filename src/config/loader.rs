//! Configuration document loading and saving.
//!
//! # Design Decisions
//! - `load` returns the raw JSON object; migration and typing happen later
//! - A missing file is materialized from defaults immediately
//! - Output is canonical: keys sorted at every level, 4-space indent, trailing newline
//! - Writes go to a sibling temp file and are renamed into place, so a reader
//!   woken by the watcher never sees a half-written file

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Serializer, Value};
use std::fs;
use std::path::Path;

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::schema::{ConfigDefaults, Document};
use crate::environment::Environment;

/// Reads and writes the configuration file of an [`Environment`].
#[derive(Debug, Clone)]
pub struct DocumentStore {
    env: Environment,
}

impl DocumentStore {
    pub fn new(env: Environment) -> Self {
        Self { env }
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn path(&self) -> &Path {
        self.env.config_file()
    }

    /// Create the config, data, instances and snapshots directories if absent.
    pub fn ensure_directories(&self) -> ConfigResult<()> {
        for dir in self.env.required_dirs() {
            tracing::debug!(path = %dir.display(), "Checking directory");
            if !dir.is_dir() {
                tracing::info!(path = %dir.display(), "Creating directory");
                fs::create_dir_all(dir).map_err(|e| ConfigError::io(dir, e))?;
            }
        }
        Ok(())
    }

    /// Read the document as a raw JSON object, bootstrapping it from
    /// `defaults` when the file does not exist yet.
    pub fn load(&self, defaults: &ConfigDefaults) -> ConfigResult<Map<String, Value>> {
        let path = self.path();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                tracing::info!(path = %parent.display(), "No configuration directory found, creating it");
                fs::create_dir_all(parent).map_err(|e| ConfigError::io(parent, e))?;
            }
        }

        if !path.is_file() {
            tracing::info!(path = %path.display(), "No configuration file found, creating a new one");
            self.save(defaults.document())?;
            return match defaults.document().to_value().map_err(ConfigError::Serialize)? {
                Value::Object(object) => Ok(object),
                _ => Ok(Map::new()),
            };
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        serde_json::from_str(&content).map_err(|e| ConfigError::parse(path, e))
    }

    /// Write `document` in canonical form.
    /// Write `document` atomically and return the bytes now on disk.
    pub fn save(&self, document: &Document) -> ConfigResult<Vec<u8>> {
        let path = self.path();
        let bytes = render(document)?;

        let mut tmp_name = path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        tmp_name.push(".tmp");
        let tmp = path.with_file_name(tmp_name);

        fs::write(&tmp, &bytes).map_err(|e| ConfigError::io(&tmp, e))?;
        fs::rename(&tmp, path).map_err(|e| ConfigError::io(path, e))?;

        tracing::debug!(path = %path.display(), bytes = bytes.len(), "Configuration written");
        Ok(bytes)
    }
}

/// Canonical JSON rendering of a document.
pub fn render(document: &Document) -> ConfigResult<Vec<u8>> {
    let value = sort_keys(document.to_value().map_err(ConfigError::Serialize)?);

    let mut buf = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    value
        .serialize(&mut serializer)
        .map_err(ConfigError::Serialize)?;
    buf.push(b'\n');
    Ok(buf)
}

// Map ordering depends on serde_json features; rebuild every object in key order.
fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            Value::Object(entries.into_iter().map(|(k, v)| (k, sort_keys(v))).collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::Instance;
    use serde_json::json;

    fn store() -> (tempfile::TempDir, DocumentStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(Environment::rooted(dir.path()));
        (dir, store)
    }

    #[test]
    fn test_ensure_directories_is_idempotent() {
        let (_dir, store) = store();
        store.ensure_directories().unwrap();
        store.ensure_directories().unwrap();
        for dir in store.environment().required_dirs() {
            assert!(dir.is_dir(), "{} missing", dir.display());
        }
    }

    #[test]
    fn test_load_bootstraps_missing_file() {
        let (_dir, store) = store();
        let defaults = ConfigDefaults::default();

        let raw = store.load(&defaults).unwrap();
        assert!(store.path().is_file());
        assert_eq!(Value::Object(raw), defaults.document().to_value().unwrap());
    }

    #[test]
    fn test_render_sorts_keys_and_indents() {
        let doc = Document {
            instances: vec![Instance::new("dev").with_field("zeta", 1).with_field("alpha", 2)],
            ..Document::default()
        };
        let text = String::from_utf8(render(&doc).unwrap()).unwrap();

        let alpha = text.find("\"alpha\"").unwrap();
        let name = text.find("\"name\"").unwrap();
        let zeta = text.find("\"zeta\"").unwrap();
        assert!(alpha < name && name < zeta);
        assert!(text.contains("\n    \"instances\": ["));
        assert!(text.ends_with("}\n"));
    }

    #[test]
    fn test_save_is_byte_stable() {
        let (_dir, store) = store();
        store.ensure_directories().unwrap();
        let mut doc = Document::default();
        doc.versions.push("9.10".into());
        doc.extra.insert("custom".into(), json!({ "b": 1, "a": 2 }));

        store.save(&doc).unwrap();
        let first = fs::read(store.path()).unwrap();
        store.save(&doc).unwrap();
        let second = fs::read(store.path()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let (_dir, store) = store();
        store.ensure_directories().unwrap();
        fs::write(store.path(), "{ not json").unwrap();

        let err = store.load(&ConfigDefaults::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_non_object_root_is_parse_error() {
        let (_dir, store) = store();
        store.ensure_directories().unwrap();
        fs::write(store.path(), "[1, 2, 3]").unwrap();

        let err = store.load(&ConfigDefaults::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
