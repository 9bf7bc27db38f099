//! Configuration document definitions.
//!
//! The document is typed at the top level; anything the tool does not know
//! about (extra top-level keys, extra record fields) rides along in flattened
//! maps so a load/save cycle never drops it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::preferences::Preferences;

/// Root of the persisted configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Installed instances, owned by the instance lifecycle collaborator.
    pub instances: Vec<Instance>,

    /// Downloaded version identifiers.
    pub versions: Vec<String>,

    /// Saved instance states.
    pub snapshots: Vec<SnapshotRecord>,

    pub preferences: Preferences,

    /// Top-level keys this release does not know about.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Document {
    /// Convert a migrated JSON object into the typed document.
    pub fn from_object(object: Map<String, Value>) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(object))
    }

    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    pub fn instance(&self, name: &str) -> Option<&Instance> {
        self.instances.iter().find(|i| i.name == name)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self {
            instances: Vec::new(),
            versions: Vec::new(),
            snapshots: Vec::new(),
            preferences: Preferences::standard(),
            extra: Map::new(),
        }
    }
}

/// A persisted record identified by `name`; other fields pass through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedRecord {
    pub name: String,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl NamedRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Map::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

pub type Instance = NamedRecord;
pub type SnapshotRecord = NamedRecord;

/// Immutable defaults injected into the manager.
///
/// The default document drives both first-run bootstrap and migration, and
/// its preference keys form the preference whitelist.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigDefaults {
    document: Document,
}

impl ConfigDefaults {
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn preferences(&self) -> &Preferences {
        &self.document.preferences
    }
}
