//! Whitelisted preferences.
//!
//! # Responsibilities
//! - Hold the preference map as found on disk (unknown keys are kept)
//! - Gate writes through the whitelist derived from the injected defaults
//! - Offer typed reads for the standard preferences
//!
//! Values are stored verbatim; only the name is validated.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::config::error::{ConfigError, ConfigResult};

/// The standard preferences known to this release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreferenceKey {
    Editor,
    Debug,
    LinkInstanceStorage,
    SnapshotFormat,
    LinkableFileExtensions,
}

impl PreferenceKey {
    pub const ALL: [PreferenceKey; 5] = [
        PreferenceKey::Editor,
        PreferenceKey::Debug,
        PreferenceKey::LinkInstanceStorage,
        PreferenceKey::SnapshotFormat,
        PreferenceKey::LinkableFileExtensions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PreferenceKey::Editor => "editor",
            PreferenceKey::Debug => "debug",
            PreferenceKey::LinkInstanceStorage => "linkInstanceStorage",
            PreferenceKey::SnapshotFormat => "snapshot-format",
            PreferenceKey::LinkableFileExtensions => "linkableFileExtensions",
        }
    }

    /// Value written for this preference on first run.
    pub fn default_value(&self) -> Value {
        match self {
            PreferenceKey::Editor => Value::Null,
            PreferenceKey::Debug => Value::Bool(false),
            PreferenceKey::LinkInstanceStorage => Value::Bool(false),
            PreferenceKey::SnapshotFormat => Value::from("xztar"),
            PreferenceKey::LinkableFileExtensions => Value::from(
                ["jar", "xar", "vm", "js", "css", "less", "png", "gif", "ttf", "ttc"].to_vec(),
            ),
        }
    }
}

impl fmt::Display for PreferenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PreferenceKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PreferenceKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| ConfigError::InvalidPreference(s.to_string()))
    }
}

/// The `preferences` object of the configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Preferences(Map<String, Value>);

impl Preferences {
    /// Preferences holding the default value of every standard key.
    pub fn standard() -> Self {
        Self(
            PreferenceKey::ALL
                .into_iter()
                .map(|key| (key.as_str().to_string(), key.default_value()))
                .collect(),
        )
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn raw(&self, key: PreferenceKey) -> Option<&Value> {
        self.0.get(key.as_str())
    }

    pub fn editor(&self) -> Option<&str> {
        self.raw(PreferenceKey::Editor).and_then(Value::as_str)
    }

    pub fn debug(&self) -> Option<bool> {
        self.raw(PreferenceKey::Debug).and_then(Value::as_bool)
    }

    pub fn link_instance_storage(&self) -> Option<bool> {
        self.raw(PreferenceKey::LinkInstanceStorage).and_then(Value::as_bool)
    }

    pub fn snapshot_format(&self) -> Option<&str> {
        self.raw(PreferenceKey::SnapshotFormat).and_then(Value::as_str)
    }

    /// `None` unless the stored value is an array of strings.
    pub fn linkable_file_extensions(&self) -> Option<Vec<String>> {
        self.raw(PreferenceKey::LinkableFileExtensions)?
            .as_array()?
            .iter()
            .map(|ext| ext.as_str().map(str::to_string))
            .collect()
    }
}

/// Validates preference names against a fixed whitelist.
#[derive(Debug, Clone)]
pub struct PreferenceRegistry {
    allowed: BTreeSet<String>,
}

impl PreferenceRegistry {
    /// The whitelist is the key set of `defaults`.
    pub fn new(defaults: &Preferences) -> Self {
        Self {
            allowed: defaults.as_map().keys().cloned().collect(),
        }
    }

    pub fn is_valid(&self, name: &str) -> bool {
        self.allowed.contains(name)
    }

    /// Stored value for a whitelisted name; `None` for anything else.
    pub fn get<'a>(&self, prefs: &'a Preferences, name: &str) -> Option<&'a Value> {
        if !self.is_valid(name) {
            return None;
        }
        prefs.0.get(name)
    }

    /// Store `value` verbatim under a whitelisted name.
    pub fn set(&self, prefs: &mut Preferences, name: &str, value: Value) -> ConfigResult<()> {
        if !self.is_valid(name) {
            return Err(ConfigError::InvalidPreference(name.to_string()));
        }
        prefs.0.insert(name.to_string(), value);
        Ok(())
    }
}
