//! Schema migration by default overlay.
//!
//! # Responsibilities
//! - Add top-level keys present in the defaults but missing on disk
//! - Add preference keys present in the defaults but missing on disk
//!
//! # Design Decisions
//! - Additive only: existing keys are never overwritten or removed
//! - Exactly one level of recursion, into `preferences`, and only when it is an object
//! - No version stamp; a file written by an older release is upgraded by the overlay alone

use serde_json::{Map, Value};

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::schema::ConfigDefaults;

const PREFERENCES_KEY: &str = "preferences";

pub struct SchemaMigrator;

impl SchemaMigrator {
    /// Overlay missing default keys onto `raw`. Returns the number of keys added.
    pub fn fill(raw: &mut Map<String, Value>, defaults: &ConfigDefaults) -> ConfigResult<usize> {
        let Value::Object(default_object) =
            defaults.document().to_value().map_err(ConfigError::Serialize)?
        else {
            return Ok(0);
        };

        let mut added = 0;

        for (key, value) in &default_object {
            if !raw.contains_key(key) {
                tracing::debug!(key = %key, "Adding missing top-level key");
                raw.insert(key.clone(), value.clone());
                added += 1;
            }
        }

        if let (Some(Value::Object(prefs)), Some(Value::Object(default_prefs))) =
            (raw.get_mut(PREFERENCES_KEY), default_object.get(PREFERENCES_KEY))
        {
            for (key, value) in default_prefs {
                if !prefs.contains_key(key) {
                    tracing::debug!(preference = %key, "Adding missing preference");
                    prefs.insert(key.clone(), value.clone());
                    added += 1;
                }
            }
        }

        Ok(added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn test_fills_missing_top_level_and_preferences() {
        let mut raw = object(json!({
            "versions": ["9.10"],
            "preferences": { "editor": "emacs" }
        }));

        let added = SchemaMigrator::fill(&mut raw, &ConfigDefaults::default()).unwrap();

        // instances, snapshots + 4 preferences
        assert_eq!(added, 6);
        assert_eq!(raw["versions"], json!(["9.10"]));
        assert_eq!(raw["instances"], json!([]));
        assert_eq!(raw["preferences"]["editor"], json!("emacs"));
        assert_eq!(raw["preferences"]["snapshot-format"], json!("xztar"));
    }

    #[test]
    fn test_missing_preferences_object_gets_all_defaults() {
        let mut raw = object(json!({}));
        SchemaMigrator::fill(&mut raw, &ConfigDefaults::default()).unwrap();
        let expected = ConfigDefaults::default().document().to_value().unwrap();
        assert_eq!(Value::Object(raw), expected);
    }

    #[test]
    fn test_fill_is_idempotent_and_keeps_unknown_keys() {
        let mut raw = object(json!({
            "legacy": 1,
            "preferences": { "debug": true, "oldPref": "x" }
        }));

        SchemaMigrator::fill(&mut raw, &ConfigDefaults::default()).unwrap();
        let once = raw.clone();
        let added = SchemaMigrator::fill(&mut raw, &ConfigDefaults::default()).unwrap();

        assert_eq!(added, 0);
        assert_eq!(raw, once);
        assert_eq!(raw["legacy"], json!(1));
        assert_eq!(raw["preferences"]["oldPref"], json!("x"));
        assert_eq!(raw["preferences"]["debug"], json!(true));
    }

    #[test]
    fn test_non_object_preferences_left_alone() {
        let mut raw = object(json!({ "preferences": 5 }));
        SchemaMigrator::fill(&mut raw, &ConfigDefaults::default()).unwrap();
        assert_eq!(raw["preferences"], json!(5));
    }
}
