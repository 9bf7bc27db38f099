//! Configuration manager: the single owner of the active document.
//!
//! # Responsibilities
//! - Bootstrap directories and the configuration file
//! - Publish load → migrate → rebuild results atomically
//! - Expose the read/write API used by the CLI, downloader and lifecycle code
//! - Own the live-reload watcher for its whole lifetime
//!
//! # Design Decisions
//! - Active state lives in an `ArcSwap`; readers never block and never see a
//!   half-built state
//! - Reloads, persists and in-memory mutations share one mutex, so a
//!   copy-on-write update cannot be lost to a racing reload
//! - Unsaved mutations are discarded by the next reload, including one
//!   triggered by an external edit
//! - The watcher sees our own saves too; a change event is ignored while the
//!   file still holds exactly the bytes of the last save

use arc_swap::ArcSwap;
use serde_json::Value;
use std::fmt;
use std::fs;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::loader::DocumentStore;
use crate::config::migration::SchemaMigrator;
use crate::config::preferences::PreferenceRegistry;
use crate::config::schema::{ConfigDefaults, Document, Instance, SnapshotRecord};
use crate::config::snapshots::{Snapshot, SnapshotRegistry};
use crate::config::sorter::PersistenceSorter;
use crate::config::watcher::{LiveReloadWatcher, ReloadTarget};
use crate::environment::Environment;
use crate::version::Version;

/// One published generation of the configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigState {
    document: Document,
    snapshots: SnapshotRegistry,
}

impl ConfigState {
    pub fn new(document: Document) -> Self {
        let snapshots = SnapshotRegistry::rebuild(&document.snapshots);
        Self {
            document,
            snapshots,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn snapshots(&self) -> &SnapshotRegistry {
        &self.snapshots
    }

    fn sync_snapshots(&mut self) {
        self.document.snapshots = self.snapshots.to_records();
    }
}

/// Construction options for [`ConfigManager`].
#[derive(Debug, Clone)]
pub struct ManagerOptions {
    pub defaults: ConfigDefaults,
    /// Start the file watcher.
    pub live_reload: bool,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self {
            defaults: ConfigDefaults::default(),
            live_reload: true,
        }
    }
}

#[derive(Debug)]
struct Shared {
    store: DocumentStore,
    defaults: ConfigDefaults,
    preferences: PreferenceRegistry,
    active: ArcSwap<ConfigState>,
    gate: Mutex<()>,
    /// Bytes of the last save, taken only while `gate` is held.
    last_written: Mutex<Option<Vec<u8>>>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, ()> {
        self.gate.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy-on-write update; nothing is published if `f` fails.
    fn update<T>(&self, f: impl FnOnce(&mut ConfigState) -> ConfigResult<T>) -> ConfigResult<T> {
        let _guard = self.lock();
        let mut next = (**self.active.load()).clone();
        let out = f(&mut next)?;
        self.active.store(Arc::new(next));
        Ok(out)
    }

    fn modify<T>(&self, f: impl FnOnce(&mut ConfigState) -> T) -> T {
        let _guard = self.lock();
        let mut next = (**self.active.load()).clone();
        let out = f(&mut next);
        self.active.store(Arc::new(next));
        out
    }

    fn last_written(&self) -> MutexGuard<'_, Option<Vec<u8>>> {
        self.last_written.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether the file still holds what the last save wrote. Caller holds `gate`.
    fn is_own_write(&self) -> bool {
        match self.last_written().as_deref() {
            Some(written) => fs::read(self.store.path()).is_ok_and(|on_disk| on_disk == written),
            None => false,
        }
    }

    /// Replace the active state with the file contents. Caller holds `gate`.
    fn reload_from_disk(&self) -> ConfigResult<()> {
        let state = load_state(&self.store, &self.defaults)?;
        tracing::info!(
            versions = state.document.versions.len(),
            instances = state.document.instances.len(),
            snapshots = state.snapshots.len(),
            "Configuration reloaded"
        );
        self.active.store(Arc::new(state));
        *self.last_written() = None;
        Ok(())
    }
}

impl ReloadTarget for Shared {
    fn reload(&self) -> ConfigResult<()> {
        let _guard = self.lock();
        if self.is_own_write() {
            tracing::debug!(path = %self.store.path().display(), "Change is our own save, keeping active state");
            return Ok(());
        }
        self.reload_from_disk()
    }
}

fn load_state(store: &DocumentStore, defaults: &ConfigDefaults) -> ConfigResult<ConfigState> {
    let mut raw = store.load(defaults)?;
    let added = SchemaMigrator::fill(&mut raw, defaults)?;
    if added > 0 {
        tracing::info!(added, "Filled missing configuration keys from defaults");
    }
    let document = Document::from_object(raw).map_err(|e| ConfigError::parse(store.path(), e))?;
    Ok(ConfigState::new(document))
}

/// Owner of the configuration document and its watcher.
pub struct ConfigManager {
    shared: Arc<Shared>,
    watcher: Option<LiveReloadWatcher>,
}

impl ConfigManager {
    /// Open the store with standard defaults and live reload enabled.
    pub fn initialize(env: Environment) -> ConfigResult<Self> {
        Self::with_options(env, ManagerOptions::default())
    }

    pub fn with_options(env: Environment, options: ManagerOptions) -> ConfigResult<Self> {
        let store = DocumentStore::new(env);
        store.ensure_directories()?;

        let state = load_state(&store, &options.defaults)?;
        tracing::debug!(path = %store.path().display(), "Configuration loaded");

        let shared = Arc::new(Shared {
            preferences: PreferenceRegistry::new(options.defaults.preferences()),
            store,
            defaults: options.defaults,
            active: ArcSwap::from_pointee(state),
            gate: Mutex::new(()),
            last_written: Mutex::new(None),
        });

        let watcher = if options.live_reload {
            Some(LiveReloadWatcher::start(shared.store.path(), shared.clone())?)
        } else {
            None
        };

        Ok(Self { shared, watcher })
    }

    pub fn environment(&self) -> &Environment {
        self.shared.store.environment()
    }

    pub fn is_watching(&self) -> bool {
        self.watcher.as_ref().is_some_and(LiveReloadWatcher::is_running)
    }

    /// Re-read the file and atomically replace the active state.
    ///
    /// Unlike a watcher-triggered reload this always reads the file, even
    /// right after [`persist`](Self::persist). On failure the previous state
    /// stays active.
    pub fn reload(&self) -> ConfigResult<()> {
        tracing::debug!("Reloading configuration");
        let _guard = self.shared.lock();
        self.shared.reload_from_disk()
    }

    /// The active state. Holding it pins that generation, not the latest one.
    pub fn current(&self) -> Arc<ConfigState> {
        self.shared.active.load_full()
    }

    pub fn versions(&self) -> Vec<String> {
        self.shared.active.load().document.versions.clone()
    }

    pub fn instances(&self) -> Vec<Instance> {
        self.shared.active.load().document.instances.clone()
    }

    pub fn get_instance(&self, name: &str) -> Option<Instance> {
        self.shared.active.load().document.instance(name).cloned()
    }

    pub fn get_snapshot(&self, name: &str) -> Option<Snapshot> {
        self.shared.active.load().snapshots.lookup(name).cloned()
    }

    /// Value of a whitelisted preference; `None` for unknown names.
    pub fn get(&self, preference: &str) -> Option<Value> {
        let state = self.shared.active.load();
        self.shared
            .preferences
            .get(&state.document.preferences, preference)
            .cloned()
    }

    /// Set a whitelisted preference in memory. Call [`persist`](Self::persist) to save.
    pub fn set(&self, preference: &str, value: impl Into<Value>) -> ConfigResult<()> {
        let value = value.into();
        let result = self.shared.update(|state| {
            self.shared
                .preferences
                .set(&mut state.document.preferences, preference, value)
        });
        if let Err(ConfigError::InvalidPreference(name)) = &result {
            tracing::warn!(preference = %name, "Rejected unknown preference");
        }
        result
    }

    /// Record a downloaded version. Returns `false` if it was already known.
    ///
    /// Surrounding whitespace is not part of the stored identifier.
    pub fn add_version(&self, version: &str) -> ConfigResult<bool> {
        let version = Version::parse(version)?.to_string();
        Ok(self.shared.modify(|state| {
            if state.document.versions.contains(&version) {
                return false;
            }
            state.document.versions.push(version);
            true
        }))
    }

    pub fn remove_version(&self, version: &str) -> bool {
        let version = version.trim();
        self.shared.modify(|state| {
            let before = state.document.versions.len();
            state.document.versions.retain(|v| v != version);
            state.document.versions.len() != before
        })
    }

    /// Insert or replace an instance by name, returning the replaced record.
    pub fn upsert_instance(&self, instance: Instance) -> Option<Instance> {
        self.shared.modify(|state| {
            let instances = &mut state.document.instances;
            match instances.iter_mut().find(|i| i.name == instance.name) {
                Some(existing) => Some(std::mem::replace(existing, instance)),
                None => {
                    instances.push(instance);
                    None
                }
            }
        })
    }

    pub fn remove_instance(&self, name: &str) -> bool {
        self.shared.modify(|state| {
            let before = state.document.instances.len();
            state.document.instances.retain(|i| i.name != name);
            state.document.instances.len() != before
        })
    }

    pub fn upsert_snapshot(&self, record: SnapshotRecord) {
        self.shared.modify(|state| {
            state.snapshots.insert(record);
            state.sync_snapshots();
        })
    }

    pub fn remove_snapshot(&self, name: &str) -> bool {
        self.shared.modify(|state| {
            let removed = state.snapshots.remove(name);
            state.sync_snapshots();
            removed
        })
    }

    /// Write the active state in canonical order.
    ///
    /// Fails with [`ConfigError::Version`] before touching the file if any
    /// version identifier does not parse.
    pub fn persist(&self) -> ConfigResult<()> {
        self.shared.update(|state| {
            state.sync_snapshots();
            PersistenceSorter::canonicalize(&mut state.document)?;
            let written = self.shared.store.save(&state.document)?;
            *self.shared.last_written() = Some(written);
            tracing::info!(path = %self.shared.store.path().display(), "Configuration persisted");
            Ok(())
        })
    }

    /// Stop the watcher and join its thread. Also done on drop.
    pub fn stop_watching(&mut self) {
        if let Some(mut watcher) = self.watcher.take() {
            watcher.stop();
        }
    }
}

impl Drop for ConfigManager {
    fn drop(&mut self) {
        self.stop_watching();
    }
}

impl fmt::Debug for ConfigManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigManager")
            .field("path", &self.shared.store.path())
            .field("watching", &self.is_watching())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn manager() -> (tempfile::TempDir, ConfigManager) {
        let dir = tempfile::tempdir().unwrap();
        let options = ManagerOptions {
            live_reload: false,
            ..ManagerOptions::default()
        };
        let manager = ConfigManager::with_options(Environment::rooted(dir.path()), options).unwrap();
        (dir, manager)
    }

    #[test]
    fn test_preference_whitelist() {
        let (_dir, manager) = manager();

        manager.set("editor", "vim").unwrap();
        assert_eq!(manager.get("editor"), Some(json!("vim")));

        let before = manager.current().document().preferences.clone();
        let err = manager.set("not-a-real-pref", 1).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPreference(_)));
        assert_eq!(manager.current().document().preferences, before);
        assert_eq!(manager.get("not-a-real-pref"), None);
    }

    #[test]
    fn test_lookup_misses_are_none() {
        let (_dir, manager) = manager();
        assert!(manager.get_instance("does-not-exist").is_none());
        assert!(manager.get_snapshot("does-not-exist").is_none());
    }

    #[test]
    fn test_add_version_validates_and_dedups() {
        let (_dir, manager) = manager();
        assert!(manager.add_version("9.10").unwrap());
        assert!(!manager.add_version("9.10").unwrap());
        assert!(matches!(manager.add_version("latest"), Err(ConfigError::Version(_))));
        assert_eq!(manager.versions(), vec!["9.10".to_string()]);
        assert!(manager.remove_version("9.10"));
        assert!(manager.versions().is_empty());
    }

    #[test]
    fn test_add_version_stores_trimmed_identifier() {
        let (_dir, manager) = manager();
        assert!(manager.add_version("9.10").unwrap());
        assert!(!manager.add_version(" 9.10 ").unwrap());
        assert!(manager.add_version("\t10.0-rc-1\n").unwrap());
        assert_eq!(manager.versions(), vec!["9.10".to_string(), "10.0-rc-1".to_string()]);
        assert!(manager.remove_version(" 10.0-rc-1"));
        assert_eq!(manager.versions(), vec!["9.10".to_string()]);
    }

    #[test]
    fn test_upsert_instance_replaces_by_name() {
        let (_dir, manager) = manager();
        assert!(manager.upsert_instance(Instance::new("dev").with_field("version", "9.9")).is_none());
        let previous = manager
            .upsert_instance(Instance::new("dev").with_field("version", "9.10"))
            .unwrap();
        assert_eq!(previous.field("version"), Some(&json!("9.9")));
        assert_eq!(manager.instances().len(), 1);
        assert!(manager.remove_instance("dev"));
        assert!(!manager.remove_instance("dev"));
    }

    #[test]
    fn test_snapshot_mutations_keep_document_in_sync() {
        let (_dir, manager) = manager();
        manager.upsert_snapshot(SnapshotRecord::new("before-upgrade").with_field("instance", "dev"));

        let state = manager.current();
        assert_eq!(state.document().snapshots.len(), 1);
        assert_eq!(
            manager.get_snapshot("before-upgrade").unwrap().field("instance"),
            Some(&json!("dev"))
        );

        assert!(manager.remove_snapshot("before-upgrade"));
        assert!(manager.current().document().snapshots.is_empty());
        // the earlier generation is untouched
        assert_eq!(state.snapshots().len(), 1);
    }

    #[test]
    fn test_reload_discards_unsaved_changes() {
        let (_dir, manager) = manager();
        manager.set("debug", true).unwrap();
        manager.reload().unwrap();
        assert_eq!(manager.get("debug"), Some(json!(false)));
    }

    #[test]
    fn test_reload_after_own_save() {
        let (_dir, manager) = manager();
        manager.add_version("1.0").unwrap();
        manager.persist().unwrap();
        manager.add_version("2.0").unwrap();

        // the change event for our own save is not a reason to reload
        manager.shared.reload().unwrap();
        assert_eq!(manager.versions(), vec!["1.0".to_string(), "2.0".to_string()]);

        // an explicit reload always goes to disk
        manager.reload().unwrap();
        assert_eq!(manager.versions(), vec!["1.0".to_string()]);
    }

    #[test]
    fn test_external_edit_after_own_save_is_loaded() {
        let (_dir, manager) = manager();
        manager.persist().unwrap();

        let path = manager.environment().config_file().to_path_buf();
        let mut doc: Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        doc["versions"] = json!(["8.4.5"]);
        std::fs::write(&path, serde_json::to_vec(&doc).unwrap()).unwrap();

        manager.shared.reload().unwrap();
        assert_eq!(manager.versions(), vec!["8.4.5".to_string()]);
    }

    #[test]
    fn test_persist_with_bad_version_writes_nothing() {
        let (_dir, manager) = manager();
        let path = manager.environment().config_file().to_path_buf();
        let before = std::fs::read(&path).unwrap();

        manager
            .shared
            .modify(|state| state.document.versions.push("not a version".into()));
        manager.set("editor", "nano").unwrap();

        assert!(matches!(manager.persist(), Err(ConfigError::Version(_))));
        assert_eq!(std::fs::read(&path).unwrap(), before);
    }
}
