//! Configuration persistence and live reload.
//!
//! # Data Flow
//! ```text
//! config.json
//!     → loader.rs (read raw JSON object, bootstrap from defaults if missing)
//!     → migration.rs (overlay missing default keys)
//!     → schema.rs (typed Document, unknown keys kept)
//!     → snapshots.rs (SnapshotRegistry rebuilt)
//!     → manager.rs (atomic swap of Arc<ConfigState>)
//!
//! On file change:
//!     watcher.rs detects change
//!     → reload thread repeats the pipeline off to the side
//!     → atomic swap, or keep current state on failure
//!
//! On persist:
//!     snapshots projected into the document
//!     → sorter.rs (versions by version order, instances by name)
//!     → loader.rs (canonical JSON, temp file + rename)
//! ```

pub mod error;
pub mod loader;
pub mod manager;
pub mod migration;
pub mod preferences;
pub mod schema;
pub mod snapshots;
pub mod sorter;
pub mod watcher;

pub use error::{ConfigError, ConfigResult};
pub use loader::DocumentStore;
pub use manager::{ConfigManager, ConfigState, ManagerOptions};
pub use migration::SchemaMigrator;
pub use preferences::{PreferenceKey, PreferenceRegistry, Preferences};
pub use schema::{ConfigDefaults, Document, Instance, NamedRecord, SnapshotRecord};
pub use snapshots::{Snapshot, SnapshotRegistry};
pub use sorter::PersistenceSorter;
pub use watcher::{LiveReloadWatcher, ReloadTarget};
