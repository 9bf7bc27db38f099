//! Local configuration store for the xtool developer CLI.
//!
//! Tracks installed instances, downloaded versions, saved snapshots and user
//! preferences in a single JSON document that is migrated on load, written
//! in canonical order and hot-reloaded when edited out of band.

pub mod archive;
pub mod config;
pub mod environment;
pub mod lifecycle;
pub mod observability;
pub mod version;

pub use config::{ConfigError, ConfigManager, ConfigResult, ManagerOptions};
pub use environment::Environment;
pub use version::{Version, VersionParseError};
