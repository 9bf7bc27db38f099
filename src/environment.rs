//! Fixed filesystem locations used by the tool.
//!
//! The store never computes these itself; an [`Environment`] is built once
//! and injected into the config manager.

use std::env;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "xtool";
const CONFIG_FILE: &str = "config.json";

/// Overrides the configuration directory.
pub const CONFIG_DIR_VAR: &str = "XTOOL_CONFIG_DIR";
/// Overrides the data directory.
pub const DATA_DIR_VAR: &str = "XTOOL_DATA_DIR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    config_dir: PathBuf,
    data_dir: PathBuf,
    instances_dir: PathBuf,
    snapshots_dir: PathBuf,
    config_file: PathBuf,
}

impl Environment {
    /// Build from explicit config and data directories.
    pub fn new(config_dir: impl Into<PathBuf>, data_dir: impl Into<PathBuf>) -> Self {
        let config_dir = config_dir.into();
        let data_dir = data_dir.into();
        Self {
            config_file: config_dir.join(CONFIG_FILE),
            instances_dir: data_dir.join("instances"),
            snapshots_dir: data_dir.join("snapshots"),
            config_dir,
            data_dir,
        }
    }

    /// Lay out every location under a single base directory.
    pub fn rooted(base: impl AsRef<Path>) -> Self {
        let base = base.as_ref();
        Self::new(base.join("config"), base.join("data"))
    }

    /// Resolve from `XTOOL_CONFIG_DIR` / `XTOOL_DATA_DIR`, falling back to the
    /// platform config and data directories.
    pub fn from_env() -> Self {
        let config_dir = env::var_os(CONFIG_DIR_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| platform_dir(dirs::config_dir()));
        let data_dir = env::var_os(DATA_DIR_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| platform_dir(dirs::data_dir()));
        Self::new(config_dir, data_dir)
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn instances_dir(&self) -> &Path {
        &self.instances_dir
    }

    pub fn snapshots_dir(&self) -> &Path {
        &self.snapshots_dir
    }

    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    /// Directories that must exist before the store is usable.
    pub fn required_dirs(&self) -> [&Path; 4] {
        [
            &self.config_dir,
            &self.data_dir,
            &self.instances_dir,
            &self.snapshots_dir,
        ]
    }
}

fn platform_dir(base: Option<PathBuf>) -> PathBuf {
    base.unwrap_or_else(|| PathBuf::from(".")).join(APP_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rooted_layout() {
        let env = Environment::rooted("/tmp/xt");
        assert_eq!(env.config_file(), Path::new("/tmp/xt/config/config.json"));
        assert_eq!(env.instances_dir(), Path::new("/tmp/xt/data/instances"));
        assert_eq!(env.snapshots_dir(), Path::new("/tmp/xt/data/snapshots"));
        assert_eq!(env.required_dirs().len(), 4);
    }
}
