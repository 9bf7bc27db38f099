//! Shared helpers for integration tests.

use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use xtool_config::{ConfigManager, Environment, ManagerOptions};

/// A throwaway environment rooted in a temp directory.
pub struct TestEnv {
    pub dir: TempDir,
    pub env: Environment,
}

impl TestEnv {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let env = Environment::rooted(dir.path());
        Self { dir, env }
    }

    pub fn config_file(&self) -> &Path {
        self.env.config_file()
    }

    /// Write the config file before any manager exists.
    pub fn seed(&self, contents: &str) {
        std::fs::create_dir_all(self.env.config_dir()).unwrap();
        std::fs::write(self.config_file(), contents).unwrap();
    }

    #[allow(dead_code)]
    pub fn read(&self) -> String {
        std::fs::read_to_string(self.config_file()).unwrap()
    }

    pub fn manager(&self) -> ConfigManager {
        self.manager_with(false)
    }

    #[allow(dead_code)]
    pub fn watched_manager(&self) -> ConfigManager {
        self.manager_with(true)
    }

    fn manager_with(&self, live_reload: bool) -> ConfigManager {
        ConfigManager::with_options(
            self.env.clone(),
            ManagerOptions {
                live_reload,
                ..ManagerOptions::default()
            },
        )
        .unwrap()
    }
}

/// Poll `condition` until it holds or five seconds pass.
#[allow(dead_code)]
pub fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(25));
    }
    false
}
