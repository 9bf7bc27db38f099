//! Configuration file watcher for live reload.
//!
//! # Data Flow
//! ```text
//! notify callback (OS thread)
//!     → path filter (config file name only)
//!     → ReloadSignal::Changed on an unbounded channel
//!     → "config-reload" thread
//!     → ReloadTarget::reload()
//! ```
//!
//! # Design Decisions
//! - The parent directory is watched, so editors that replace the file by
//!   rename keep being observed
//! - Signals already queued when the reload thread wakes are coalesced into one reload
//! - A failed reload is logged; the thread keeps serving later events
//! - No polling fallback: if the directory cannot be watched, startup fails

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc;

use crate::config::error::{ConfigError, ConfigResult};

/// Something that can rebuild itself from disk.
pub trait ReloadTarget: Send + Sync + 'static {
    fn reload(&self) -> ConfigResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReloadSignal {
    Changed,
    Stop,
}

/// Watches the configuration file and drives reloads on a background thread.
///
/// Stopped and joined on drop.
pub struct LiveReloadWatcher {
    path: PathBuf,
    watcher: Option<RecommendedWatcher>,
    signal_tx: mpsc::UnboundedSender<ReloadSignal>,
    handle: Option<JoinHandle<()>>,
}

impl LiveReloadWatcher {
    /// Start observing `path` and reloading `target` on every change.
    pub fn start(path: &Path, target: Arc<dyn ReloadTarget>) -> ConfigResult<Self> {
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();

        let file_name: OsString = path.file_name().map(OsString::from).unwrap_or_default();
        let watch_dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let tx = signal_tx.clone();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let relevant = (event.kind.is_modify() || event.kind.is_create())
                        && event
                            .paths
                            .iter()
                            .any(|p| p.file_name() == Some(file_name.as_os_str()));
                    if relevant {
                        tracing::debug!(kind = ?event.kind, "Config file change detected");
                        let _ = tx.send(ReloadSignal::Changed);
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default(),
        )
        .map_err(|source| ConfigError::Watch {
            path: path.to_path_buf(),
            source,
        })?;

        watcher
            .watch(&watch_dir, RecursiveMode::NonRecursive)
            .map_err(|source| ConfigError::Watch {
                path: watch_dir.clone(),
                source,
            })?;

        let handle = thread::Builder::new()
            .name("config-reload".into())
            .spawn(move || reload_loop(signal_rx, target))
            .map_err(ConfigError::WatchThread)?;

        tracing::info!(path = %path.display(), "Config watcher started");

        Ok(Self {
            path: path.to_path_buf(),
            watcher: Some(watcher),
            signal_tx,
            handle: Some(handle),
        })
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Stop observing and join the reload thread. Safe to call more than once.
    pub fn stop(&mut self) {
        // Drop the OS watcher first so no new signals arrive after Stop.
        self.watcher.take();
        let _ = self.signal_tx.send(ReloadSignal::Stop);

        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("Config reload thread panicked");
            }
            tracing::info!(path = %self.path.display(), "Config watcher stopped");
        }
    }
}

impl Drop for LiveReloadWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

fn reload_loop(mut signal_rx: mpsc::UnboundedReceiver<ReloadSignal>, target: Arc<dyn ReloadTarget>) {
    while let Some(signal) = signal_rx.blocking_recv() {
        if signal == ReloadSignal::Stop {
            break;
        }

        let mut coalesced = 0usize;
        let mut stop = false;
        while let Ok(next) = signal_rx.try_recv() {
            match next {
                ReloadSignal::Changed => coalesced += 1,
                ReloadSignal::Stop => {
                    stop = true;
                    break;
                }
            }
        }
        if stop {
            break;
        }

        tracing::debug!(coalesced, "Reloading configuration after file change");
        if let Err(e) = target.reload() {
            tracing::error!("Failed to reload config: {}. Keeping current configuration.", e);
        }
    }
}
