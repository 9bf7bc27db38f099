//! Lifecycle management for long-running commands.
//!
//! # Data Flow
//! ```text
//! watch command:
//!     ConfigManager::initialize → watcher running
//!     → signals.rs (Ctrl-C)
//!     → ConfigManager dropped → watcher stopped and joined
//! ```

pub mod signals;
