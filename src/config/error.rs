//! Error definitions for the configuration store.

use std::path::PathBuf;
use thiserror::Error;

use crate::version::VersionParseError;

/// Errors that can occur while loading, mutating or persisting configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file or directory could not be read, written or created.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON or has the wrong shape.
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The in-memory document could not be serialized.
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[source] serde_json::Error),

    /// A persisted version identifier is not a valid version.
    #[error(transparent)]
    Version(#[from] VersionParseError),

    /// Attempt to set a preference outside the whitelist.
    #[error("'{0}' is not a recognized preference")]
    InvalidPreference(String),

    /// The configuration file could not be watched.
    #[error("failed to watch {}: {source}", .path.display())]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    /// The background reload thread could not be started.
    #[error("failed to spawn reload thread: {0}")]
    WatchThread(#[source] std::io::Error),
}

impl ConfigError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Parse {
            path: path.into(),
            source,
        }
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConfigError::InvalidPreference("colour".into());
        assert_eq!(err.to_string(), "'colour' is not a recognized preference");

        let err = ConfigError::io(
            "/nope/config.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("/nope/config.json"));
    }

    #[test]
    fn test_version_error_is_transparent() {
        let err: ConfigError = crate::version::Version::parse("nine").unwrap_err().into();
        assert!(err.to_string().starts_with("invalid version 'nine'"));
    }
}
