//! Error handling for Silk
//!
//! This module provides error types and result aliases for the rotating
//! file writer and the fan-out writer.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur in Silk operations
#[derive(Error, Debug)]
pub enum Error {
    /// Errors related to I/O operations
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The parent directory of the log file could not be created
    #[error("Failed to create log directory {path:?}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The current log file could not be opened
    #[error("Failed to open log file {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Writing to the current log file failed
    #[error("Failed to write log file {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The next log file could not be opened during rotation
    #[error("Failed to rotate to {path:?}: {source}")]
    Rotation {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Errors related to configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors related to serialization/deserialization
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error type for other cases
    #[error("{0}")]
    Other(String),
}

/// Result type for Silk operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new directory error
    pub fn directory(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Directory {
            path: path.into(),
            source,
        }
    }

    /// Create a new open error
    pub fn open(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Open {
            path: path.into(),
            source,
        }
    }

    /// Create a new write error
    pub fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    /// Create a new rotation error
    pub fn rotation(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Rotation {
            path: path.into(),
            source,
        }
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a new generic error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// Check if this error came from the filesystem
    pub fn is_io_error(&self) -> bool {
        self.io_source().is_some()
    }

    /// Check if this is a rotation error
    pub fn is_rotation_error(&self) -> bool {
        matches!(self, Self::Rotation { .. })
    }

    /// Check if this is a configuration error
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// The path the failed operation was working on, if any
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Directory { path, .. }
            | Self::Open { path, .. }
            | Self::Write { path, .. }
            | Self::Rotation { path, .. } => Some(path),
            _ => None,
        }
    }

    /// The underlying I/O error, if any
    pub fn io_source(&self) -> Option<&io::Error> {
        match self {
            Self::Io(err) => Some(err),
            Self::Directory { source, .. }
            | Self::Open { source, .. }
            | Self::Write { source, .. }
            | Self::Rotation { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Get a user-friendly suggestion for resolving the error
    pub fn suggestion(&self) -> Option<String> {
        match self.io_source().map(io::Error::kind) {
            Some(io::ErrorKind::NotFound) => {
                return Some(
                    "The log directory does not exist; enable ensure_dir or create it".to_string(),
                )
            }
            Some(io::ErrorKind::PermissionDenied) => {
                return Some(
                    "You don't have permission to write to the log directory".to_string(),
                )
            }
            _ => {}
        }

        match self {
            Self::Directory { .. } => {
                Some("Check that the parent of the log directory is writable".to_string())
            }
            Self::Rotation { .. } => Some(
                "Rotation will be retried on the next write; check available disk space"
                    .to_string(),
            ),
            Self::Config(_) => Some("Review the writer configuration".to_string()),
            _ => None,
        }
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Io(err) => err,
            Error::Directory { source, .. }
            | Error::Open { source, .. }
            | Error::Write { source, .. }
            | Error::Rotation { source, .. } => source,
            other => io::Error::new(io::ErrorKind::Other, other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let open_err = Error::open(
            "/var/log/app.log",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(open_err, Error::Open { .. }));
        assert_eq!(open_err.path(), Some(&PathBuf::from("/var/log/app.log")));
        assert!(open_err.is_io_error());

        let config_err = Error::config("bad mode");
        assert!(config_err.is_config_error());
        assert!(config_err.path().is_none());
        assert!(!config_err.is_io_error());
    }

    #[test]
    fn test_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let silk_err = Error::from(io_err);
        assert!(matches!(silk_err, Error::Io(_)));

        // Round trip through io::Error keeps the original kind
        let rotation = Error::rotation(
            "app.2024-01-01T00-00-00.log",
            io::Error::new(io::ErrorKind::WriteZero, "disk full"),
        );
        assert!(rotation.is_rotation_error());
        let back: io::Error = rotation.into();
        assert_eq!(back.kind(), io::ErrorKind::WriteZero);

        let back: io::Error = Error::other("boom").into();
        assert_eq!(back.kind(), io::ErrorKind::Other);
    }

    #[test]
    fn test_error_suggestion() {
        let err = Error::directory(
            "/nope/logs",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.suggestion().unwrap().contains("permission"));

        let err = Error::open("/nope/app.log", io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert!(err.suggestion().unwrap().contains("ensure_dir"));

        let err = Error::rotation("app.log", io::Error::new(io::ErrorKind::Other, "?"));
        assert!(err.suggestion().unwrap().contains("retried"));

        assert!(Error::other("x").suggestion().is_none());
    }
}
