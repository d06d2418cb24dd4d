//! Configuration for Silk
//!
//! This module provides configuration options for the rotating file writer
//! and for the destination table of the fan-out writer.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use serde::{Serialize, Deserialize};

use crate::error::{Result, Error};

/// Permission bits used for new log files when none are configured
pub const DEFAULT_FILE_MODE: u32 = 0o644;

/// Permission bits used for directories created by `ensure_dir`
pub const DEFAULT_DIR_MODE: u32 = 0o755;

/// Configuration options for a rotating file writer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[non_exhaustive]
pub struct FileWriterConfig {
    /// File to write logs to. Backups are kept in the same directory.
    /// When unset, writes go to standard error.
    pub path: Option<PathBuf>,
    /// Maximum size in bytes of the current file before it is rotated (0 = never)
    pub max_size: u64,
    /// Number of old files to retain besides the current one (0 = retain all)
    pub max_backups: usize,
    /// Permission bits for newly created files (0 = 0644)
    pub file_mode: u32,
    /// Whether to create missing parent directories
    pub ensure_dir: bool,
    /// Whether rotation timestamps use local time instead of UTC
    pub local_time: bool,
    /// Whether the host label is embedded in file names
    pub host_name: bool,
    /// Whether the process id is embedded in file names
    pub process_id: bool,
}

impl Default for FileWriterConfig {
    fn default() -> Self {
        Self {
            path: None,
            max_size: 0,
            max_backups: 0,
            file_mode: DEFAULT_FILE_MODE,
            ensure_dir: false,
            local_time: false,
            host_name: false,
            process_id: false,
        }
    }
}

impl FileWriterConfig {
    /// Create a new writer configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the file to write logs to
    pub fn with_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the rotation threshold in bytes
    pub fn with_max_size(mut self, size: u64) -> Self {
        self.max_size = size;
        self
    }

    /// Set the number of retained backups
    pub fn with_max_backups(mut self, count: usize) -> Self {
        self.max_backups = count;
        self
    }

    /// Set the permission bits for new files
    pub fn with_file_mode(mut self, mode: u32) -> Self {
        self.file_mode = mode;
        self
    }

    /// Set whether to create missing parent directories
    pub fn with_ensure_dir(mut self, ensure: bool) -> Self {
        self.ensure_dir = ensure;
        self
    }

    /// Set whether timestamps use local time
    pub fn with_local_time(mut self, local: bool) -> Self {
        self.local_time = local;
        self
    }

    /// Set whether the host label is embedded in file names
    pub fn with_host_name(mut self, enabled: bool) -> Self {
        self.host_name = enabled;
        self
    }

    /// Set whether the process id is embedded in file names
    pub fn with_process_id(mut self, enabled: bool) -> Self {
        self.process_id = enabled;
        self
    }

    /// Permission bits actually applied to new files
    pub fn effective_file_mode(&self) -> u32 {
        if self.file_mode == 0 {
            DEFAULT_FILE_MODE
        } else {
            self.file_mode
        }
    }

    /// Whether writes can trigger a size-based rotation
    pub fn is_size_bounded(&self) -> bool {
        self.max_size > 0 && self.path.is_some()
    }

    /// Whether a symlink at the base path tracks the current file
    pub fn maintains_symlink(&self) -> bool {
        !self.process_id
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.file_mode > 0o7777 {
            return Err(Error::config(format!(
                "File mode {:o} has bits outside 0o7777",
                self.file_mode
            )));
        }

        if let Some(ref path) = self.path {
            if path.file_name().is_none() {
                return Err(Error::config(format!(
                    "Log path {:?} does not name a file",
                    path
                )));
            }
        }

        Ok(())
    }

    /// Create a human-readable string representation of the configuration
    pub fn to_string_pretty(&self) -> String {
        let mut result = String::new();

        result.push_str("=== Silk File Writer ===\n\n");

        result.push_str("Output:\n");
        match self.path {
            Some(ref path) => result.push_str(&format!("  Path: {}\n", path.display())),
            None => result.push_str("  Path: <stderr>\n"),
        }
        result.push_str(&format!("  File Mode: {:o}\n", self.effective_file_mode()));
        result.push_str(&format!("  Ensure Dir: {}\n", self.ensure_dir));

        result.push_str("\nRotation:\n");
        if self.max_size > 0 {
            result.push_str(&format!("  Max Size: {} bytes\n", self.max_size));
        } else {
            result.push_str("  Max Size: unbounded\n");
        }
        if self.max_backups > 0 {
            result.push_str(&format!("  Max Backups: {}\n", self.max_backups));
        } else {
            result.push_str("  Max Backups: all\n");
        }

        result.push_str("\nNaming:\n");
        result.push_str(&format!("  Local Time: {}\n", self.local_time));
        result.push_str(&format!("  Host Name: {}\n", self.host_name));
        result.push_str(&format!("  Process ID: {}\n", self.process_id));

        result
    }

    /// Load configuration from a TOML file
    #[cfg(feature = "toml")]
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::config(format!("Failed to parse TOML: {}", e)))?;
        config.validate()?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    #[cfg(feature = "toml")]
    pub fn to_toml_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::config(format!("Failed to serialize to TOML: {}", e)))?;

        std::fs::write(path, content)?;

        Ok(())
    }
}

/// Destination table for a fan-out writer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FanoutConfig {
    /// Writer configuration per logical destination name
    pub destinations: BTreeMap<String, FileWriterConfig>,
}

impl FanoutConfig {
    /// Create an empty destination table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a destination
    pub fn with_destination(mut self, name: impl Into<String>, config: FileWriterConfig) -> Self {
        self.destinations.insert(name.into(), config);
        self
    }

    /// Validate every destination
    pub fn validate(&self) -> Result<()> {
        for (name, config) in &self.destinations {
            if name.is_empty() {
                return Err(Error::config("Destination names must not be empty"));
            }
            config
                .validate()
                .map_err(|e| Error::config(format!("Destination {:?}: {}", name, e)))?;
        }

        Ok(())
    }

    /// Parse a destination table from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a destination table from a TOML file
    #[cfg(feature = "toml")]
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::config(format!("Failed to parse TOML: {}", e)))?;
        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FileWriterConfig::default();

        assert_eq!(config.path, None);
        assert_eq!(config.max_size, 0);
        assert_eq!(config.max_backups, 0);
        assert_eq!(config.file_mode, 0o644);
        assert!(!config.ensure_dir);
        assert!(!config.local_time);
        assert!(!config.host_name);
        assert!(!config.process_id);
        assert!(!config.is_size_bounded());
        assert!(config.maintains_symlink());

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = FileWriterConfig::new()
            .with_path("/var/log/app/server.log")
            .with_max_size(10 * 1024 * 1024)
            .with_max_backups(7)
            .with_file_mode(0o600)
            .with_ensure_dir(true)
            .with_host_name(true)
            .with_process_id(true);

        assert_eq!(config.path, Some(PathBuf::from("/var/log/app/server.log")));
        assert_eq!(config.max_size, 10 * 1024 * 1024);
        assert_eq!(config.max_backups, 7);
        assert_eq!(config.effective_file_mode(), 0o600);
        assert!(config.is_size_bounded());
        assert!(!config.maintains_symlink());

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_file_mode_falls_back() {
        let config = FileWriterConfig::new().with_file_mode(0);
        assert_eq!(config.effective_file_mode(), DEFAULT_FILE_MODE);
    }

    #[test]
    fn test_config_validation() {
        let invalid_configs = vec![
            FileWriterConfig::new().with_file_mode(0o17777),
            FileWriterConfig::new().with_path("/var/log/.."),
            FileWriterConfig::new().with_path("/"),
        ];

        for config in invalid_configs {
            assert!(config.validate().is_err(), "{:?}", config);
        }
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: FileWriterConfig =
            serde_json::from_str(r#"{"path": "app.log", "max_size": 100}"#).unwrap();

        assert_eq!(config.path, Some(PathBuf::from("app.log")));
        assert_eq!(config.max_size, 100);
        assert_eq!(config.file_mode, DEFAULT_FILE_MODE);
        assert_eq!(config.max_backups, 0);
    }

    #[test]
    fn test_fanout_config_from_json() {
        let config = FanoutConfig::from_json(
            r#"{
                "destinations": {
                    "default": {"path": "logs/main.log", "max_size": 1048576},
                    "audit": {"path": "logs/audit.log", "max_backups": 30}
                }
            }"#,
        )
        .unwrap();

        assert_eq!(config.destinations.len(), 2);
        assert_eq!(config.destinations["audit"].max_backups, 30);
        assert_eq!(config.destinations["default"].max_size, 1048576);
    }

    #[test]
    fn test_fanout_config_rejects_bad_destination() {
        let config = FanoutConfig::new()
            .with_destination("", FileWriterConfig::new().with_path("a.log"));
        assert!(config.validate().is_err());

        let config = FanoutConfig::new()
            .with_destination("audit", FileWriterConfig::new().with_file_mode(0o77777));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("audit"));
    }

    #[test]
    fn test_config_pretty_string() {
        let config = FileWriterConfig::new()
            .with_path("app.log")
            .with_max_size(100)
            .with_max_backups(2);
        let pretty = config.to_string_pretty();

        assert!(pretty.contains("Output:"));
        assert!(pretty.contains("Rotation:"));
        assert!(pretty.contains("Naming:"));
        assert!(pretty.contains("Path: app.log"));
        assert!(pretty.contains("Max Size: 100 bytes"));
        assert!(pretty.contains("Max Backups: 2"));
        assert!(pretty.contains("File Mode: 644"));

        let pretty = FileWriterConfig::new().to_string_pretty();
        assert!(pretty.contains("<stderr>"));
        assert!(pretty.contains("unbounded"));
        assert!(pretty.contains("Max Backups: all"));
    }

    #[cfg(feature = "toml")]
    #[test]
    fn test_toml_round_trip_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let file = dir.path().join("silk.toml");

        let config = FileWriterConfig::new().with_path("app.log").with_max_backups(3);
        config.to_toml_file(&file)?;

        assert_eq!(FileWriterConfig::from_toml_file(&file)?, config);
        Ok(())
    }
}
