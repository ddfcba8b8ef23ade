//! Configuration module for NetFS.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::{NetfsError, Result};

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file holding node metadata.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/netfs.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Blob storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FilesConfig {
    /// Directory holding blob files.
    #[serde(default = "default_storage_path")]
    pub storage_path: String,
    /// Maximum request body size in megabytes.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size_mb: u64,
}

fn default_storage_path() -> String {
    "data/blobs".to_string()
}

fn default_max_upload_size() -> u64 {
    1024
}

impl FilesConfig {
    /// Maximum upload size in bytes.
    pub fn max_upload_size_bytes(&self) -> u64 {
        self.max_upload_size_mb * 1024 * 1024
    }
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            storage_path: default_storage_path(),
            max_upload_size_mb: default_max_upload_size(),
        }
    }
}

/// Upload progress notification configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ProgressConfig {
    /// Buffered percentage updates per upload before new ones are dropped.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    /// Seconds without an update before a keepalive is sent to the observer.
    #[serde(default = "default_keepalive_secs")]
    pub keepalive_secs: u64,
}

fn default_channel_capacity() -> usize {
    10
}

fn default_keepalive_secs() -> u64 {
    30
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
            keepalive_secs: default_keepalive_secs(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/netfs.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Web API configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebConfig {
    /// Allowed CORS origins (empty allows any origin).
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Blob storage configuration.
    #[serde(default)]
    pub files: FilesConfig,
    /// Upload progress configuration.
    #[serde(default)]
    pub progress: ProgressConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Web API configuration.
    #[serde(default)]
    pub web: WebConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(NetfsError::Io)?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| NetfsError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `NETFS_HOST`: bind address
    /// - `NETFS_PORT`: listen port (ignored if not a valid port number)
    /// - `NETFS_DATA_DIR`: directory holding both the database and the blobs
    pub fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("NETFS_HOST") {
            if !host.is_empty() {
                self.server.host = host;
            }
        }
        if let Ok(port) = std::env::var("NETFS_PORT") {
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Ok(dir) = std::env::var("NETFS_DATA_DIR") {
            if !dir.is_empty() {
                self.set_data_dir(dir);
            }
        }
    }

    /// Relocate the database and blob directory under `dir`.
    pub fn set_data_dir(&mut self, dir: impl Into<PathBuf>) {
        let dir = dir.into();
        self.database.path = dir.join("netfs.db").to_string_lossy().into_owned();
        self.files.storage_path = dir.join("blobs").to_string_lossy().into_owned();
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.progress.channel_capacity == 0 {
            return Err(NetfsError::Config(
                "progress.channel_capacity must be at least 1".to_string(),
            ));
        }
        if self.progress.keepalive_secs == 0 {
            return Err(NetfsError::Config(
                "progress.keepalive_secs must be at least 1".to_string(),
            ));
        }
        if self.files.max_upload_size_mb == 0 {
            return Err(NetfsError::Config(
                "files.max_upload_size_mb must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
