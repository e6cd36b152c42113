//! TOML-based configuration persistence for the remote.
//!
//! Reads and writes `AppConfig` to the platform-appropriate config file:
//! - Windows:  `%APPDATA%\LgtvRemote\config.toml`
//! - Linux:    `~/.config/lgtv-remote/config.toml`
//! - macOS:    `~/Library/Application Support/LgtvRemote/config.toml`
//!
//! # File layout
//!
//! ```toml
//! [tv]
//! address = "192.168.1.100"
//! pairing_key = "4f1c..."      # absent until the first successful pairing
//!
//! [remote]
//! log_level = "info"
//! port = 3000
//! command_timeout_ms = 10000
//! connect_timeout_ms = 60000
//! launch_retry_pause_ms = 500
//! ```
//!
//! The `[tv]` table is the persisted connection record.  It is read once at
//! startup to seed the first connect and rewritten in full after every
//! successful connect, so the file always holds the latest key.
//!
//! # Serde default values
//!
//! Fields annotated with `#[serde(default = "some_fn")]` use the return value
//! of `some_fn()` when the field is absent from the TOML file.  This allows
//! the remote to work on first run and with hand-trimmed config files.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub tv: TvRecord,
    #[serde(default)]
    pub remote: RemoteSettings,
}

/// The persisted connection record: which TV, and the key it issued.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TvRecord {
    /// IP address or hostname of the TV.
    #[serde(default = "default_address")]
    pub address: String,
    /// Client key issued by the TV on pairing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pairing_key: Option<String>,
}

/// Behaviour settings for the remote itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteSettings {
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// TCP port of the TV's SSAP WebSocket endpoint.
    #[serde(default = "default_port")]
    pub port: u16,
    /// How long a caller waits for any single command.
    #[serde(default = "default_command_timeout_ms")]
    pub command_timeout_ms: u64,
    /// How long a caller waits for connect (covers the on-screen pairing prompt).
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Pause between launch attempts when walking alias candidates.
    #[serde(default = "default_launch_retry_pause_ms")]
    pub launch_retry_pause_ms: u64,
}

impl RemoteSettings {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn launch_retry_pause(&self) -> Duration {
        Duration::from_millis(self.launch_retry_pause_ms)
    }
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_address() -> String {
    "192.168.1.100".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_port() -> u16 {
    3000
}
fn default_command_timeout_ms() -> u64 {
    10_000
}
fn default_connect_timeout_ms() -> u64 {
    60_000
}
fn default_launch_retry_pause_ms() -> u64 {
    500
}

impl Default for TvRecord {
    fn default() -> Self {
        Self {
            address: default_address(),
            pairing_key: None,
        }
    }
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            port: default_port(),
            command_timeout_ms: default_command_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            launch_retry_pause_ms: default_launch_retry_pause_ms(),
        }
    }
}

// ── Config store port ─────────────────────────────────────────────────────────

/// Where the session controller reads and writes the connection record.
pub trait ConfigStore: Send + Sync {
    /// Reads the stored record (defaults when nothing is stored yet).
    fn load_record(&self) -> Result<TvRecord, ConfigError>;

    /// Overwrites the stored record.  Never merges with what was there.
    fn save_record(&self, record: &TvRecord) -> Result<(), ConfigError>;
}

/// File-backed store.  Rewriting the record preserves the `[remote]` table.
#[derive(Debug, Clone)]
pub struct TomlConfigStore {
    path: PathBuf,
}

impl TomlConfigStore {
    /// A store backed by an explicit file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// A store at the platform default location.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoPlatformConfigDir`] when the base directory
    /// cannot be determined from the environment.
    pub fn at_default_location() -> Result<Self, ConfigError> {
        Ok(Self::new(config_file_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the whole file, returning defaults if it does not exist.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        load_config_from(&self.path)
    }

    /// Writes the whole file, creating parent directories as needed.
    pub fn save(&self, config: &AppConfig) -> Result<(), ConfigError> {
        save_config_to(&self.path, config)
    }
}

impl ConfigStore for TomlConfigStore {
    fn load_record(&self) -> Result<TvRecord, ConfigError> {
        Ok(self.load()?.tv)
    }

    fn save_record(&self, record: &TvRecord) -> Result<(), ConfigError> {
        let mut config = self.load()?;
        config.tv = record.clone();
        self.save(&config)
    }
}

/// In-memory store, used by tests and the `--mock` CLI mode.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    record: Mutex<TvRecord>,
    saves: Mutex<Vec<TvRecord>>,
}

impl MemoryConfigStore {
    pub fn new(record: TvRecord) -> Self {
        Self {
            record: Mutex::new(record),
            saves: Mutex::new(Vec::new()),
        }
    }

    /// Every record written so far, oldest first.
    pub fn saved_records(&self) -> Vec<TvRecord> {
        self.saves.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl ConfigStore for MemoryConfigStore {
    fn load_record(&self) -> Result<TvRecord, ConfigError> {
        Ok(self.record.lock().map(|r| r.clone()).unwrap_or_default())
    }

    fn save_record(&self, record: &TvRecord) -> Result<(), ConfigError> {
        if let Ok(mut current) = self.record.lock() {
            *current = record.clone();
        }
        if let Ok(mut saves) = self.saves.lock() {
            saves.push(record.clone());
        }
        Ok(())
    }
}

// ── File helpers ──────────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `AppConfig` from `path`, returning `AppConfig::default()` if the
/// file does not yet exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Persists `config` to `path`, creating the directory if needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config_to(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolves the platform config directory including the app subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("LgtvRemote"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("lgtv-remote"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("LgtvRemote")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
