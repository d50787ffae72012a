//! Configuration loading.
//!
//! Handles paths and persistence for:
//! - Client configuration (`<config_dir>/presence/client.toml`)
//! - The daemon executable directory and launch backoff state
//!
//! Every field is optional in the file. Environment variables override the
//! file so an editor plugin can point a single instance somewhere else.

use fs_err as fs;
use presence_daemon_protocol::{DEFAULT_ADDRESS, DEFAULT_EDITOR_KIND};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

pub const CONFIG_ENV: &str = "PRESENCE_CONFIG";
pub const ADDRESS_ENV: &str = "PRESENCE_ADDRESS";
pub const EDITOR_ENV: &str = "PRESENCE_EDITOR";
pub const ENABLE_ENV: &str = "PRESENCE_ENABLED";

pub const DEFAULT_HEARTBEAT_INTERVAL_SECS: u64 = 15;
pub const DEFAULT_PROBE_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_PROBE_ATTEMPTS: u32 = 30;
pub const DEFAULT_DOWNLOAD_URL: &str = "https://github.com/volskaya/presence/raw/master/bin/";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PresenceConfig {
    pub address: String,
    pub editor: String,
    pub heartbeat_interval_secs: u64,
    pub probe_interval_ms: u64,
    pub probe_attempts: u32,
    pub executable_dir: Option<PathBuf>,
    pub download_url: String,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            editor: DEFAULT_EDITOR_KIND.to_string(),
            heartbeat_interval_secs: DEFAULT_HEARTBEAT_INTERVAL_SECS,
            probe_interval_ms: DEFAULT_PROBE_INTERVAL_MS,
            probe_attempts: DEFAULT_PROBE_ATTEMPTS,
            executable_dir: None,
            download_url: DEFAULT_DOWNLOAD_URL.to_string(),
        }
    }
}

impl PresenceConfig {
    /// Loads the config file named by `PRESENCE_CONFIG` or the default path,
    /// then applies environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let path = env::var(CONFIG_ENV)
            .ok()
            .map(PathBuf::from)
            .or_else(get_config_path);
        let mut config = match path {
            Some(path) => Self::load_from(&path)?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Reads a config file, returning defaults if it doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        Self::parse(&content).map_err(|details| ConfigError::Malformed {
            path: path.to_path_buf(),
            details,
        })
    }

    pub fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|err| err.to_string())
    }

    fn apply_env(&mut self) {
        if let Some(address) = non_empty_env(ADDRESS_ENV) {
            self.address = address;
        }
        if let Some(editor) = non_empty_env(EDITOR_ENV) {
            self.editor = editor;
        }
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs.max(1))
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms)
    }

    /// Directory holding the daemon executable.
    pub fn executable_dir(&self) -> PathBuf {
        self.executable_dir
            .clone()
            .or_else(|| get_data_dir().map(|d| d.join("bin")))
            .unwrap_or_else(|| PathBuf::from("bin"))
    }
}

/// Returns true unless `PRESENCE_ENABLED` explicitly turns daemon traffic off.
pub fn daemon_enabled() -> bool {
    match env::var(ENABLE_ENV) {
        Ok(value) => !matches!(
            value.as_str(),
            "0" | "false" | "FALSE" | "no" | "NO" | "off" | "OFF"
        ),
        Err(_) => true,
    }
}

/// Returns the path to the presence configuration directory.
pub fn get_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("presence"))
}

/// Returns the path to the client configuration file.
pub fn get_config_path() -> Option<PathBuf> {
    get_config_dir().map(|d| d.join("client.toml"))
}

/// Returns the directory for client-owned data (executable, logs, backoff state).
pub fn get_data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("presence"))
}

/// Returns the path to the launch backoff state file.
pub fn get_backoff_state_path() -> Option<PathBuf> {
    get_data_dir().map(|d| d.join("launch-backoff.json"))
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
