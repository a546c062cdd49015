use crate::Result;
use crate::dispatch::MIC_INPUT;
use obskey_rpc::{ConnectOptions, DEFAULT_HOST, DEFAULT_PORT};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

pub const ENV_HOST: &str = "OBS_HOST";
pub const ENV_PORT: &str = "OBS_PORT";
pub const ENV_PASSWORD: &str = "OBS_PASSWORD";

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Input toggled by `Toggle Mic` slots
    #[serde(default = "default_mic_input")]
    pub mic_input: String,

    /// Override for the action slots file
    #[serde(default)]
    pub actions_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            mic_input: default_mic_input(),
            actions_file: None,
        }
    }
}

impl Config {
    /// Load config from file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains invalid JSON.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        super::validation::warn_unknown_fields(&content, "config.json");
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save config to file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// obs-websocket connection parameters
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub password: String,

    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Independent connect attempts made at startup
    #[serde(default = "default_connect_attempts")]
    pub connect_attempts: u32,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_connect_timeout_ms() -> u64 {
    5_000
}
fn default_request_timeout_ms() -> u64 {
    30_000
}
fn default_connect_attempts() -> u32 {
    1
}
fn default_mic_input() -> String {
    MIC_INPUT.to_string()
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            password: String::new(),
            connect_timeout_ms: default_connect_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            connect_attempts: default_connect_attempts(),
        }
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &if self.password.is_empty() { "" } else { "<redacted>" })
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("connect_attempts", &self.connect_attempts)
            .finish()
    }
}

impl ConnectionConfig {
    /// Apply `OBS_HOST`, `OBS_PORT` and `OBS_PASSWORD` from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup. Empty values are ignored, and a
    /// port that does not parse is ignored with a warning.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| lookup(key).filter(|value| !value.is_empty());

        if let Some(host) = lookup(ENV_HOST) {
            self.host = host;
        }
        if let Some(port) = lookup(ENV_PORT) {
            match port.trim().parse() {
                Ok(port) => self.port = port,
                Err(_) => warn!("Ignoring {ENV_PORT}={port}: not a valid port"),
            }
        }
        if let Some(password) = lookup(ENV_PASSWORD) {
            self.password = password;
        }
    }

    /// Number of connect attempts, at least one
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.connect_attempts.max(1)
    }

    #[must_use]
    pub fn to_connect_options(&self) -> ConnectOptions {
        ConnectOptions::new(self.host.clone(), self.port, self.password.clone())
            .with_connect_timeout(Duration::from_millis(self.connect_timeout_ms))
            .with_request_timeout(Duration::from_millis(self.request_timeout_ms))
    }
}
