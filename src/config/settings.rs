//! Application settings and configuration management

use crate::backend::DEFAULT_LOW_VOLUME;
use crate::bus::WebSocketBus;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Application settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Settings {
    /// Message bus connection
    #[serde(default)]
    pub bus: BusSettings,
    /// Audio backends
    #[serde(default)]
    pub audio: AudioSettings,
}

/// Where the assistant's message bus listens
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BusSettings {
    #[serde(default = "default_bus_host")]
    pub host: String,
    #[serde(default = "default_bus_port")]
    pub port: u16,
    #[serde(default = "default_bus_route")]
    pub route: String,
    #[serde(default)]
    pub ssl: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AudioSettings {
    /// Backend preferred when it supports the requested tracks
    #[serde(default, rename = "default-backend", alias = "default_backend")]
    pub default_backend: Option<String>,
    #[serde(default)]
    pub backends: BTreeMap<String, BackendConfig>,
}

/// One entry of the `backends` table
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BackendConfig {
    /// Engine kind, e.g. `vlc`
    #[serde(rename = "type")]
    pub backend_type: String,
    #[serde(default = "default_active")]
    pub active: bool,
    /// Lower the volume while the assistant listens or speaks
    #[serde(default)]
    pub duck: bool,
    #[serde(default = "default_low_volume")]
    pub low_volume: u8,
    /// Fixed start volume; the host volume is queried when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<u8>,
}

fn default_bus_host() -> String {
    "0.0.0.0".to_string()
}

fn default_bus_port() -> u16 {
    8181
}

fn default_bus_route() -> String {
    "/core".to_string()
}

fn default_active() -> bool {
    true
}

fn default_low_volume() -> u8 {
    DEFAULT_LOW_VOLUME
}

impl Default for BusSettings {
    fn default() -> Self {
        BusSettings {
            host: default_bus_host(),
            port: default_bus_port(),
            route: default_bus_route(),
            ssl: false,
        }
    }
}

impl BusSettings {
    pub fn url(&self) -> String {
        WebSocketBus::bus_url(&self.host, self.port, &self.route, self.ssl)
    }
}

impl Default for AudioSettings {
    fn default() -> Self {
        let mut backends = BTreeMap::new();
        backends.insert(
            "vlc".to_string(),
            BackendConfig {
                duck: true,
                ..BackendConfig::new("vlc")
            },
        );
        AudioSettings {
            default_backend: Some("vlc".to_string()),
            backends,
        }
    }
}

impl BackendConfig {
    /// An active, non-ducking backend of the given type.
    pub fn new(backend_type: impl Into<String>) -> Self {
        BackendConfig {
            backend_type: backend_type.into(),
            active: default_active(),
            duck: false,
            low_volume: default_low_volume(),
            volume: None,
        }
    }
}

/// Error types for configuration operations
#[derive(Debug)]
pub enum ConfigError {
    IoError(io::Error),
    ParseError(String),
    ValidationError(String),
}

impl From<io::Error> for ConfigError {
    fn from(err: io::Error) -> Self {
        ConfigError::IoError(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "I/O error: {}", e),
            ConfigError::ParseError(s) => write!(f, "Parse error: {}", s),
            ConfigError::ValidationError(s) => write!(f, "Validation error: {}", s),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ConfigError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl Settings {
    /// Load settings from a file, falling back to defaults when it does not exist
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&content)?;
        Ok(settings)
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(&self)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, content)?;
        Ok(())
    }

    /// Get the default config file path
    pub fn default_path() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config").join("duckplay").join("config.json")
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bus.host.trim().is_empty() {
            return Err(ConfigError::ValidationError("Bus host cannot be empty".to_string()));
        }
        if self.bus.port == 0 {
            return Err(ConfigError::ValidationError("Bus port cannot be 0".to_string()));
        }

        for (name, backend) in &self.audio.backends {
            if name.trim().is_empty() {
                return Err(ConfigError::ValidationError("Backend names cannot be empty".to_string()));
            }
            if backend.backend_type.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "Backend '{}' has no type",
                    name
                )));
            }
            if backend.low_volume > 100 {
                return Err(ConfigError::ValidationError(format!(
                    "Backend '{}': low_volume must be 0-100, got {}",
                    name, backend.low_volume
                )));
            }
            if let Some(volume) = backend.volume.filter(|v| *v > 100) {
                return Err(ConfigError::ValidationError(format!(
                    "Backend '{}': volume must be 0-100, got {}",
                    name, volume
                )));
            }
        }

        if let Some(default) = &self.audio.default_backend {
            if !self.audio.backends.contains_key(default) {
                return Err(ConfigError::ValidationError(format!(
                    "Default backend '{}' is not configured",
                    default
                )));
            }
        }

        Ok(())
    }
}
