use crate::defaults;
use crate::error::{CamnodeError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub camera: CameraConfig,
    pub capture: CaptureConfig,
    pub transcode: TranscodeConfig,
    pub storage: StorageConfig,
}

/// Coordinator connection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub reconnect_delay_ms: u64,
}

/// Camera identity. `None` means a fresh identity is generated at startup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct CameraConfig {
    pub id: Option<String>,
}

/// Capture process
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CaptureConfig {
    pub program: String,
    pub width: u32,
    pub height: u32,
    pub duration_ms: u64,
    pub stop_grace_ms: u64,
}

/// Transcode process
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TranscodeConfig {
    pub program: String,
    pub framerate: u32,
}

/// Intermediate files and streaming
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub work_dir: PathBuf,
    pub raw_file: String,
    pub transcoded_file: String,
    pub chunk_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: defaults::SERVER_HOST.to_string(),
            port: defaults::SERVER_PORT,
            reconnect_delay_ms: defaults::RECONNECT_DELAY_MS,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            program: defaults::CAPTURE_PROGRAM.to_string(),
            width: defaults::CAPTURE_WIDTH,
            height: defaults::CAPTURE_HEIGHT,
            duration_ms: defaults::CAPTURE_DURATION_MS,
            stop_grace_ms: defaults::STOP_GRACE_MS,
        }
    }
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            program: defaults::TRANSCODE_PROGRAM.to_string(),
            framerate: defaults::TRANSCODE_FRAMERATE,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("."),
            raw_file: defaults::RAW_FILE.to_string(),
            transcoded_file: defaults::TRANSCODED_FILE.to_string(),
            chunk_size: defaults::CHUNK_SIZE,
        }
    }
}

impl StorageConfig {
    /// Path of the raw capture output.
    pub fn raw_path(&self) -> PathBuf {
        self.work_dir.join(&self.raw_file)
    }

    /// Path of the transcoded output.
    pub fn transcoded_path(&self) -> PathBuf {
        self.work_dir.join(&self.transcoded_file)
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Missing fields use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if the file doesn't exist
    ///
    /// Invalid TOML is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(CamnodeError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - CAMNODE_HOST → server.host
    /// - CAMNODE_PORT → server.port
    /// - CAMNODE_CAMERA_ID → camera.id
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(host) = std::env::var("CAMNODE_HOST")
            && !host.is_empty()
        {
            self.server.host = host;
        }

        if let Ok(port) = std::env::var("CAMNODE_PORT")
            && !port.is_empty()
        {
            self.server.port = port
                .parse()
                .map_err(|e| CamnodeError::ConfigInvalidValue {
                    key: "CAMNODE_PORT".to_string(),
                    message: format!("'{}': {}", port, e),
                })?;
        }

        if let Ok(id) = std::env::var("CAMNODE_CAMERA_ID")
            && !id.is_empty()
        {
            self.camera.id = Some(id);
        }

        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        if self.storage.chunk_size == 0 {
            return Err(CamnodeError::ConfigInvalidValue {
                key: "storage.chunk_size".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if self.storage.raw_file == self.storage.transcoded_file {
            return Err(CamnodeError::ConfigInvalidValue {
                key: "storage.transcoded_file".to_string(),
                message: "must differ from storage.raw_file".to_string(),
            });
        }
        Ok(())
    }

    /// Serialize the effective configuration back to TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| CamnodeError::Other(e.to_string()))
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/camnode/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("camnode")
            .join("config.toml")
    }
}
