//! Capture configuration via `tracespy.toml`

use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use tracespy_core::Error;
use tracespy_observe::{ObserverConfig, ObserverConfigError};
use tracespy_wire::{WriterConfig, WriterConfigError};

/// Config file name looked up next to the capture.
pub const CONFIG_FILE_NAME: &str = "tracespy.toml";

/// Capture configuration.
///
/// # Example
///
/// ```toml
/// start_suspended = false
/// watched_apis = [1, 2]
///
/// [writer]
/// buffer_threshold = 32768
/// buffered = true
/// type_cache_shards = 4
///
/// [observer]
/// merge_threshold = 0
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Open the session with tracing suspended.
    #[serde(default)]
    pub start_suspended: bool,
    /// APIs whose calls are traced; absent means all of them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watched_apis: Option<Vec<u8>>,
    /// Chunk writer and encoder settings.
    #[serde(default)]
    pub writer: WriterConfig,
    /// Memory observation settings.
    #[serde(default)]
    pub observer: ObserverConfig,
}

impl CaptureConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set writer configuration (builder pattern).
    pub fn with_writer(mut self, writer: WriterConfig) -> Self {
        self.writer = writer;
        self
    }

    /// Set observer configuration (builder pattern).
    pub fn with_observer(mut self, observer: ObserverConfig) -> Self {
        self.observer = observer;
        self
    }

    /// Restrict tracing to `apis` (builder pattern).
    pub fn with_watched_apis(mut self, apis: impl IntoIterator<Item = u8>) -> Self {
        self.watched_apis = Some(apis.into_iter().collect());
        self
    }

    /// Start suspended (builder pattern).
    pub fn with_start_suspended(mut self, suspended: bool) -> Self {
        self.start_suspended = suspended;
        self
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.writer.validate()?;
        self.observer.validate()?;
        Ok(())
    }

    /// Create a configuration for tests: unbuffered writes, all APIs.
    pub fn for_testing() -> Self {
        CaptureConfig {
            start_suspended: false,
            watched_apis: None,
            writer: WriterConfig::for_testing(),
            observer: ObserverConfig::for_testing(),
        }
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# tracespy capture configuration

# Open the capture with tracing suspended (default: false)
start_suspended = false

# API indices to trace; comment out to trace every API.
# watched_apis = [1, 2]

[writer]
# Bytes buffered before a sink write (default: 32768)
buffer_threshold = 32768
# Set to false to write every chunk as soon as it is framed
buffered = true
# Independently lockable type-id caches, 1..=64 (default: 4)
type_cache_shards = 4

[observer]
# Gap in bytes across which observed ranges are merged (default: 0)
merge_threshold = 0
"#
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: CaptureConfig =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate configuration from a file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> Result<(), ConfigError> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|source| ConfigError::Write {
                path: path.display().to_string(),
                source,
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to `path`.
    pub fn write_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        std::fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.display().to_string(),
            source,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        /// File path
        path: String,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// The file could not be written.
    #[error("Failed to write config file '{path}': {source}")]
    Write {
        /// File path
        path: String,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// The TOML did not parse.
    #[error("Failed to parse config: {0}")]
    Parse(String),

    /// The configuration could not be serialized.
    #[error("Failed to serialize config: {0}")]
    Serialize(String),

    /// Writer settings are invalid.
    #[error(transparent)]
    Writer(#[from] WriterConfigError),

    /// Observer settings are invalid.
    #[error(transparent)]
    Observer(#[from] ObserverConfigError),
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::Read { source, .. } | ConfigError::Write { source, .. } => {
                Error::IoError(source)
            }
            other => Error::InvalidConfig(other.to_string()),
        }
    }
}
