//! Configuration file parsing for the server
//!
//! Loads settings from TOML files: bind address, the chat and document
//! service credentials, and the embedded pipeline section.

use mailvoice_pipeline::PipelineConfig;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Server configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Missing required field
    #[error("missing required configuration field: {0}")]
    MissingField(String),

    /// A field value is out of range
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Server configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1")
    pub bind_address: String,

    /// Bind port (e.g., 8080)
    pub bind_port: u16,

    /// Chat-completions service (text and vision branches)
    pub chat: ChatConfig,

    /// Document-analysis service (prebuilt invoice model)
    pub document: DocumentConfig,

    /// Pipeline tuning
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Chat-completions service settings
#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    /// Base URL (e.g., "https://api.openai.com/v1")
    pub endpoint: String,

    /// API key for bearer auth
    pub api_key: String,

    /// Model name (must support image inputs for the vision branches)
    pub model: String,
}

/// Document-analysis service settings
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentConfig {
    /// Base URL of the analysis endpoint
    pub endpoint: String,

    /// Subscription key
    pub api_key: String,
}

impl ServerConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: ServerConfig = toml::from_str(&contents)?;

        if config.chat.api_key.is_empty() {
            return Err(ConfigError::MissingField("chat.api_key".to_string()));
        }
        if config.document.api_key.is_empty() {
            return Err(ConfigError::MissingField("document.api_key".to_string()));
        }
        config.pipeline.validate().map_err(ConfigError::Invalid)?;

        Ok(config)
    }

    /// Create a default configuration for testing
    pub fn default_test_config() -> Self {
        ServerConfig {
            bind_address: "127.0.0.1".to_string(),
            bind_port: 8080,
            chat: ChatConfig {
                endpoint: "http://localhost:8000/v1".to_string(),
                api_key: "test-key-do-not-use-in-production".to_string(),
                model: "gpt-4o".to_string(),
            },
            document: DocumentConfig {
                endpoint: "http://localhost:9000".to_string(),
                api_key: "test-key-do-not-use-in-production".to_string(),
            },
            pipeline: PipelineConfig::default(),
        }
    }

    /// Get the full bind address (address:port)
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.bind_port)
    }
}
