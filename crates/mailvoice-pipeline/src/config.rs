//! Configuration for the pipeline

use serde::{Deserialize, Serialize};

/// Configuration for a [`Pipeline`](crate::Pipeline)
///
/// Call deadlines are deliberately absent: timeouts belong to the adapters,
/// the graph itself imposes none.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// DPI used when rasterizing PDF pages for the vision pass
    #[serde(default = "default_raster_dpi")]
    pub raster_dpi: u32,

    /// Maximum email text length (characters)
    #[serde(default = "default_max_text_length")]
    pub max_text_length: usize,
}

fn default_raster_dpi() -> u32 {
    300
}

fn default_max_text_length() -> usize {
    50_000
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            raster_dpi: default_raster_dpi(),
            max_text_length: default_max_text_length(),
        }
    }
}

impl PipelineConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.raster_dpi == 0 {
            return Err("raster_dpi must be greater than 0".to_string());
        }
        if self.max_text_length == 0 {
            return Err("max_text_length must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("failed to parse TOML: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.raster_dpi, 300);
        assert_eq!(config.max_text_length, 50_000);
    }

    #[test]
    fn test_zero_dpi_is_invalid() {
        let mut config = PipelineConfig::default();
        config.raster_dpi = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config = PipelineConfig::from_toml("raster_dpi = 150").unwrap();
        assert_eq!(config.raster_dpi, 150);
        assert_eq!(config.max_text_length, 50_000);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        assert!(PipelineConfig::from_toml("raster_dpi = \"lots\"").is_err());
    }
}
