// Required external crates for configuration management and serialization
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

use crate::model::DeviceRequest;

/// Configuration for model loading
#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    /// Default checkpoint directory used by `load` without an argument
    pub directory: PathBuf,
    /// Compute device: "cpu" or "cuda"
    pub device: String,
}

/// Configuration for analysis parameters
#[derive(Debug, Deserialize, Clone)]
pub struct AnalysisConfig {
    /// Maximum token length for the encoder (128-1024)
    pub max_length: usize,
    /// Confidence below this triggers a manual-review warning (0.0-1.0)
    pub confidence_threshold: f32,
}

/// Display toggles for the interactive session
#[derive(Debug, Deserialize, Clone)]
pub struct DisplayConfig {
    /// Report the history position after each saved analysis
    pub auto_scroll: bool,
    /// Show the full per-class probability breakdown
    pub show_probabilities: bool,
    /// Automatically append completed analyses to the history
    pub save_to_history: bool,
}

/// Configuration for application logging
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Log level (debug, info, warn, error)
    pub level: String,
    /// Optional log directory
    pub file: Option<PathBuf>,
}

/// Main settings struct that contains all configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// Model-related settings
    pub model: ModelConfig,
    /// Analysis-related settings
    pub analysis: AnalysisConfig,
    /// Display-related settings
    pub display: DisplayConfig,
    /// Logging-related settings
    pub logging: LoggingConfig,
}

impl Settings {
    /// Creates a new Settings instance by loading config from multiple
    /// sources in the following order of precedence (highest to lowest):
    /// 1. Environment variables prefixed with RUBERT_
    /// 2. Local config file (local.toml) if present
    /// 3. Default config file (default.toml)
    pub fn new() -> Result<Self, ConfigError> {
        let config_dir = std::env::current_dir()
            .map_err(|e| ConfigError::Message(format!("Failed to get current directory: {}", e)))?
            .join("config");

        if !config_dir.exists() {
            return Err(ConfigError::Message(format!(
                "Config directory not found at: {}",
                config_dir.display()
            )));
        }

        let default_config = config_dir.join("default.toml");
        if !default_config.exists() {
            return Err(ConfigError::Message(format!(
                "Default configuration file not found at: {}",
                default_config.display()
            )));
        }

        let local_config = config_dir.join("local.toml");

        let default_config_path = default_config.to_string_lossy();
        let local_config_path = local_config.to_string_lossy();

        let settings = Config::builder()
            .add_source(File::with_name(&default_config_path))
            .add_source(File::with_name(&local_config_path).required(false))
            .add_source(Environment::with_prefix("RUBERT").separator("_"))
            .build()?
            .try_deserialize::<Settings>()?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<(), ConfigError> {
        validate_max_length(self.analysis.max_length).map_err(ConfigError::Message)?;
        validate_threshold(self.analysis.confidence_threshold).map_err(ConfigError::Message)?;

        self.model
            .device
            .parse::<DeviceRequest>()
            .map_err(ConfigError::Message)?;

        match self.logging.level.to_lowercase().as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => Ok(()),
            _ => Err(ConfigError::Message(format!(
                "Invalid logging level: {}. Must be one of: error, warn, info, debug, trace",
                self.logging.level
            ))),
        }?;

        if let Some(log_dir) = &self.logging.file {
            if !log_dir.exists() {
                std::fs::create_dir_all(log_dir).map_err(|e| {
                    ConfigError::Message(format!(
                        "Failed to create log directory at {}: {}",
                        log_dir.display(),
                        e
                    ))
                })?;
            }
        }

        Ok(())
    }
}

/// Bounds for the encoder length, matching the classifier's usable range.
pub const MAX_LENGTH_MIN: usize = 128;
pub const MAX_LENGTH_MAX: usize = 1024;

/// Validates a max token length value, shared between config loading and the
/// interactive `set` command.
pub fn validate_max_length(value: usize) -> Result<(), String> {
    if !(MAX_LENGTH_MIN..=MAX_LENGTH_MAX).contains(&value) {
        return Err(format!(
            "max_length must be between {} and {}, got: {}",
            MAX_LENGTH_MIN, MAX_LENGTH_MAX, value
        ));
    }
    Ok(())
}

/// Validates a confidence threshold value.
pub fn validate_threshold(value: f32) -> Result<(), String> {
    if !(0.0..=1.0).contains(&value) {
        return Err(format!(
            "confidence_threshold must be between 0.0 and 1.0, got: {}",
            value
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_length_bounds() {
        assert!(validate_max_length(128).is_ok());
        assert!(validate_max_length(512).is_ok());
        assert!(validate_max_length(1024).is_ok());
        assert!(validate_max_length(127).is_err());
        assert!(validate_max_length(1025).is_err());
        assert!(validate_max_length(0).is_err());
    }

    #[test]
    fn threshold_bounds() {
        assert!(validate_threshold(0.0).is_ok());
        assert!(validate_threshold(0.7).is_ok());
        assert!(validate_threshold(1.0).is_ok());
        assert!(validate_threshold(-0.1).is_err());
        assert!(validate_threshold(1.1).is_err());
    }
}
