use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Digits beyond this carry no information for an f64.
pub const MAX_PRECISION: usize = 17;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse Error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Validation Error: {0}")]
    Validation(String),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LoggerConfig {
    /// Target file, relative paths resolve against the platform directory.
    pub path: String,
    pub header: Vec<String>,
    pub log_time: bool,
    pub log_millis: bool,
    pub to_console: bool,
    pub precision: usize,
    pub timestamp_header: String,
    pub enabled: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            header: Vec::new(),
            log_time: true,
            log_millis: true,
            to_console: false,
            precision: 2,
            timestamp_header: "timestamp".to_string(),
            enabled: true,
        }
    }
}

impl LoggerConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: LoggerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.precision > MAX_PRECISION {
            return Err(ConfigError::Validation(format!(
                "precision {} exceeds the maximum of {}",
                self.precision, MAX_PRECISION
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LoggerConfig::default();
        assert!(config.log_time);
        assert!(config.log_millis);
        assert!(!config.to_console);
        assert!(config.enabled);
        assert_eq!(config.precision, 2);
        assert_eq!(config.timestamp_header, "timestamp");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = LoggerConfig::from_toml_str(
            r#"
path = "runs/imu.csv"
header = ["ax", "ay", "az"]
log_millis = false
"#,
        )
        .unwrap();
        assert_eq!(config.path, "runs/imu.csv");
        assert_eq!(config.header, vec!["ax", "ay", "az"]);
        assert!(!config.log_millis);
        assert!(config.log_time);
        assert_eq!(config.precision, 2);
    }

    #[test]
    fn test_precision_validation() {
        let err = LoggerConfig::from_toml_str("precision = 40").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_parse_error() {
        let err = LoggerConfig::from_toml_str("header = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
