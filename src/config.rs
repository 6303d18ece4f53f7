//! Application configuration loaded from YAML

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::grid::FarmGrid;
use crate::risk::RiskModelKind;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("config validation error: {0}")]
    Validation(String),
}

/// Top-level configuration. Every section has defaults, so an empty file is valid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub farm: FarmConfig,
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub alerts: AlertsConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FarmConfig {
    #[serde(default = "default_rows")]
    pub rows: u32,
    #[serde(default = "default_cols")]
    pub cols: u32,
}

fn default_rows() -> u32 {
    5
}

fn default_cols() -> u32 {
    5
}

impl Default for FarmConfig {
    fn default() -> Self {
        Self {
            rows: default_rows(),
            cols: default_cols(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    #[serde(default)]
    pub model: RiskModelKind,
    #[serde(default = "default_low_below")]
    pub low_below: u8,
    #[serde(default = "default_medium_below")]
    pub medium_below: u8,
}

fn default_low_below() -> u8 {
    30
}

fn default_medium_below() -> u8 {
    60
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            model: RiskModelKind::default(),
            low_below: default_low_below(),
            medium_below: default_medium_below(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertsConfig {
    #[serde(default = "default_web_search_delay_ms")]
    pub web_search_delay_ms: u64,
}

fn default_web_search_delay_ms() -> u64 {
    3_000
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            web_search_delay_ms: default_web_search_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = if contents.trim().is_empty() {
            AppConfig::default()
        } else {
            serde_yaml::from_str(contents)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        FarmGrid::check_size(self.farm.rows, self.farm.cols)
            .map_err(|err| ConfigError::Validation(err.to_string()))?;
        if self.risk.low_below > self.risk.medium_below {
            return Err(ConfigError::Validation(format!(
                "risk.low_below ({}) must not exceed risk.medium_below ({})",
                self.risk.low_below, self.risk.medium_below
            )));
        }
        if self.risk.medium_below > 100 {
            return Err(ConfigError::Validation(
                "risk.medium_below must be at most 100".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = AppConfig::from_yaml_str("").unwrap();

        assert_eq!(config.farm.rows, 5);
        assert_eq!(config.farm.cols, 5);
        assert_eq!(config.risk.model, RiskModelKind::Seasonal);
        assert_eq!(config.risk.low_below, 30);
        assert_eq!(config.risk.medium_below, 60);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let yaml = "farm:\n  rows: 8\nrisk:\n  model: site\n";
        let config = AppConfig::from_yaml_str(yaml).unwrap();

        assert_eq!(config.farm.rows, 8);
        assert_eq!(config.farm.cols, 5);
        assert_eq!(config.risk.model, RiskModelKind::Site);
        assert_eq!(config.alerts.web_search_delay_ms, 3_000);
    }

    #[test]
    fn inverted_thresholds_are_rejected() {
        let yaml = "risk:\n  low_below: 70\n  medium_below: 40\n";
        let err = AppConfig::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn zero_sized_farm_is_rejected() {
        let err = AppConfig::from_yaml_str("farm:\n  rows: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn oversized_farm_is_rejected() {
        let err = AppConfig::from_yaml_str("farm:\n  rows: 70000\n  cols: 70000\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(AppConfig::from_yaml_str("farm:\n  rows: 100\n  cols: 100\n").is_ok());
    }

    #[test]
    fn config_round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("granja.yaml");
        let mut config = AppConfig::default();
        config.server.port = 9090;
        config.to_yaml(&path).unwrap();

        let loaded = AppConfig::from_yaml(&path).unwrap();
        assert_eq!(loaded.server.port, 9090);
    }
}
