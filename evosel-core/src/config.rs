//! Selector tuning parameters, loadable from TOML.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::distribution::DEFAULT_SERIAL_INDEX_THRESHOLD;

/// Default tolerance of the sum-to-one check, in units in the last place.
pub const DEFAULT_MAX_ULP_DISTANCE: u64 = 10_000_000_000;

/// Tuning parameters for [`ProbabilitySelector`](crate::ProbabilitySelector).
///
/// ```toml
/// serial_index_threshold = 35
/// max_ulp_distance = 10000000000
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Cumulative vectors up to this length are searched linearly.
    pub serial_index_threshold: usize,
    /// Allowed distance between the probability sum and 1.0.
    pub max_ulp_distance: u64,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            serial_index_threshold: DEFAULT_SERIAL_INDEX_THRESHOLD,
            max_ulp_distance: DEFAULT_MAX_ULP_DISTANCE,
        }
    }
}

/// Errors from loading a [`SelectorConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl SelectorConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string. Missing keys take
    /// their default values.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_ulp_distance == 0 {
            return Err(ConfigError::Invalid(
                "max_ulp_distance must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    pub fn with_serial_index_threshold(mut self, threshold: usize) -> Self {
        self.serial_index_threshold = threshold;
        self
    }

    pub fn with_max_ulp_distance(mut self, distance: u64) -> Self {
        self.max_ulp_distance = distance;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = SelectorConfig::default();
        assert_eq!(config.serial_index_threshold, 35);
        assert_eq!(config.max_ulp_distance, 10_u64.pow(10));
    }

    #[test]
    fn empty_toml_yields_defaults() {
        let config = SelectorConfig::from_toml("").unwrap();
        assert_eq!(config, SelectorConfig::default());
    }

    #[test]
    fn partial_toml_overrides_given_keys() {
        let config = SelectorConfig::from_toml("serial_index_threshold = 64").unwrap();
        assert_eq!(config.serial_index_threshold, 64);
        assert_eq!(config.max_ulp_distance, DEFAULT_MAX_ULP_DISTANCE);
    }

    #[test]
    fn zero_tolerance_is_rejected() {
        let err = SelectorConfig::from_toml("max_ulp_distance = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = SelectorConfig::from_toml("serial_index_threshold = \"many\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "serial_index_threshold = 8").unwrap();
        writeln!(file, "max_ulp_distance = 1000").unwrap();

        let config = SelectorConfig::from_file(file.path()).unwrap();
        assert_eq!(
            config,
            SelectorConfig::default()
                .with_serial_index_threshold(8)
                .with_max_ulp_distance(1000)
        );
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SelectorConfig::from_file(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("absent.toml"));
    }

    #[test]
    fn round_trips_through_toml() {
        let config = SelectorConfig::default().with_serial_index_threshold(12);
        let text = toml::to_string(&config).unwrap();
        assert_eq!(SelectorConfig::from_toml(&text).unwrap(), config);
    }
}
