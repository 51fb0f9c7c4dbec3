//! Session configuration.
//!
//! Read from `<config dir>/equifi/config.toml` (or the file named by
//! `EQUIFI_CONFIG`). API keys can be supplied through the environment instead
//! of the file.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use equifi_core::AnalysisSettings;

pub const DEFAULT_MARKET_DATA_URL: &str = "https://financialmodelingprep.com/api/v3";
pub const DEFAULT_MACRO_DATA_URL: &str = "https://www.alphavantage.co";

/// Market-data endpoints, credentials and analysis tunables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    /// Base URL of the price-history and search service
    pub market_data_url: String,
    pub market_data_api_key: String,
    /// Base URL of the treasury-yield service
    pub macro_data_url: String,
    pub macro_data_api_key: String,
    pub monte_carlo_samples: usize,
    pub frontier_points: usize,
    pub best_outcome_percentile: f64,
    pub request_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        let analysis = AnalysisSettings::default();
        Self {
            market_data_url: DEFAULT_MARKET_DATA_URL.to_string(),
            market_data_api_key: String::new(),
            macro_data_url: DEFAULT_MACRO_DATA_URL.to_string(),
            macro_data_api_key: String::new(),
            monte_carlo_samples: analysis.monte_carlo_samples,
            frontier_points: analysis.frontier_points,
            best_outcome_percentile: analysis.best_outcome_percentile,
            request_timeout_secs: 30,
        }
    }
}

impl SessionConfig {
    /// Load from the default location, then apply environment overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            Self::parse(&content).with_context(|| format!("parsing config {}", path.display()))?
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Config file location.
    ///
    /// Can be overridden with `EQUIFI_CONFIG` environment variable.
    pub fn default_path() -> PathBuf {
        if let Some(path) = env_value("EQUIFI_CONFIG") {
            return PathBuf::from(path);
        }

        directories::BaseDirs::new()
            .map(|dirs| dirs.config_dir().join("equifi").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("equifi.toml"))
    }

    fn apply_env_overrides(&mut self) {
        if let Some(key) = env_value("EQUIFI_MARKET_DATA_API_KEY") {
            self.market_data_api_key = key;
        }
        if let Some(key) = env_value("EQUIFI_MACRO_DATA_API_KEY") {
            self.macro_data_api_key = key;
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Analysis tunables with the configured sizes.
    pub fn analysis_settings(&self) -> AnalysisSettings {
        AnalysisSettings {
            frontier_points: self.frontier_points,
            monte_carlo_samples: self.monte_carlo_samples,
            best_outcome_percentile: self.best_outcome_percentile,
            ..AnalysisSettings::default()
        }
    }
}

/// Non-blank value of an environment variable.
fn env_value(key: &str) -> Option<String> {
    let value = env::var(key).ok()?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.market_data_url, DEFAULT_MARKET_DATA_URL);
        assert_eq!(config.monte_carlo_samples, 500);
        assert_eq!(config.frontier_points, 100);
        assert_eq!(config.best_outcome_percentile, 0.99);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_parse_partial_file() {
        let config = SessionConfig::parse(
            r#"
            market_data_api_key = "abc"
            frontier_points = 25
            "#,
        )
        .unwrap();

        assert_eq!(config.market_data_api_key, "abc");
        assert_eq!(config.frontier_points, 25);
        assert_eq!(config.monte_carlo_samples, 500);
        assert_eq!(config.macro_data_url, DEFAULT_MACRO_DATA_URL);

        let settings = config.analysis_settings();
        assert_eq!(settings.frontier_points, 25);
        assert_eq!(settings.monte_carlo_samples, 500);
    }

    #[test]
    fn test_parse_rejects_bad_types() {
        assert!(SessionConfig::parse("frontier_points = \"many\"").is_err());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = SessionConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.frontier_points, 100);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "monte_carlo_samples = 42\nrequest_timeout_secs = 5\n").unwrap();

        let config = SessionConfig::load_from(&path).unwrap();
        assert_eq!(config.monte_carlo_samples, 42);
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
    }
}
