//! Runtime configuration with sensible defaults.
//!
//! [`AppConfig`] holds the non-secret settings: provider endpoint, request
//! timeouts and how many results are handed to the LLM. Credentials live in
//! the credential store, never here.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

/// Directory name under the platform config dir.
pub const APP_DIR: &str = "openresearch";

/// File name of the TOML config inside [`config_dir`].
pub const CONFIG_FILE: &str = "config.toml";

pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://google.serper.dev";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL of the search provider; the source name is appended as path.
    pub search_endpoint: String,
    /// Timeout for one search request, in seconds.
    pub search_timeout_seconds: u64,
    /// Timeout for one synthesis request, in seconds.
    pub synthesis_timeout_seconds: u64,
    /// Maximum number of results embedded in the synthesis prompt.
    pub max_context_results: usize,
    /// Sampling temperature for the synthesis call.
    pub temperature: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            search_endpoint: DEFAULT_SEARCH_ENDPOINT.to_string(),
            search_timeout_seconds: 15,
            synthesis_timeout_seconds: 60,
            max_context_results: 20,
            temperature: 0.7,
        }
    }
}

impl AppConfig {
    /// Load from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No config at {:?}, using defaults", path);
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(format!("{}: {e}", path.display()))),
        };

        let config: Self = toml::from_str(&raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the default location, see [`config_dir`].
    pub fn load() -> Result<Self, ConfigError> {
        match config_dir() {
            Some(dir) => Self::load_from(&dir.join(CONFIG_FILE)),
            None => Ok(Self::default()),
        }
    }

    /// Checks:
    /// - `search_endpoint` must not be blank
    /// - both timeouts must be greater than 0
    /// - `max_context_results` must be greater than 0
    /// - `temperature` must lie in `0.0..=2.0`
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.search_endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid("search_endpoint must not be empty".into()));
        }
        if self.search_timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "search_timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.synthesis_timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "synthesis_timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.max_context_results == 0 {
            return Err(ConfigError::Invalid(
                "max_context_results must be greater than 0".into(),
            ));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::Invalid(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }
        Ok(())
    }

    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_seconds)
    }

    pub fn synthesis_timeout(&self) -> Duration {
        Duration::from_secs(self.synthesis_timeout_seconds)
    }
}

/// Per-user directory holding `config.toml` and the credential record.
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sensible_values() {
        let config = AppConfig::default();
        assert_eq!(config.search_endpoint, "https://google.serper.dev");
        assert_eq!(config.search_timeout(), Duration::from_secs(15));
        assert_eq!(config.synthesis_timeout(), Duration::from_secs(60));
        assert_eq!(config.max_context_results, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = AppConfig::load_from(&dir.path().join("nope.toml")).expect("load");
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "search_timeout_seconds = 5\n").expect("write");

        let config = AppConfig::load_from(&path).expect("load");
        assert_eq!(config.search_timeout_seconds, 5);
        assert_eq!(config.synthesis_timeout_seconds, 60);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "search_timeout_seconds = \"soon\"\n").expect("write");

        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn zero_timeout_rejected() {
        let config = AppConfig {
            synthesis_timeout_seconds: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("synthesis_timeout_seconds"));
    }

    #[test]
    fn blank_endpoint_rejected() {
        let config = AppConfig {
            search_endpoint: "  ".into(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_context_rejected() {
        let config = AppConfig {
            max_context_results: 0,
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().to_string().contains("max_context_results"));
    }

    #[test]
    fn out_of_range_temperature_rejected() {
        let config = AppConfig {
            temperature: 3.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
