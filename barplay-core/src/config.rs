//! Chart configuration, stored as TOML.
//!
//! Every field has a default, so a config file only needs the keys it changes:
//!
//! ```toml
//! symbols = ["DEMO", "ACME"]
//! synthetic_bars = 500
//! synthetic_start = "2023-01-02"
//! default_speed_ms = 250
//! ```

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::replay::DEFAULT_SPEED_MS;

/// Master seed used when the config does not name one.
pub const DEFAULT_MASTER_SEED: u64 = 42;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Symbols offered when cycling. Synthetic data is generated per symbol.
    pub symbols: Vec<String>,
    pub synthetic_bars: usize,
    pub synthetic_seed: Option<u64>,
    /// Date of the first generated bar (UTC midnight).
    pub synthetic_start: NaiveDate,
    pub default_speed_ms: u64,
    pub min_speed_ms: u64,
    pub max_speed_ms: u64,
    /// `tracing` filter directive, e.g. `info` or `barplay_core=debug`.
    pub log_filter: String,
    /// Overrides the platform settings location.
    pub settings_path: Option<PathBuf>,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            symbols: ["DEMO", "ACME", "GLOBEX", "INITECH"]
                .into_iter()
                .map(String::from)
                .collect(),
            synthetic_bars: 300,
            synthetic_seed: None,
            synthetic_start: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap_or_default(),
            default_speed_ms: DEFAULT_SPEED_MS,
            min_speed_ms: 25,
            max_speed_ms: 5_000,
            log_filter: "info".into(),
            settings_path: None,
        }
    }
}

impl ChartConfig {
    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given and present; otherwise use defaults.
    ///
    /// A file that exists but does not parse is an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) if path.exists() => Self::from_file(path),
            Some(path) => {
                info!(path = %path.display(), "config file not found, using defaults");
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.symbols.iter().all(|s| s.trim().is_empty()) {
            return Err(ConfigError::Invalid("symbols must name at least one symbol".into()));
        }
        if self.synthetic_bars == 0 {
            return Err(ConfigError::Invalid("synthetic_bars must be >= 1".into()));
        }
        if self.min_speed_ms == 0 || self.min_speed_ms > self.max_speed_ms {
            return Err(ConfigError::Invalid(format!(
                "speed bounds must satisfy 1 <= min_speed_ms <= max_speed_ms, got {}..{}",
                self.min_speed_ms, self.max_speed_ms
            )));
        }
        if !(self.min_speed_ms..=self.max_speed_ms).contains(&self.default_speed_ms) {
            return Err(ConfigError::Invalid(format!(
                "default_speed_ms {} outside {}..={}",
                self.default_speed_ms, self.min_speed_ms, self.max_speed_ms
            )));
        }
        Ok(())
    }

    pub fn master_seed(&self) -> u64 {
        self.synthetic_seed.unwrap_or(DEFAULT_MASTER_SEED)
    }

    /// Unix seconds of the first synthetic bar.
    pub fn synthetic_start_time(&self) -> i64 {
        self.synthetic_start
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or(0)
    }

    pub fn clamp_speed(&self, speed_ms: u64) -> u64 {
        let max = self.max_speed_ms.max(1);
        speed_ms.clamp(self.min_speed_ms.clamp(1, max), max)
    }

    /// Where session settings are persisted.
    pub fn settings_path(&self) -> Option<PathBuf> {
        self.settings_path.clone().or_else(default_settings_path)
    }
}

/// `<config dir>/barplay/settings.json`, if the platform has a config dir.
pub fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("barplay").join("settings.json"))
}

/// `<config dir>/barplay/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("barplay").join("config.toml"))
}
