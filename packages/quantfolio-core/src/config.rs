//! Driver configuration loaded from TOML.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Where to find input data and how much to invest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Weights table (CSV)
    pub weights_path: PathBuf,
    /// Prices table (CSV)
    pub prices_path: PathBuf,
    /// Weights column to allocate by
    pub weight_column: String,
    /// Amount invested when quantifying
    pub initial_amount: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            weights_path: PathBuf::from("weights.csv"),
            prices_path: PathBuf::from("prices.csv"),
            weight_column: "portafolio 1".to_string(),
            initial_amount: 1_000_000.0,
        }
    }
}

impl Config {
    /// Get the default config file path.
    ///
    /// Default path: `~/.quantfolio/config.toml`
    /// Can be overridden with `QUANTFOLIO_CONFIG` environment variable.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var("QUANTFOLIO_CONFIG") {
            return PathBuf::from(path);
        }

        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".quantfolio/config.toml"))
            .unwrap_or_else(|| PathBuf::from("quantfolio.toml"))
    }

    /// Load config from the default path.
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::default_path())
    }

    /// Load config from a specific path. A missing file yields defaults.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse config from TOML text; absent keys take their defaults.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
