//! Layered runtime settings: code defaults, then an optional TOML file,
//! then `CHAMA_`-prefixed environment overrides.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use chama_core::{CommissionPolicy, FineSchedule, RetryPolicy};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),
}

/// Runtime settings for the reconciliation service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub fines: FineSchedule,
    pub commission: CommissionPolicy,
    pub retry: RetryPolicy,
    /// Decimal places of the smallest currency unit (0 = whole units).
    pub unit_scale: u32,
    /// Path of the SQLite ledger database; in-memory stores ignore it.
    pub store_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fines: FineSchedule::default(),
            commission: CommissionPolicy::default(),
            retry: RetryPolicy::default(),
            unit_scale: 0,
            store_path: None,
        }
    }
}

impl Settings {
    /// Load settings, layering the optional TOML file and environment
    /// variables (e.g. `CHAMA_FINES__ABSENCE_FINE=2000`) over defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let defaults = Config::try_from(&Settings::default())?;
        let mut builder = Config::builder().add_source(defaults);
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let settings = builder
            .add_source(Environment::with_prefix("CHAMA").separator("__"))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
}
