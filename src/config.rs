//! Settings file loading.
//!
//! Settings are read from a JSON file, then selected values may be overridden from
//! environment variables.

use crate::application::stager::DEFAULT_STAGING_TTL_SECS;
use crate::domain::currency::{Currency, CurrencyBook};
use crate::domain::pos_config::{PosConfig, PosConfigId};
use crate::error::{PosError, Result};
use crate::infrastructure::rate_table::{RateTableEntry, StaticRateTable};
use chrono::Duration;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Overrides `staging_ttl_secs`.
pub const STAGING_TTL_ENV: &str = "POS_MC_STAGING_TTL_SECS";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub currencies: Vec<Currency>,
    /// Conversion table consulted for automatic exchange rates.
    #[serde(default)]
    pub rates: Vec<RateTableEntry>,
    pub pos_configs: Vec<PosConfig>,
    /// Seconds before unclaimed staged payments are swept.
    #[serde(default = "default_staging_ttl")]
    pub staging_ttl_secs: i64,
}

fn default_staging_ttl() -> i64 {
    DEFAULT_STAGING_TTL_SECS
}

impl Settings {
    /// Loads, overrides from the process environment and validates.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let mut settings: Settings = serde_json::from_reader(BufReader::new(file))?;
        settings.apply_overrides(|key| std::env::var(key).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(raw) = lookup(STAGING_TTL_ENV) {
            self.staging_ttl_secs = raw
                .trim()
                .parse()
                .map_err(|_| PosError::ValidationError(format!("Invalid value for {STAGING_TTL_ENV}: {raw}")))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.staging_ttl_secs <= 0 {
            return Err(PosError::ValidationError(format!(
                "staging_ttl_secs must be positive, got {}",
                self.staging_ttl_secs
            )));
        }

        let mut seen = HashSet::new();
        for config in &self.pos_configs {
            if !seen.insert(config.id) {
                return Err(PosError::ValidationError(format!(
                    "Duplicate POS configuration id {}",
                    config.id
                )));
            }
        }

        let currencies = self.currency_book();
        for config in &self.pos_configs {
            config.validate(&currencies)?;
        }
        Ok(())
    }

    pub fn currency_book(&self) -> CurrencyBook {
        CurrencyBook::new(self.currencies.iter().cloned())
    }

    pub fn rate_table(&self) -> StaticRateTable {
        StaticRateTable::new(self.rates.iter().cloned())
    }

    pub fn staging_ttl(&self) -> Duration {
        Duration::seconds(self.staging_ttl_secs)
    }

    /// The requested configuration, or the first one when no id is given.
    pub fn pos_config(&self, id: Option<PosConfigId>) -> Result<&PosConfig> {
        match id {
            Some(id) => self
                .pos_configs
                .iter()
                .find(|c| c.id == id)
                .ok_or(PosError::ConfigNotFound(id)),
            None => self.pos_configs.first().ok_or_else(|| {
                PosError::ValidationError("Settings define no POS configuration".to_string())
            }),
        }
    }
}
