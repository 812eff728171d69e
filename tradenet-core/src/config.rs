use crate::data::RankParams;
use crate::error::{Result, TradeError};
use crate::pagerank::{DEFAULT_DAMPING, DEFAULT_SEED, DEFAULT_TRIALS};
use crate::source::{DEFAULT_PERIOD_A_COLUMN, DEFAULT_PERIOD_B_COLUMN};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const CONFIG_FILE_NAME: &str = "tradenet.toml";
pub const DATABASE_FILE_NAME: &str = "tradenet.db";
pub const DEFAULT_CONFIG_DIR: &str = "~/.config/tradenet/";

/// Engine settings, read from `tradenet.toml`. Every field is optional in the
/// file; missing ones fall back to the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub damping: f64,
    pub trials: u64,
    pub seed: u64,
    pub best_partner_count: usize,
    pub period_a_column: String,
    pub period_b_column: String,
    /// Rank cache location; `~` is expanded by the CLI.
    pub database: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            damping: DEFAULT_DAMPING,
            trials: DEFAULT_TRIALS,
            seed: DEFAULT_SEED,
            best_partner_count: 1,
            period_a_column: DEFAULT_PERIOD_A_COLUMN.to_string(),
            period_b_column: DEFAULT_PERIOD_B_COLUMN.to_string(),
            database: format!("{}{}", DEFAULT_CONFIG_DIR, DATABASE_FILE_NAME),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| TradeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| TradeError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.damping) {
            return Err(TradeError::Config(format!(
                "damping must be within [0, 1], got {}",
                self.damping
            )));
        }
        if self.trials == 0 {
            return Err(TradeError::Config("trials must be greater than zero".to_string()));
        }
        if self.best_partner_count == 0 {
            return Err(TradeError::Config(
                "best_partner_count must be at least 1".to_string(),
            ));
        }
        if self.period_a_column == self.period_b_column {
            return Err(TradeError::Config(
                "period columns must differ".to_string(),
            ));
        }
        Ok(())
    }

    pub fn rank_params(&self) -> RankParams {
        RankParams {
            damping: self.damping,
            trials: self.trials,
            seed: self.seed,
        }
    }
}
