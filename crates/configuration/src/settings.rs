use crate::error::ConfigError;
use crate::optimizer_config::OptimizerConfig;
use chrono::{DateTime, Utc};
use core_types::Instrument;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::PathBuf;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub backtest: Backtest,
    pub storage: Storage,
    #[serde(default)]
    pub filter: Filter,
    /// The tracked instruments. Every backtest replays all of them.
    #[serde(default)]
    pub instruments: Vec<Instrument>,
    #[serde(default)]
    pub strategies: Strategies,
    #[serde(default)]
    pub optimizer: OptimizerConfig,
    #[serde(default)]
    pub logging: Logging,
}

/// Contains parameters for a single backtest run.
#[derive(Debug, Clone, Deserialize)]
pub struct Backtest {
    /// First decision instant (inclusive).
    pub from: DateTime<Utc>,
    /// End of the replayed period (exclusive).
    pub to: DateTime<Utc>,
    /// How far past a decision the outcome of an advisory is looked up.
    #[serde(default = "default_max_expiration_hours")]
    pub max_expiration_hours: u32,
    /// History loaded before `from` so the first decisions see full lookback windows.
    #[serde(default = "default_warmup_hours")]
    pub warmup_hours: u32,
    /// Capacity of the bounded channel workers report decisions on.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

/// Where the delimited-text stores live.
#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
    pub params_path: PathBuf,
    pub advices_path: PathBuf,
    pub candles_path: PathBuf,
}

/// Settings of the candle filter applied in front of the history source.
#[derive(Debug, Clone, Deserialize)]
pub struct Filter {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Hourly candles opening before this hour (UTC) are dropped.
    #[serde(default = "default_trading_start_hour")]
    pub trading_start_hour: u32,
    /// Hourly candles opening after this hour (UTC) are dropped.
    #[serde(default = "default_trading_end_hour")]
    pub trading_end_hour: u32,
}

/// Strategy-level switches that are not part of any parameter vector.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Strategies {
    #[serde(default)]
    pub cbs: CbsSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CbsSettings {
    /// When set, the storm's last N candles must all move in the storm's direction.
    pub stability_window: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Logging {
    /// Default filter directive; `RUST_LOG` takes precedence.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// When set, logs are also written to a daily-rolling file in this directory.
    pub directory: Option<PathBuf>,
    #[serde(default = "default_log_file_prefix")]
    pub file_prefix: String,
}

// --- Default Implementations ---

fn default_max_expiration_hours() -> u32 {
    30 * 24
}

fn default_warmup_hours() -> u32 {
    30 * 24
}

fn default_channel_capacity() -> usize {
    256
}

fn default_true() -> bool {
    true
}

fn default_trading_start_hour() -> u32 {
    1
}

fn default_trading_end_hour() -> u32 {
    21
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file_prefix() -> String {
    "adviser.log".to_string()
}

impl Default for Filter {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            trading_start_hour: default_trading_start_hour(),
            trading_end_hour: default_trading_end_hour(),
        }
    }
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: None,
            file_prefix: default_log_file_prefix(),
        }
    }
}

impl Config {
    /// Checks the cross-field constraints serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backtest.from >= self.backtest.to {
            return Err(ConfigError::ValidationError(format!(
                "backtest.from ({}) must be before backtest.to ({})",
                self.backtest.from, self.backtest.to
            )));
        }
        if self.backtest.channel_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "backtest.channel_capacity must be positive".to_string(),
            ));
        }
        if self.filter.trading_start_hour > 23
            || self.filter.trading_end_hour > 23
            || self.filter.trading_start_hour > self.filter.trading_end_hour
        {
            return Err(ConfigError::ValidationError(format!(
                "invalid trading hours {}..={}",
                self.filter.trading_start_hour, self.filter.trading_end_hour
            )));
        }
        if self.optimizer.rate <= Decimal::ZERO || self.optimizer.rate > Decimal::ONE {
            return Err(ConfigError::ValidationError(format!(
                "optimizer.rate must be in (0, 1], got {}",
                self.optimizer.rate
            )));
        }
        if let (Some(min), Some(max)) = (&self.optimizer.min_params, &self.optimizer.max_params) {
            if min.len() != max.len() {
                return Err(ConfigError::ValidationError(format!(
                    "optimizer.min_params has {} values but optimizer.max_params has {}",
                    min.len(),
                    max.len()
                )));
            }
        }
        Ok(())
    }
}
