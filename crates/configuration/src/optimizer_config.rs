use core_types::StrategyId;
use rust_decimal::Decimal;
use serde::Deserialize;

/// Defines an optimization job. This is deserialized from the `[optimizer]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct OptimizerConfig {
    /// The adviser whose parameter space is searched.
    #[serde(default = "default_strategy")]
    pub strategy: StrategyId,
    /// Step size as a fraction of each dimension's range. Bigger is faster but coarser.
    #[serde(default = "default_rate")]
    pub rate: Decimal,
    /// Minimal advice frequency (%) a grid point needs to be considered.
    #[serde(default = "default_min_frequency")]
    pub min_frequency: Decimal,
    /// Lower corner of the search space. The strategy's default bounds apply when absent.
    pub min_params: Option<Vec<Decimal>>,
    /// Upper corner of the search space.
    pub max_params: Option<Vec<Decimal>>,
}

fn default_strategy() -> StrategyId {
    StrategyId::CbsScaled
}

fn default_rate() -> Decimal {
    Decimal::ONE
}

fn default_min_frequency() -> Decimal {
    Decimal::from(3)
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            rate: default_rate(),
            min_frequency: default_min_frequency(),
            min_params: None,
            max_params: None,
        }
    }
}
