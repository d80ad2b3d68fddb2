use crate::cbs::CbsAdviser;
use crate::cbs_scaled::CbsScaledAdviser;
use crate::ft::FtAdviser;
use crate::params::{CbsParams, CbsScaledParams, FtParams, ParamVector};
use crate::Adviser;
use configuration::Strategies;
use core_types::{CandleRepository, StrategyId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

/// Creates the adviser for `id`, reading candle history from `repository`.
pub fn create_adviser(
    id: StrategyId,
    settings: &Strategies,
    repository: Arc<dyn CandleRepository>,
) -> Arc<dyn Adviser> {
    // The match is exhaustive; a new StrategyId will not compile until it is wired here.
    match id {
        StrategyId::Cbs => {
            let adviser = CbsAdviser::new(repository);
            match settings.cbs.stability_window {
                Some(count) => Arc::new(adviser.with_stability_window(count)),
                None => Arc::new(adviser),
            }
        }
        StrategyId::CbsScaled => {
            let adviser = CbsScaledAdviser::new(repository);
            match settings.cbs.stability_window {
                Some(count) => Arc::new(adviser.with_stability_window(count)),
                None => Arc::new(adviser),
            }
        }
        StrategyId::Ft => Arc::new(FtAdviser::new(repository)),
    }
}

/// Parameter names of `id`'s flat vector, in order.
pub fn param_names(id: StrategyId) -> &'static [&'static str] {
    match id {
        StrategyId::Cbs => CbsParams::FIELDS,
        StrategyId::CbsScaled => CbsScaledParams::FIELDS,
        StrategyId::Ft => FtParams::FIELDS,
    }
}

/// The search space explored when the configuration names none.
///
/// The base strategy has no default: its absolute thresholds depend on the
/// instrument's price level, so its bounds must be configured.
pub fn default_bounds(id: StrategyId) -> Option<(Vec<Decimal>, Vec<Decimal>)> {
    match id {
        StrategyId::Cbs => None,
        StrategyId::CbsScaled => {
            let min = CbsScaledParams {
                period_hours_min: 20,
                period_hours_max: 40,
                storm_to_calm_min: dec!(0.2),
                storm_to_calm_max: dec!(0.4),
                storm_min_power_to_calm_volatility: dec!(3),
                storm_max_power_to_calm_volatility: dec!(8),
                storm_min_volume_to_calm_volume: dec!(0.5),
                calm_max_volatility_to_storm_power: dec!(0.35),
                calm_max_curvature_to_storm_power: dec!(0.1),
                take_profit_diff_to_storm_power: dec!(0.4),
                stop_loss_diff_to_storm_power: dec!(0.4),
                calm_to_check_direction: dec!(0.3),
                storm_power_to_check_direction_diff: dec!(1),
            };
            let max = CbsScaledParams { period_hours_min: 30, period_hours_max: 50, ..min.clone() };
            Some((min.to_vector(), max.to_vector()))
        }
        StrategyId::Ft => {
            let min = FtParams {
                trend_duration_hours: 21,
                trend_max_volatility: dec!(3),
                trend_min_curvature: dec!(6),
                trend_max_curvature: dec!(9),
                take_profit_diff: dec!(4),
                stop_loss_diff: dec!(4),
                check_direction_hours: 24,
                check_direction_diff: dec!(0),
            };
            let max = FtParams {
                trend_duration_hours: 23,
                trend_max_volatility: dec!(5),
                trend_min_curvature: dec!(9),
                trend_max_curvature: dec!(12),
                ..min.clone()
            };
            Some((min.to_vector(), max.to_vector()))
        }
    }
}
