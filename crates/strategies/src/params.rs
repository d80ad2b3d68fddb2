//! Named parameter structs and their flat-vector projections.
//!
//! The flat `Vec<Decimal>` form is what the optimizer enumerates and what the
//! parameter store persists. Hour-valued fields are integral: `from_vector`
//! truncates their fractional part and rejects anything above [`MAX_HOURS`].
//!
//! `check_direction_hours` keeps its historical name but counts days.

use crate::error::StrategyError;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;

/// A strategy parameter struct with a fixed-arity flat projection.
pub trait ParamVector: Sized {
    /// Field names in vector order.
    const FIELDS: &'static [&'static str];
    /// Number of values in the flat projection.
    const ARITY: usize = Self::FIELDS.len();

    fn to_vector(&self) -> Vec<Decimal>;
    fn from_vector(values: &[Decimal]) -> Result<Self, StrategyError>;
}

/// Upper bound on any hour-valued parameter, a little over eleven years.
pub const MAX_HOURS: u32 = 100_000;

fn check_arity<P: ParamVector>(values: &[Decimal], strategy: &str) -> Result<(), StrategyError> {
    if values.len() != P::ARITY {
        return Err(StrategyError::InvalidParameters(format!(
            "{} expects {} parameters, got {}",
            strategy,
            P::ARITY,
            values.len()
        )));
    }
    Ok(())
}

fn hours(value: Decimal, field: &str) -> Result<u32, StrategyError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(StrategyError::InvalidParameters(format!("{} must not be negative, got {}", field, value)));
    }
    value
        .trunc()
        .to_u32()
        .filter(|hours| *hours <= MAX_HOURS)
        .ok_or_else(|| StrategyError::InvalidParameters(format!("{} is out of range: {}", field, value)))
}

/// Parameters of the base storm/calm strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CbsParams {
    pub calm_duration_hours: u32,
    pub calm_max_volatility: Decimal,
    pub calm_max_curvature: Decimal,
    pub storm_duration_hours: u32,
    pub storm_min_power: Decimal,
    pub storm_max_power: Decimal,
    pub storm_min_volume: Decimal,
    pub take_profit_diff: Decimal,
    pub stop_loss_diff: Decimal,
    /// Days of history the direction check averages over.
    pub check_direction_hours: u32,
    pub check_direction_diff: Decimal,
}

impl CbsParams {
    /// Hours of history the storm and calm windows cover together.
    pub fn lookback_hours(&self) -> u32 {
        self.calm_duration_hours.saturating_add(self.storm_duration_hours)
    }
}

impl ParamVector for CbsParams {
    const FIELDS: &'static [&'static str] = &[
        "calm_duration_hours",
        "calm_max_volatility",
        "calm_max_curvature",
        "storm_duration_hours",
        "storm_min_power",
        "storm_max_power",
        "storm_min_volume",
        "take_profit_diff",
        "stop_loss_diff",
        "check_direction_hours",
        "check_direction_diff",
    ];

    fn to_vector(&self) -> Vec<Decimal> {
        vec![
            Decimal::from(self.calm_duration_hours),
            self.calm_max_volatility,
            self.calm_max_curvature,
            Decimal::from(self.storm_duration_hours),
            self.storm_min_power,
            self.storm_max_power,
            self.storm_min_volume,
            self.take_profit_diff,
            self.stop_loss_diff,
            Decimal::from(self.check_direction_hours),
            self.check_direction_diff,
        ]
    }

    fn from_vector(values: &[Decimal]) -> Result<Self, StrategyError> {
        check_arity::<Self>(values, "cbs")?;
        Ok(Self {
            calm_duration_hours: hours(values[0], Self::FIELDS[0])?,
            calm_max_volatility: values[1],
            calm_max_curvature: values[2],
            storm_duration_hours: hours(values[3], Self::FIELDS[3])?,
            storm_min_power: values[4],
            storm_max_power: values[5],
            storm_min_volume: values[6],
            take_profit_diff: values[7],
            stop_loss_diff: values[8],
            check_direction_hours: hours(values[9], Self::FIELDS[9])?,
            check_direction_diff: values[10],
        })
    }
}

/// Parameters of the scaled strategy. Every threshold of the base strategy is
/// expressed as a ratio of what is observed in the current storm/calm split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CbsScaledParams {
    pub period_hours_min: u32,
    pub period_hours_max: u32,
    pub storm_to_calm_min: Decimal,
    pub storm_to_calm_max: Decimal,
    pub storm_min_power_to_calm_volatility: Decimal,
    pub storm_max_power_to_calm_volatility: Decimal,
    pub storm_min_volume_to_calm_volume: Decimal,
    pub calm_max_volatility_to_storm_power: Decimal,
    pub calm_max_curvature_to_storm_power: Decimal,
    pub take_profit_diff_to_storm_power: Decimal,
    pub stop_loss_diff_to_storm_power: Decimal,
    pub calm_to_check_direction: Decimal,
    pub storm_power_to_check_direction_diff: Decimal,
}

/// What was measured for one storm/calm split of the scaled strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitMeasurements {
    pub calm_hours: u32,
    pub storm_hours: u32,
    pub calm_volatility: Decimal,
    pub calm_volume: Decimal,
    pub storm_power: Decimal,
}

impl CbsScaledParams {
    /// Derives the base strategy's absolute thresholds for one split.
    ///
    /// A zero divisor yields a zero threshold.
    pub fn derive(&self, split: &SplitMeasurements) -> CbsParams {
        let check_direction_hours = Decimal::from(split.calm_hours)
            .checked_div(self.calm_to_check_direction)
            .and_then(|h| h.trunc().to_u32())
            .unwrap_or(0)
            .min(MAX_HOURS);

        CbsParams {
            calm_duration_hours: split.calm_hours,
            calm_max_volatility: split.storm_power * self.calm_max_volatility_to_storm_power,
            calm_max_curvature: split.storm_power * self.calm_max_curvature_to_storm_power,
            storm_duration_hours: split.storm_hours,
            storm_min_power: self.storm_min_power_to_calm_volatility * split.calm_volatility,
            storm_max_power: self.storm_max_power_to_calm_volatility * split.calm_volatility,
            storm_min_volume: split.calm_volume * self.storm_min_volume_to_calm_volume,
            take_profit_diff: split.storm_power * self.take_profit_diff_to_storm_power,
            stop_loss_diff: split.storm_power * self.stop_loss_diff_to_storm_power,
            check_direction_hours,
            check_direction_diff: split
                .storm_power
                .checked_div(self.storm_power_to_check_direction_diff)
                .unwrap_or(Decimal::ZERO),
        }
    }
}

impl ParamVector for CbsScaledParams {
    const FIELDS: &'static [&'static str] = &[
        "period_hours_min",
        "period_hours_max",
        "storm_to_calm_min",
        "storm_to_calm_max",
        "storm_min_power_to_calm_volatility",
        "storm_max_power_to_calm_volatility",
        "storm_min_volume_to_calm_volume",
        "calm_max_volatility_to_storm_power",
        "calm_max_curvature_to_storm_power",
        "take_profit_diff_to_storm_power",
        "stop_loss_diff_to_storm_power",
        "calm_to_check_direction",
        "storm_power_to_check_direction_diff",
    ];

    fn to_vector(&self) -> Vec<Decimal> {
        vec![
            Decimal::from(self.period_hours_min),
            Decimal::from(self.period_hours_max),
            self.storm_to_calm_min,
            self.storm_to_calm_max,
            self.storm_min_power_to_calm_volatility,
            self.storm_max_power_to_calm_volatility,
            self.storm_min_volume_to_calm_volume,
            self.calm_max_volatility_to_storm_power,
            self.calm_max_curvature_to_storm_power,
            self.take_profit_diff_to_storm_power,
            self.stop_loss_diff_to_storm_power,
            self.calm_to_check_direction,
            self.storm_power_to_check_direction_diff,
        ]
    }

    fn from_vector(values: &[Decimal]) -> Result<Self, StrategyError> {
        check_arity::<Self>(values, "cbs_scaled")?;
        Ok(Self {
            period_hours_min: hours(values[0], Self::FIELDS[0])?,
            period_hours_max: hours(values[1], Self::FIELDS[1])?,
            storm_to_calm_min: values[2],
            storm_to_calm_max: values[3],
            storm_min_power_to_calm_volatility: values[4],
            storm_max_power_to_calm_volatility: values[5],
            storm_min_volume_to_calm_volume: values[6],
            calm_max_volatility_to_storm_power: values[7],
            calm_max_curvature_to_storm_power: values[8],
            take_profit_diff_to_storm_power: values[9],
            stop_loss_diff_to_storm_power: values[10],
            calm_to_check_direction: values[11],
            storm_power_to_check_direction_diff: values[12],
        })
    }
}

/// Parameters of the trend-following strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FtParams {
    pub trend_duration_hours: u32,
    pub trend_max_volatility: Decimal,
    pub trend_min_curvature: Decimal,
    pub trend_max_curvature: Decimal,
    pub take_profit_diff: Decimal,
    pub stop_loss_diff: Decimal,
    /// Days of history the direction check averages over.
    pub check_direction_hours: u32,
    pub check_direction_diff: Decimal,
}

impl ParamVector for FtParams {
    const FIELDS: &'static [&'static str] = &[
        "trend_duration_hours",
        "trend_max_volatility",
        "trend_min_curvature",
        "trend_max_curvature",
        "take_profit_diff",
        "stop_loss_diff",
        "check_direction_hours",
        "check_direction_diff",
    ];

    fn to_vector(&self) -> Vec<Decimal> {
        vec![
            Decimal::from(self.trend_duration_hours),
            self.trend_max_volatility,
            self.trend_min_curvature,
            self.trend_max_curvature,
            self.take_profit_diff,
            self.stop_loss_diff,
            Decimal::from(self.check_direction_hours),
            self.check_direction_diff,
        ]
    }

    fn from_vector(values: &[Decimal]) -> Result<Self, StrategyError> {
        check_arity::<Self>(values, "ft")?;
        Ok(Self {
            trend_duration_hours: hours(values[0], Self::FIELDS[0])?,
            trend_max_volatility: values[1],
            trend_min_curvature: values[2],
            trend_max_curvature: values[3],
            take_profit_diff: values[4],
            stop_loss_diff: values[5],
            check_direction_hours: hours(values[6], Self::FIELDS[6])?,
            check_direction_diff: values[7],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn decimal() -> impl Strategy<Value = Decimal> {
        (any::<i64>(), 0u32..=10).prop_map(|(mantissa, scale)| Decimal::new(mantissa, scale))
    }

    fn hour() -> impl Strategy<Value = Decimal> {
        (0u32..10_000).prop_map(Decimal::from)
    }

    /// A vector of the given arity whose hour positions hold integral hours.
    fn vector(arity: usize, hour_positions: &'static [usize]) -> impl Strategy<Value = Vec<Decimal>> {
        (prop::collection::vec(decimal(), arity), prop::collection::vec(hour(), arity)).prop_map(
            move |(mut values, hours)| {
                for &i in hour_positions {
                    values[i] = hours[i];
                }
                values
            },
        )
    }

    proptest! {
        #[test]
        fn cbs_vector_round_trips(values in vector(11, &[0, 3, 9])) {
            let params = CbsParams::from_vector(&values).unwrap();
            prop_assert_eq!(params.to_vector(), values);
        }

        #[test]
        fn cbs_scaled_vector_round_trips(values in vector(13, &[0, 1])) {
            let params = CbsScaledParams::from_vector(&values).unwrap();
            prop_assert_eq!(params.to_vector(), values);
        }

        #[test]
        fn ft_vector_round_trips(values in vector(8, &[0, 6])) {
            let params = FtParams::from_vector(&values).unwrap();
            prop_assert_eq!(params.to_vector(), values);
        }
    }

    #[test]
    fn wrong_arity_is_rejected() {
        let err = CbsParams::from_vector(&[dec!(1); 10]).unwrap_err();
        assert!(matches!(err, StrategyError::InvalidParameters(_)));
        assert!(FtParams::from_vector(&[]).is_err());
    }

    #[test]
    fn negative_hours_are_rejected() {
        let mut values = vec![dec!(1); 8];
        values[0] = dec!(-3);
        assert!(FtParams::from_vector(&values).is_err());
    }

    #[test]
    fn oversized_hours_are_rejected() {
        let mut values = vec![dec!(1); 11];
        values[3] = Decimal::from(u32::MAX);
        let err = CbsParams::from_vector(&values).unwrap_err();
        assert!(matches!(err, StrategyError::InvalidParameters(_)));

        values[3] = Decimal::from(MAX_HOURS);
        assert_eq!(CbsParams::from_vector(&values).unwrap().storm_duration_hours, MAX_HOURS);
    }

    #[test]
    fn fractional_hours_are_truncated() {
        let mut values = vec![dec!(1); 8];
        values[0] = dec!(21.9);
        assert_eq!(FtParams::from_vector(&values).unwrap().trend_duration_hours, 21);
    }

    #[test]
    fn scaled_thresholds_follow_measurements() {
        let scaled = CbsScaledParams {
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
            storm_power_to_check_direction_diff: dec!(0),
        };
        let split = SplitMeasurements {
            calm_hours: 24,
            storm_hours: 16,
            calm_volatility: dec!(2),
            calm_volume: dec!(1000),
            storm_power: dec!(10),
        };

        let cbs = scaled.derive(&split);
        assert_eq!(cbs.calm_duration_hours, 24);
        assert_eq!(cbs.storm_duration_hours, 16);
        assert_eq!(cbs.calm_max_volatility, dec!(3.5));
        assert_eq!(cbs.calm_max_curvature, dec!(1));
        assert_eq!(cbs.storm_min_power, dec!(6));
        assert_eq!(cbs.storm_max_power, dec!(16));
        assert_eq!(cbs.storm_min_volume, dec!(500));
        assert_eq!(cbs.take_profit_diff, dec!(4));
        assert_eq!(cbs.check_direction_hours, 80);
        // Zero divisor.
        assert_eq!(cbs.check_direction_diff, Decimal::ZERO);
    }
}
