use crate::cbs::CbsAdviser;
use crate::error::StrategyError;
use crate::params::{CbsScaledParams, ParamVector, SplitMeasurements};
use crate::reason::{CbsReason, Rejection};
use crate::window::shifted;
use crate::{Adviser, Candidate, Decision};
use analytics::CandleCalculator;
use async_trait::async_trait;
use core_types::{CandleRepository, Candlestick, FetchDirection, Interval, StrategyId};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use std::sync::Arc;

/// The storm/calm strategy searching its own window geometry.
///
/// For every total period in the configured range, the period is split into
/// storm and calm windows of varying proportions. For each split the storm's
/// power and the calm's volatility and volume are measured, the base
/// strategy's thresholds are derived from them, and the base strategy runs.
pub struct CbsScaledAdviser {
    base: CbsAdviser,
    repository: Arc<dyn CandleRepository>,
    calc: CandleCalculator,
}

impl CbsScaledAdviser {
    pub fn new(repository: Arc<dyn CandleRepository>) -> Self {
        Self {
            base: CbsAdviser::new(repository.clone()),
            repository,
            calc: CandleCalculator::new(),
        }
    }

    /// See [`CbsAdviser::with_stability_window`].
    pub fn with_stability_window(mut self, count: usize) -> Self {
        self.base = self.base.with_stability_window(count);
        self
    }

    /// Evaluates the splits longest period first, storm-heaviest first.
    /// With `stop_at_first_advice`, returns as soon as a split yields an advisory.
    async fn evaluate_splits(
        &self,
        params: &CbsScaledParams,
        current: &Candlestick,
        symbol: &str,
        stop_at_first_advice: bool,
    ) -> Result<Vec<Candidate>, StrategyError> {
        let mut candidates = Vec::new();

        for period in (params.period_hours_min..=params.period_hours_max).rev() {
            let storm_max = storm_hours(period, params.storm_to_calm_max).min(period);
            let storm_min = storm_hours(period, params.storm_to_calm_min);
            let mut storm = storm_max;
            let mut calm = period - storm;

            while storm > storm_min {
                let split = self.measure(current, symbol, calm, storm).await?;
                let derived = params.derive(&split);
                let decision = self.base.advise(&derived, current, symbol).await?;
                let advised = matches!(decision, Decision::Advice(_));
                candidates.push(Candidate { hours_before: period, decision });

                if advised && stop_at_first_advice {
                    return Ok(candidates);
                }
                calm += 1;
                storm -= 1;
            }
        }

        Ok(candidates)
    }

    async fn measure(
        &self,
        current: &Candlestick,
        symbol: &str,
        calm_hours: u32,
        storm_hours: u32,
    ) -> Result<SplitMeasurements, StrategyError> {
        let calm = self
            .repository
            .get_candles_by_count(
                symbol,
                Interval::Hour,
                shifted(current.timestamp, -i64::from(storm_hours))?,
                FetchDirection::Backward,
                calm_hours as usize,
            )
            .await?;
        let storm = self
            .repository
            .get_candles_by_count(symbol, Interval::Hour, current.timestamp, FetchDirection::Backward, storm_hours as usize)
            .await?;

        Ok(SplitMeasurements {
            calm_hours,
            storm_hours,
            calm_volatility: self.calc.volatility(&calm),
            calm_volume: self.calc.volume(&calm),
            storm_power: self.calc.displacement(&storm),
        })
    }
}

fn storm_hours(period: u32, ratio: Decimal) -> u32 {
    (Decimal::from(period) * ratio).trunc().to_u32().unwrap_or(0)
}

#[async_trait]
impl Adviser for CbsScaledAdviser {
    fn strategy(&self) -> StrategyId {
        StrategyId::CbsScaled
    }

    /// The first advisory any split yields. Failing that, the rejection most
    /// splits agreed on.
    async fn get_advice(
        &self,
        params: &[Decimal],
        current: &Candlestick,
        symbol: &str,
    ) -> Result<Decision, StrategyError> {
        let params = CbsScaledParams::from_vector(params)?;
        let candidates = self.evaluate_splits(&params, current, symbol, true).await?;

        let mut rejections = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            match candidate.decision {
                Decision::Advice(advisory) => return Ok(Decision::Advice(advisory)),
                Decision::Rejected(rejection) => rejections.push(rejection),
            }
        }

        let rejection = Rejection::dominant(rejections).unwrap_or(Rejection::Cbs(CbsReason::NoWindowSplits));
        Ok(Decision::Rejected(rejection))
    }

    async fn get_advices(
        &self,
        params: &[Decimal],
        current: &Candlestick,
        symbol: &str,
    ) -> Result<Vec<Candidate>, StrategyError> {
        let params = CbsScaledParams::from_vector(params)?;
        self.evaluate_splits(&params, current, symbol, false).await
    }
}
