use crate::error::StrategyError;
use crate::params::{CbsParams, ParamVector};
use crate::reason::CbsReason;
use crate::window::{direction_confirmed, direction_of, shifted, targets, trailing};
use crate::{Adviser, Candidate, Decision};
use analytics::CandleCalculator;
use async_trait::async_trait;
use core_types::{Advisory, CandleRepository, Candlestick, Direction, StrategyId};
use rust_decimal::Decimal;
use std::ops::ControlFlow;
use std::sync::Arc;

/// Advisory expiration, as a multiple of the storm and calm windows combined.
const EXPIRATION_COEFF: i64 = 3;

/// The base storm/calm strategy.
///
/// Looks for a sharp move (the storm) right after a quiet stretch (the calm)
/// and bets on the move continuing. Checks run storm, then calm, then
/// direction; the first failing check ends the evaluation.
pub struct CbsAdviser {
    repository: Arc<dyn CandleRepository>,
    calc: CandleCalculator,
    stability_window: Option<usize>,
}

impl CbsAdviser {
    pub fn new(repository: Arc<dyn CandleRepository>) -> Self {
        Self { repository, calc: CandleCalculator::new(), stability_window: None }
    }

    /// Additionally requires the storm's last `count` candles to move in the storm's direction.
    pub fn with_stability_window(mut self, count: usize) -> Self {
        self.stability_window = Some(count);
        self
    }

    /// Runs the check pipeline with already-decoded parameters.
    pub async fn advise(
        &self,
        params: &CbsParams,
        current: &Candlestick,
        symbol: &str,
    ) -> Result<Decision, StrategyError> {
        let direction = match self.check_storm(params, current, symbol).await? {
            ControlFlow::Continue(direction) => direction,
            ControlFlow::Break(reason) => return Ok(self.reject(reason, current, symbol)),
        };

        if let ControlFlow::Break(reason) = self.check_calm(params, current, symbol).await? {
            return Ok(self.reject(reason, current, symbol));
        }

        let confirmed = direction_confirmed(
            self.repository.as_ref(),
            &self.calc,
            symbol,
            current,
            params.check_direction_hours,
            params.check_direction_diff,
            direction,
        )
        .await?;
        if !confirmed {
            return Ok(self.reject(CbsReason::WrongDirection, current, symbol));
        }

        let (take_profit, stop_loss) =
            targets(current.close, params.take_profit_diff, params.stop_loss_diff, direction);
        tracing::debug!(
            "CBS: advice for {} at {}: tp={} sl={}",
            symbol, current.timestamp, take_profit, stop_loss
        );

        let expires_at = shifted(current.timestamp, EXPIRATION_COEFF * i64::from(params.lookback_hours()))?;
        Ok(Decision::Advice(Advisory { take_profit, stop_loss, expires_at }))
    }

    fn reject(&self, reason: CbsReason, current: &Candlestick, symbol: &str) -> Decision {
        tracing::debug!("CBS: {} rejected at {}: {}", symbol, current.timestamp, reason.as_str());
        Decision::Rejected(reason.into())
    }

    async fn check_storm(
        &self,
        params: &CbsParams,
        current: &Candlestick,
        symbol: &str,
    ) -> Result<ControlFlow<CbsReason, Direction>, StrategyError> {
        let storm = trailing(self.repository.as_ref(), symbol, current, params.storm_duration_hours, 0).await?;
        let Some(first) = storm.first() else {
            return Ok(ControlFlow::Break(CbsReason::StormTooWeak));
        };

        let power = self.calc.displacement(&storm);
        if power < params.storm_min_power {
            return Ok(ControlFlow::Break(CbsReason::StormTooWeak));
        }
        if power > params.storm_max_power {
            return Ok(ControlFlow::Break(CbsReason::StormTooStrong));
        }
        if self.calc.volume(&storm) < params.storm_min_volume {
            return Ok(ControlFlow::Break(CbsReason::StormTooSmall));
        }

        let direction = direction_of(first, current.close);
        if let Some(count) = self.stability_window {
            if !self.calc.is_rising(&storm, count, direction) {
                return Ok(ControlFlow::Break(CbsReason::StormUnstable));
            }
        }

        Ok(ControlFlow::Continue(direction))
    }

    async fn check_calm(
        &self,
        params: &CbsParams,
        current: &Candlestick,
        symbol: &str,
    ) -> Result<ControlFlow<CbsReason>, StrategyError> {
        let calm = trailing(
            self.repository.as_ref(),
            symbol,
            current,
            params.lookback_hours(),
            params.storm_duration_hours,
        )
        .await?;

        if calm.len() < (params.calm_duration_hours / 2) as usize {
            return Ok(ControlFlow::Break(CbsReason::CalmPeriodTooShort));
        }
        if self.calc.volatility(&calm) > params.calm_max_volatility {
            return Ok(ControlFlow::Break(CbsReason::CalmPeriodTooVolatile));
        }
        if calm.is_empty() || self.calc.displacement(&calm) > params.calm_max_curvature {
            return Ok(ControlFlow::Break(CbsReason::TooSteepCalmLine));
        }

        Ok(ControlFlow::Continue(()))
    }
}

#[async_trait]
impl Adviser for CbsAdviser {
    fn strategy(&self) -> StrategyId {
        StrategyId::Cbs
    }

    async fn get_advice(
        &self,
        params: &[Decimal],
        current: &Candlestick,
        symbol: &str,
    ) -> Result<Decision, StrategyError> {
        let params = CbsParams::from_vector(params)?;
        self.advise(&params, current, symbol).await
    }

    async fn get_advices(
        &self,
        params: &[Decimal],
        current: &Candlestick,
        symbol: &str,
    ) -> Result<Vec<Candidate>, StrategyError> {
        let params = CbsParams::from_vector(params)?;
        let decision = self.advise(&params, current, symbol).await?;
        Ok(vec![Candidate { hours_before: params.lookback_hours(), decision }])
    }
}
