use crate::error::StrategyError;
use crate::params::{FtParams, ParamVector};
use crate::reason::FtReason;
use crate::window::{direction_confirmed, direction_of, shifted, targets, trailing};
use crate::{Adviser, Candidate, Decision};
use analytics::CandleCalculator;
use async_trait::async_trait;
use core_types::{Advisory, CandleRepository, Candlestick, StrategyId};
use rust_decimal::Decimal;
use std::sync::Arc;

const EXPIRATION_HOURS: i64 = 72;

/// Trend-following strategy: advises along a steady, moderately sloped trend.
pub struct FtAdviser {
    repository: Arc<dyn CandleRepository>,
    calc: CandleCalculator,
}

impl FtAdviser {
    pub fn new(repository: Arc<dyn CandleRepository>) -> Self {
        Self { repository, calc: CandleCalculator::new() }
    }

    pub async fn advise(
        &self,
        params: &FtParams,
        current: &Candlestick,
        symbol: &str,
    ) -> Result<Decision, StrategyError> {
        let trend = trailing(self.repository.as_ref(), symbol, current, params.trend_duration_hours, 0).await?;
        let Some(first) = trend.first() else {
            return Ok(reject(FtReason::TrendTooWeak, current, symbol));
        };

        if self.calc.volatility(&trend) > params.trend_max_volatility {
            return Ok(reject(FtReason::TrendTooVolatile, current, symbol));
        }
        let curvature = (current.close - first.open).abs();
        if curvature > params.trend_max_curvature {
            return Ok(reject(FtReason::TrendTooStrong, current, symbol));
        }
        if curvature < params.trend_min_curvature {
            return Ok(reject(FtReason::TrendTooWeak, current, symbol));
        }

        let direction = direction_of(first, current.close);
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
            return Ok(reject(FtReason::WrongDirection, current, symbol));
        }

        let (take_profit, stop_loss) =
            targets(current.close, params.take_profit_diff, params.stop_loss_diff, direction);
        let expires_at = shifted(current.timestamp, EXPIRATION_HOURS)?;
        Ok(Decision::Advice(Advisory { take_profit, stop_loss, expires_at }))
    }
}

fn reject(reason: FtReason, current: &Candlestick, symbol: &str) -> Decision {
    tracing::debug!("FT: {} rejected at {}: {}", symbol, current.timestamp, reason.as_str());
    Decision::Rejected(reason.into())
}

#[async_trait]
impl Adviser for FtAdviser {
    fn strategy(&self) -> StrategyId {
        StrategyId::Ft
    }

    async fn get_advice(
        &self,
        params: &[Decimal],
        current: &Candlestick,
        symbol: &str,
    ) -> Result<Decision, StrategyError> {
        let params = FtParams::from_vector(params)?;
        self.advise(&params, current, symbol).await
    }

    async fn get_advices(
        &self,
        params: &[Decimal],
        current: &Candlestick,
        symbol: &str,
    ) -> Result<Vec<Candidate>, StrategyError> {
        let params = FtParams::from_vector(params)?;
        let decision = self.advise(&params, current, symbol).await?;
        Ok(vec![Candidate { hours_before: params.trend_duration_hours, decision }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reason::Rejection;
    use crate::test_support::{base_time, falling, hours, CountingRepository};
    use rust_decimal_macros::dec;

    fn params() -> FtParams {
        FtParams {
            trend_duration_hours: 5,
            trend_max_volatility: dec!(5),
            trend_min_curvature: dec!(4),
            trend_max_curvature: dec!(12),
            take_profit_diff: dec!(4),
            stop_loss_diff: dec!(2),
            check_direction_hours: 24,
            check_direction_diff: dec!(100),
        }
    }

    /// Ten hours falling 1 per hour from 120.
    fn downtrend() -> Vec<Candlestick> {
        (0..10).map(|h| falling(h, dec!(120) - Decimal::from(h), dec!(1))).collect()
    }

    #[tokio::test]
    async fn steady_downtrend_is_sold() {
        let candles = downtrend();
        let adviser = FtAdviser::new(Arc::new(CountingRepository::new(candles.clone())));

        // Window h4..h9: opens at 116, the current close is 110.
        let decision = adviser.advise(&params(), &candles[9], "TEST").await.unwrap();
        assert_eq!(
            decision,
            Decision::Advice(Advisory {
                take_profit: dec!(106),
                stop_loss: dec!(112),
                expires_at: base_time() + hours(9 + 72),
            })
        );
    }

    #[tokio::test]
    async fn trend_thresholds() {
        let candles = downtrend();
        let adviser = FtAdviser::new(Arc::new(CountingRepository::new(candles.clone())));

        let mut strong = params();
        strong.trend_max_curvature = dec!(5);
        let decision = adviser.advise(&strong, &candles[9], "TEST").await.unwrap();
        assert_eq!(decision, Decision::Rejected(Rejection::Ft(FtReason::TrendTooStrong)));

        let mut weak = params();
        weak.trend_min_curvature = dec!(7);
        let decision = adviser.advise(&weak, &candles[9], "TEST").await.unwrap();
        assert_eq!(decision, Decision::Rejected(Rejection::Ft(FtReason::TrendTooWeak)));

        let mut calm = params();
        calm.trend_max_volatility = dec!(0.5);
        let decision = adviser.advise(&calm, &candles[9], "TEST").await.unwrap();
        assert_eq!(decision, Decision::Rejected(Rejection::Ft(FtReason::TrendTooVolatile)));
    }

    #[tokio::test]
    async fn missing_history_is_a_weak_trend() {
        let adviser = FtAdviser::new(Arc::new(CountingRepository::new(Vec::new())));
        let current = downtrend()[9].clone();

        let candidates = adviser.get_advices(&params().to_vector(), &current, "TEST").await.unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].hours_before, 5);
        assert_eq!(candidates[0].decision, Decision::Rejected(Rejection::Ft(FtReason::TrendTooWeak)));
    }
}
