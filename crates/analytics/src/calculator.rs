use chrono::{DateTime, Utc};
use core_types::{Candlestick, Direction, OrderResult, Outcome};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;

/// A stateless calculator for deriving window statistics from candle history.
///
/// Every method is a pure function of its inputs. The adviser family and the
/// backtester share one instance.
#[derive(Debug, Default, Clone, Copy)]
pub struct CandleCalculator {}

impl CandleCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mean of the close prices. Zero for an empty window.
    pub fn moving_average(&self, candles: &[Candlestick]) -> Decimal {
        if candles.is_empty() {
            return Decimal::ZERO;
        }

        let close_sum: Decimal = candles.iter().map(|c| c.close).sum();
        close_sum / Decimal::from(candles.len())
    }

    /// Root-mean-square deviation of every high and low from the moving average.
    ///
    /// The squared deviations are accumulated high-then-low per candle in
    /// chronological order. Only the final square root is taken in `f64`; see
    /// [`sqrt_via_f64`] for how the result is brought back to a `Decimal`.
    pub fn volatility(&self, candles: &[Candlestick]) -> Decimal {
        if candles.is_empty() {
            return Decimal::ZERO;
        }

        let count = Decimal::from(candles.len());
        let average = self.moving_average(candles);
        let mut square_deviations = Decimal::ZERO;
        for candle in candles {
            let high_deviation = average - candle.high;
            square_deviations += high_deviation * high_deviation;
            let low_deviation = average - candle.low;
            square_deviations += low_deviation * low_deviation;
        }

        sqrt_via_f64(square_deviations / (count * Decimal::from(2)))
    }

    /// Total traded volume of the window.
    pub fn volume(&self, candles: &[Candlestick]) -> Decimal {
        Decimal::from(candles.iter().map(|c| c.volume).sum::<i64>())
    }

    /// The highest high of the window. Zero for an empty window.
    pub fn height(&self, candles: &[Candlestick]) -> Decimal {
        candles.iter().map(|c| c.high).max().unwrap_or(Decimal::ZERO)
    }

    /// The lowest low of the window. Zero for an empty window.
    pub fn depth(&self, candles: &[Candlestick]) -> Decimal {
        candles.iter().map(|c| c.low).min().unwrap_or(Decimal::ZERO)
    }

    /// Distance between the window's highest high and lowest low.
    pub fn max_change(&self, candles: &[Candlestick]) -> Decimal {
        self.height(candles) - self.depth(candles)
    }

    /// Absolute move from the first candle's open to the last candle's close.
    pub fn displacement(&self, candles: &[Candlestick]) -> Decimal {
        match (candles.first(), candles.last()) {
            (Some(first), Some(last)) => (first.open - last.close).abs(),
            _ => Decimal::ZERO,
        }
    }

    /// Whether the last `count_last` candles all moved in `direction`.
    ///
    /// A doji (open == close) never breaks the run. A `count_last` of zero
    /// still inspects the final candle.
    pub fn is_rising(&self, candles: &[Candlestick], count_last: usize, direction: Direction) -> bool {
        candles
            .iter()
            .rev()
            .take(count_last.max(1))
            .all(|c| match direction {
                Direction::Up => c.close >= c.open,
                Direction::Down => c.close <= c.open,
            })
    }

    /// Replays `future` against an order entered at `entry` and reports how it resolved.
    ///
    /// The order is a buy when the take-profit lies above the entry (or equals it)
    /// and a sell otherwise. Within one candle the stop-loss is tested first.
    pub fn simulate_outcome(
        &self,
        entry: Decimal,
        take_profit: Decimal,
        stop_loss: Decimal,
        future: &[Candlestick],
    ) -> Outcome {
        let Some(last) = future.last() else {
            return Outcome { result: OrderResult::Expired, closed_at: None };
        };

        let is_sell = entry > take_profit;
        for candle in future {
            let (stopped, profited) = if is_sell {
                (candle.high >= stop_loss, candle.low <= take_profit)
            } else {
                (candle.low <= stop_loss, candle.high >= take_profit)
            };

            if stopped {
                return resolved(OrderResult::StopLoss, candle.timestamp);
            }
            if profited {
                return resolved(OrderResult::TakeProfit, candle.timestamp);
            }
        }

        resolved(OrderResult::Expired, last.timestamp)
    }
}

fn resolved(result: OrderResult, at: DateTime<Utc>) -> Outcome {
    Outcome { result, closed_at: Some(at) }
}

/// Square root through `f64`, converting both ways via the shortest decimal text.
///
/// Going through the text form keeps the result bit-for-bit stable across
/// platforms: the decimal is parsed to the nearest double, and the double's
/// shortest round-trip representation becomes the new decimal.
fn sqrt_via_f64(value: Decimal) -> Decimal {
    let Ok(as_float) = value.to_string().parse::<f64>() else {
        return Decimal::ZERO;
    };

    let root = as_float.sqrt();
    if !root.is_finite() {
        return Decimal::ZERO;
    }

    root.to_string()
        .parse::<Decimal>()
        .ok()
        .or_else(|| Decimal::from_f64(root))
        .unwrap_or(Decimal::ZERO)
}
