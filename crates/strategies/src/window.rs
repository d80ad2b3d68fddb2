//! Trailing-window queries and the direction confirmation shared by the advisers.

use crate::error::StrategyError;
use analytics::CandleCalculator;
use chrono::{DateTime, Duration, Utc};
use core_types::{CandleRepository, Candlestick, Direction, Interval};
use rust_decimal::Decimal;

/// `at` shifted by `offset_hours`, which may be negative.
pub(crate) fn shifted(at: DateTime<Utc>, offset_hours: i64) -> Result<DateTime<Utc>, StrategyError> {
    Duration::try_hours(offset_hours)
        .and_then(|offset| at.checked_add_signed(offset))
        .ok_or_else(|| {
            StrategyError::InvalidParameters(format!("{} hours from {} is out of the time range", offset_hours, at))
        })
}

/// Hourly candles in `[t - start_hours_ago, t - end_hours_ago]`, both ends inclusive.
pub(crate) async fn trailing(
    repository: &dyn CandleRepository,
    symbol: &str,
    current: &Candlestick,
    start_hours_ago: u32,
    end_hours_ago: u32,
) -> Result<Vec<Candlestick>, StrategyError> {
    let from = shifted(current.timestamp, -i64::from(start_hours_ago))?;
    let to = shifted(current.timestamp, -i64::from(end_hours_ago))?;
    Ok(repository.get_candles(symbol, Interval::Hour, from, to).await?)
}

/// The direction a window moved in: down only when it closed below where it opened.
pub(crate) fn direction_of(first: &Candlestick, close: Decimal) -> Direction {
    if first.open > close {
        Direction::Down
    } else {
        Direction::Up
    }
}

/// Whether the longer-term moving average agrees with `direction`.
///
/// The average covers the `check_days` days up to and including `current`.
///
/// The move is contradicted when the average sits more than `max_diff` above
/// the close of a down move, or more than `max_diff` below the close of an up move.
pub(crate) async fn direction_confirmed(
    repository: &dyn CandleRepository,
    calc: &CandleCalculator,
    symbol: &str,
    current: &Candlestick,
    check_days: u32,
    max_diff: Decimal,
    direction: Direction,
) -> Result<bool, StrategyError> {
    let from = shifted(current.timestamp, -24 * i64::from(check_days))?;
    let window = repository.get_candles(symbol, Interval::Hour, from, current.timestamp).await?;
    let deviation = calc.moving_average(&window) - current.close;
    let contradicted = match direction {
        Direction::Down => deviation > max_diff,
        Direction::Up => deviation < -max_diff,
    };
    Ok(!contradicted)
}

/// Take-profit and stop-loss on the side of `close` implied by `direction`.
pub(crate) fn targets(close: Decimal, take_profit_diff: Decimal, stop_loss_diff: Decimal, direction: Direction) -> (Decimal, Decimal) {
    match direction {
        Direction::Up => (close + take_profit_diff, close - stop_loss_diff),
        Direction::Down => (close - take_profit_diff, close + stop_loss_diff),
    }
}
