//! Contracts for the external collaborators the engine reads from and writes to.
//!
//! Concrete adapters live in the `storage` crate; the engine only ever sees
//! these traits, shared behind an `Arc`.

use crate::enums::Interval;
use crate::error::DataError;
use crate::structs::{AdviceRecord, Candlestick, Instrument};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

/// Which side of the anchor a count-based window query extends to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchDirection {
    Forward,
    Backward,
}

/// How far past the requested count a count-based query over-fetches, in candles.
/// Gaps (nights, weekends, filtered candles) make a plain `count`-long range too short.
const OVERFETCH_FACTOR: i64 = 10;

/// Read access to candle history.
#[async_trait]
pub trait CandleRepository: Send + Sync {
    /// Candles of `symbol` whose timestamp lies in `[from, to]`, in chronological order.
    async fn get_candles(
        &self,
        symbol: &str,
        interval: Interval,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Candlestick>, DataError>;

    /// Up to `count` candles nearest to `anchor` on the given side of it (anchor included).
    ///
    /// Only `10 * count` intervals on that side are searched, so a longer gap
    /// yields fewer candles. Implementations share this bound; override only to
    /// answer the same window faster.
    async fn get_candles_by_count(
        &self,
        symbol: &str,
        interval: Interval,
        anchor: DateTime<Utc>,
        direction: FetchDirection,
        count: usize,
    ) -> Result<Vec<Candlestick>, DataError> {
        let span = Duration::minutes(interval.minutes() * OVERFETCH_FACTOR * count as i64);
        let (from, to) = match direction {
            FetchDirection::Forward => (anchor, anchor + span),
            FetchDirection::Backward => (anchor - span, anchor),
        };

        let mut candles = self.get_candles(symbol, interval, from, to).await?;
        if candles.len() <= count {
            return Ok(candles);
        }

        match direction {
            FetchDirection::Forward => candles.truncate(count),
            FetchDirection::Backward => {
                candles.drain(..candles.len() - count);
            }
        }
        Ok(candles)
    }
}

/// Named storage of flat parameter vectors.
#[async_trait]
pub trait ParamsRepository: Send + Sync {
    async fn save_params(&self, name: &str, params: &[Decimal]) -> Result<(), DataError>;
    async fn load_params(&self, name: &str) -> Result<Vec<Decimal>, DataError>;
}

/// Named storage of evaluated advisories.
#[async_trait]
pub trait AdviceRepository: Send + Sync {
    async fn save_advices(&self, name: &str, advices: &[AdviceRecord]) -> Result<(), DataError>;
    async fn load_advices(&self, name: &str) -> Result<Vec<AdviceRecord>, DataError>;
}

/// The list of instruments the engine tracks.
#[async_trait]
pub trait InstrumentRepository: Send + Sync {
    async fn get_instruments(&self) -> Result<Vec<Instrument>, DataError>;
}
