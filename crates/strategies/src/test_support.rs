use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use core_types::{CandleRepository, Candlestick, DataError, Interval};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicUsize, Ordering};

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, 1, 4, 0, 0, 0).unwrap()
}

/// An hourly candle `h` hours after [`base_time`], wicks spanning open to close.
pub fn hour(h: i64, open: Decimal, close: Decimal) -> Candlestick {
    Candlestick {
        open,
        low: open.min(close),
        high: open.max(close),
        close,
        adj_close: close,
        volume: 1,
        timestamp: base_time() + Duration::hours(h),
        interval: Interval::Hour,
        instrument_id: 1,
    }
}

pub fn hours(count: i64) -> Duration {
    Duration::hours(count)
}

pub fn rising(h: i64, open: Decimal, step: Decimal) -> Candlestick {
    hour(h, open, open + step)
}

pub fn falling(h: i64, open: Decimal, step: Decimal) -> Candlestick {
    hour(h, open, open - step)
}

/// In-memory history that counts how many window queries reached it.
pub struct CountingRepository {
    candles: Vec<Candlestick>,
    calls: AtomicUsize,
}

impl CountingRepository {
    pub fn new(candles: Vec<Candlestick>) -> Self {
        Self { candles, calls: AtomicUsize::new(0) }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CandleRepository for CountingRepository {
    async fn get_candles(
        &self,
        _symbol: &str,
        _interval: Interval,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Candlestick>, DataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.candles.iter().filter(|c| c.timestamp >= from && c.timestamp <= to).cloned().collect())
    }
}
