use async_trait::async_trait;
use chrono::{DateTime, Timelike, Utc};
use core_types::{CandleRepository, Candlestick, DataError, Interval};
use std::sync::Arc;

/// Drops candles no adviser should see: zero-close candles (no trading) and
/// hourly candles outside the trading session.
pub struct TradingHoursFilter {
    inner: Arc<dyn CandleRepository>,
    start_hour: u32,
    end_hour: u32,
}

impl TradingHoursFilter {
    /// Keeps hourly candles whose hour (UTC) lies in `start_hour..=end_hour`.
    pub fn new(inner: Arc<dyn CandleRepository>, start_hour: u32, end_hour: u32) -> Self {
        Self { inner, start_hour, end_hour }
    }

    fn keeps(&self, candle: &Candlestick) -> bool {
        if candle.close.is_zero() {
            return false;
        }
        if candle.interval == Interval::Hour {
            let hour = candle.timestamp.hour();
            return (self.start_hour..=self.end_hour).contains(&hour);
        }
        true
    }
}

#[async_trait]
impl CandleRepository for TradingHoursFilter {
    async fn get_candles(
        &self,
        symbol: &str,
        interval: Interval,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Candlestick>, DataError> {
        let mut candles = self.inner.get_candles(symbol, interval, from, to).await?;
        candles.retain(|candle| self.keeps(candle));
        Ok(candles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CandleCache;
    use chrono::{Duration, TimeZone};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn candle(hour: i64, close: Decimal) -> Candlestick {
        Candlestick {
            open: close,
            low: close,
            high: close,
            close,
            adj_close: close,
            volume: 1,
            timestamp: Utc.with_ymd_and_hms(2021, 1, 4, 0, 0, 0).unwrap() + Duration::hours(hour),
            interval: Interval::Hour,
            instrument_id: 1,
        }
    }

    #[tokio::test]
    async fn drops_off_session_and_zero_close() {
        let candles = vec![candle(0, dec!(1)), candle(1, dec!(1)), candle(2, dec!(0)), candle(21, dec!(1)), candle(22, dec!(1))];
        let cache = CandleCache::from_candles("AAPL", Interval::Hour, candles.clone());
        let filter = TradingHoursFilter::new(Arc::new(cache), 1, 21);

        let kept = filter
            .get_candles("AAPL", Interval::Hour, candles[0].timestamp, candles[4].timestamp)
            .await
            .unwrap();
        let hours: Vec<u32> = kept.iter().map(|c| c.timestamp.hour()).collect();
        assert_eq!(hours, vec![1, 21]);
    }
}
