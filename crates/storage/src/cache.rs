use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_types::{CandleRepository, Candlestick, DataError, Instrument, Interval};
use std::collections::HashMap;

/// An immutable, pre-populated snapshot of candle history keyed by (symbol, interval).
///
/// Built once from a slower source before the concurrent phase begins; queries
/// are binary searches over the sorted series. Unknown keys yield empty windows.
#[derive(Debug, Default, Clone)]
pub struct CandleCache {
    series: HashMap<(String, Interval), Vec<Candlestick>>,
}

impl CandleCache {
    /// Loads every instrument's history for every interval in `[from, to]` from `source`.
    pub async fn populate(
        source: &dyn CandleRepository,
        instruments: &[Instrument],
        intervals: &[Interval],
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Self, DataError> {
        let mut cache = Self::default();
        for instrument in instruments {
            for &interval in intervals {
                let candles = source.get_candles(&instrument.symbol, interval, from, to).await?;
                tracing::debug!(
                    "Cached {} {} candles for {}",
                    candles.len(),
                    interval,
                    instrument.symbol
                );
                cache.insert(&instrument.symbol, interval, candles);
            }
        }
        Ok(cache)
    }

    /// A cache holding a single series.
    pub fn from_candles(symbol: &str, interval: Interval, candles: Vec<Candlestick>) -> Self {
        let mut cache = Self::default();
        cache.insert(symbol, interval, candles);
        cache
    }

    /// Adds (or replaces) a series. Candles are kept in chronological order.
    pub fn insert(&mut self, symbol: &str, interval: Interval, mut candles: Vec<Candlestick>) {
        candles.sort_by_key(|c| c.timestamp);
        self.series.insert((symbol.to_string(), interval), candles);
    }

    /// Total number of cached candles.
    pub fn len(&self) -> usize {
        self.series.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn series(&self, symbol: &str, interval: Interval) -> &[Candlestick] {
        self.series
            .get(&(symbol.to_string(), interval))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[async_trait]
impl CandleRepository for CandleCache {
    async fn get_candles(
        &self,
        symbol: &str,
        interval: Interval,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Candlestick>, DataError> {
        let series = self.series(symbol, interval);
        let start = series.partition_point(|c| c.timestamp < from);
        let end = series.partition_point(|c| c.timestamp <= to);
        Ok(series.get(start..end).map(<[Candlestick]>::to_vec).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use core_types::FetchDirection;
    use rust_decimal::Decimal;

    fn at(hour: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 1, 4, 0, 0, 0).unwrap() + Duration::hours(hour)
    }

    fn candle(hour: i64) -> Candlestick {
        let price = Decimal::from(100 + hour);
        Candlestick {
            open: price,
            low: price,
            high: price,
            close: price,
            adj_close: price,
            volume: 1,
            timestamp: at(hour),
            interval: Interval::Hour,
            instrument_id: 1,
        }
    }

    fn cache() -> CandleCache {
        // Deliberately unsorted, with a gap at hours 5..=7.
        let candles = [3, 0, 1, 2, 4, 8, 9].into_iter().map(candle).collect();
        CandleCache::from_candles("AAPL", Interval::Hour, candles)
    }

    fn hours(candles: &[Candlestick]) -> Vec<i64> {
        candles.iter().map(|c| (c.timestamp - at(0)).num_hours()).collect()
    }

    #[tokio::test]
    async fn range_query_is_inclusive() {
        let candles = cache().get_candles("AAPL", Interval::Hour, at(1), at(4)).await.unwrap();
        assert_eq!(hours(&candles), vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn unknown_series_is_empty() {
        let cache = cache();
        assert!(cache.get_candles("MSFT", Interval::Hour, at(0), at(9)).await.unwrap().is_empty());
        assert!(cache.get_candles("AAPL", Interval::Day, at(0), at(9)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn count_queries_skip_gaps() {
        let cache = cache();
        let backward = cache
            .get_candles_by_count("AAPL", Interval::Hour, at(8), FetchDirection::Backward, 3)
            .await
            .unwrap();
        assert_eq!(hours(&backward), vec![3, 4, 8]);

        let forward = cache
            .get_candles_by_count("AAPL", Interval::Hour, at(5), FetchDirection::Forward, 5)
            .await
            .unwrap();
        assert_eq!(hours(&forward), vec![8, 9]);
    }

    #[tokio::test]
    async fn count_queries_give_up_past_ten_intervals_per_candle() {
        // Two candles reach back twenty hours from h30, and the series ends at h9.
        let candles = cache()
            .get_candles_by_count("AAPL", Interval::Hour, at(30), FetchDirection::Backward, 2)
            .await
            .unwrap();
        assert!(candles.is_empty());

        let candles = cache()
            .get_candles_by_count("AAPL", Interval::Hour, at(29), FetchDirection::Backward, 2)
            .await
            .unwrap();
        assert_eq!(hours(&candles), vec![9]);
    }

    #[tokio::test]
    async fn populate_copies_from_source() {
        let source = cache();
        let instruments = vec![Instrument { id: 1, symbol: "AAPL".to_string(), name: "Apple".to_string() }];
        let populated = CandleCache::populate(&source, &instruments, &[Interval::Hour], at(2), at(8))
            .await
            .unwrap();
        assert_eq!(populated.len(), 4);
    }
}
