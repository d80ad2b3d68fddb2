use crate::error::{csv_error, io_error};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_types::{CandleRepository, Candlestick, DataError, Instrument, Interval};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Column order of candle files. The first line of every file is this header.
const HEADER: [&str; 7] = ["timestamp", "open", "low", "high", "close", "adj_close", "volume"];

#[derive(Debug, Deserialize)]
struct CandleRow {
    timestamp: DateTime<Utc>,
    open: Decimal,
    low: Decimal,
    high: Decimal,
    close: Decimal,
    adj_close: Decimal,
    volume: i64,
}

/// Candle history stored as one `<SYMBOL>_<interval>.csv` file per series.
///
/// Every query reads the whole file, so this source is meant to populate a
/// [`CandleCache`](crate::CandleCache), not to serve a backtest directly.
pub struct CsvCandleRepository {
    directory: PathBuf,
    instrument_ids: HashMap<String, i64>,
}

impl CsvCandleRepository {
    pub fn new(directory: impl Into<PathBuf>, instruments: &[Instrument]) -> Self {
        Self {
            directory: directory.into(),
            instrument_ids: instruments.iter().map(|i| (i.symbol.clone(), i.id)).collect(),
        }
    }

    fn file(&self, symbol: &str, interval: Interval) -> PathBuf {
        self.directory.join(format!("{}_{}.csv", symbol, interval))
    }

    /// Writes a series, replacing any existing file.
    pub async fn save_candles(
        &self,
        symbol: &str,
        interval: Interval,
        candles: &[Candlestick],
    ) -> Result<(), DataError> {
        let path = self.file(symbol, interval);
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(HEADER).map_err(|e| csv_error(&path, e))?;
        for candle in candles {
            writer
                .write_record([
                    candle.timestamp.to_rfc3339(),
                    candle.open.to_string(),
                    candle.low.to_string(),
                    candle.high.to_string(),
                    candle.close.to_string(),
                    candle.adj_close.to_string(),
                    candle.volume.to_string(),
                ])
                .map_err(|e| csv_error(&path, e))?;
        }
        let bytes = writer.into_inner().map_err(|e| DataError::Io(e.into_error()))?;

        tokio::fs::create_dir_all(&self.directory).await?;
        tokio::fs::write(&path, bytes).await.map_err(|e| io_error(&path, e))
    }

    async fn load(&self, path: &Path, symbol: &str, interval: Interval) -> Result<Vec<Candlestick>, DataError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| io_error(path, e))?;
        let instrument_id = self.instrument_ids.get(symbol).copied().unwrap_or_default();

        let mut reader = csv::Reader::from_reader(bytes.as_slice());
        let mut candles = Vec::new();
        for row in reader.deserialize::<CandleRow>() {
            let row = row.map_err(|e| csv_error(path, e))?;
            candles.push(Candlestick {
                open: row.open,
                low: row.low,
                high: row.high,
                close: row.close,
                adj_close: row.adj_close,
                volume: row.volume,
                timestamp: row.timestamp,
                interval,
                instrument_id,
            });
        }
        candles.sort_by_key(|c| c.timestamp);
        Ok(candles)
    }
}

#[async_trait]
impl CandleRepository for CsvCandleRepository {
    async fn get_candles(
        &self,
        symbol: &str,
        interval: Interval,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Candlestick>, DataError> {
        let path = self.file(symbol, interval);
        let mut candles = self.load(&path, symbol, interval).await?;
        candles.retain(|c| c.timestamp >= from && c.timestamp <= to);
        Ok(candles)
    }
}
