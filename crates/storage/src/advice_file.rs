use crate::error::{csv_error, io_error, parse_error};
use crate::record_file;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_types::{AdviceRecord, AdviceRepository, DataError, OrderResult, StrategyId};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Fixed columns preceding the parameter vector in every advisory record.
const FIXED_COLUMNS: usize = 10;

/// Evaluated advisories stored one delimited record per advisory.
///
/// Columns: symbol, hours before, hours after, decision time (unix seconds),
/// entry price, take-profit, stop-loss, result, close time (unix seconds),
/// strategy, then the strategy's parameter vector.
pub struct CsvAdviceRepository {
    directory: PathBuf,
}

impl CsvAdviceRepository {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self { directory: directory.into() }
    }
}

fn to_record(advice: &AdviceRecord) -> Vec<String> {
    let mut record = vec![
        advice.symbol.clone(),
        advice.hours_before.to_string(),
        advice.hours_after.to_string(),
        advice.timestamp.timestamp().to_string(),
        advice.current_price.to_string(),
        advice.take_profit.to_string(),
        advice.stop_loss.to_string(),
        advice.result.as_str().to_string(),
        advice.closed_at.timestamp().to_string(),
        advice.strategy.as_str().to_string(),
    ];
    record.extend(advice.params.iter().map(Decimal::to_string));
    record
}

fn parse<T: FromStr>(path: &Path, field: &str, value: &str) -> Result<T, DataError> {
    value.trim().parse::<T>().map_err(|_| parse_error(path, field, value))
}

fn unix(path: &Path, field: &str, value: &str) -> Result<DateTime<Utc>, DataError> {
    let seconds: i64 = parse(path, field, value)?;
    DateTime::from_timestamp(seconds, 0).ok_or_else(|| parse_error(path, field, value))
}

fn from_record(path: &Path, record: &csv::StringRecord) -> Result<AdviceRecord, DataError> {
    if record.len() < FIXED_COLUMNS {
        return Err(DataError::Parse(format!(
            "{}: advisory record has {} columns, expected at least {}",
            path.display(),
            record.len(),
            FIXED_COLUMNS
        )));
    }

    Ok(AdviceRecord {
        symbol: record[0].to_string(),
        hours_before: parse(path, "hours_before", &record[1])?,
        hours_after: parse(path, "hours_after", &record[2])?,
        timestamp: unix(path, "timestamp", &record[3])?,
        current_price: parse(path, "current_price", &record[4])?,
        take_profit: parse(path, "take_profit", &record[5])?,
        stop_loss: parse(path, "stop_loss", &record[6])?,
        result: parse::<OrderResult>(path, "result", &record[7])?,
        closed_at: unix(path, "closed_at", &record[8])?,
        strategy: parse::<StrategyId>(path, "strategy", &record[9])?,
        params: record
            .iter()
            .skip(FIXED_COLUMNS)
            .map(|value| parse(path, "parameter", value))
            .collect::<Result<_, _>>()?,
    })
}

#[async_trait]
impl AdviceRepository for CsvAdviceRepository {
    async fn save_advices(&self, name: &str, advices: &[AdviceRecord]) -> Result<(), DataError> {
        let path = record_file(&self.directory, name);
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_writer(Vec::new());
        for advice in advices {
            writer.write_record(to_record(advice)).map_err(|e| csv_error(&path, e))?;
        }
        let bytes = writer.into_inner().map_err(|e| DataError::Io(e.into_error()))?;

        tokio::fs::create_dir_all(&self.directory).await?;
        tokio::fs::write(&path, bytes).await.map_err(|e| io_error(&path, e))?;
        tracing::info!("Saved {} advices to {}", advices.len(), path.display());
        Ok(())
    }

    async fn load_advices(&self, name: &str) -> Result<Vec<AdviceRecord>, DataError> {
        let path = record_file(&self.directory, name);
        let bytes = tokio::fs::read(&path).await.map_err(|e| io_error(&path, e))?;

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(bytes.as_slice());
        reader
            .records()
            .map(|record| {
                let record = record.map_err(|e| csv_error(&path, e))?;
                from_record(&path, &record)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn advice(symbol: &str, result: OrderResult) -> AdviceRecord {
        AdviceRecord {
            symbol: symbol.to_string(),
            hours_before: 15,
            hours_after: 6,
            timestamp: Utc.with_ymd_and_hms(2021, 1, 5, 10, 0, 0).unwrap(),
            current_price: dec!(110),
            take_profit: dec!(113),
            stop_loss: dec!(107),
            result,
            closed_at: Utc.with_ymd_and_hms(2021, 1, 5, 16, 0, 0).unwrap(),
            strategy: StrategyId::Cbs,
            params: vec![dec!(10), dec!(0.3), dec!(1)],
        }
    }

    #[tokio::test]
    async fn saved_advices_load_back() {
        let directory = std::env::temp_dir().join(format!("adviser-advices-{}", std::process::id()));
        let repository = CsvAdviceRepository::new(&directory);
        let advices = vec![advice("AAPL", OrderResult::TakeProfit), advice("MSFT", OrderResult::StopLoss)];

        repository.save_advices("cbs_profit", &advices).await.unwrap();
        assert_eq!(repository.load_advices("cbs_profit").await.unwrap(), advices);

        let _ = std::fs::remove_dir_all(directory);
    }

    #[test]
    fn short_record_is_a_parse_error() {
        let record = csv::StringRecord::from(vec!["AAPL", "15"]);
        let err = from_record(Path::new("advices.csv"), &record).unwrap_err();
        assert!(matches!(err, DataError::Parse(_)));
    }

    #[test]
    fn record_layout() {
        let record = to_record(&advice("AAPL", OrderResult::Expired));
        assert_eq!(record[0], "AAPL");
        assert_eq!(record[3], "1609840800");
        assert_eq!(record[7], "expired");
        assert_eq!(record[9], "cbs");
        assert_eq!(record[FIXED_COLUMNS..], ["10", "0.3", "1"]);
    }
}
