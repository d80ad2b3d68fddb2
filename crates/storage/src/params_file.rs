use crate::error::{csv_error, io_error, parse_error};
use crate::record_file;
use async_trait::async_trait;
use core_types::{DataError, ParamsRepository};
use rust_decimal::Decimal;
use std::path::PathBuf;

/// Parameter vectors stored as a single delimited record per file.
pub struct CsvParamsRepository {
    directory: PathBuf,
}

impl CsvParamsRepository {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self { directory: directory.into() }
    }
}

#[async_trait]
impl ParamsRepository for CsvParamsRepository {
    async fn save_params(&self, name: &str, params: &[Decimal]) -> Result<(), DataError> {
        let path = record_file(&self.directory, name);
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(Vec::new());
        writer
            .write_record(params.iter().map(Decimal::to_string))
            .map_err(|e| csv_error(&path, e))?;
        let bytes = writer.into_inner().map_err(|e| DataError::Io(e.into_error()))?;

        tokio::fs::create_dir_all(&self.directory).await?;
        tokio::fs::write(&path, bytes).await.map_err(|e| io_error(&path, e))?;
        tracing::info!("Saved {} parameters to {}", params.len(), path.display());
        Ok(())
    }

    async fn load_params(&self, name: &str) -> Result<Vec<Decimal>, DataError> {
        let path = record_file(&self.directory, name);
        let bytes = tokio::fs::read(&path).await.map_err(|e| io_error(&path, e))?;

        let mut reader = csv::ReaderBuilder::new().has_headers(false).from_reader(bytes.as_slice());
        let Some(record) = reader.records().next() else {
            return Err(DataError::Parse(format!("{}: no parameter record", path.display())));
        };
        let record = record.map_err(|e| csv_error(&path, e))?;

        record
            .iter()
            .map(|value| value.trim().parse::<Decimal>().map_err(|_| parse_error(&path, "parameter", value)))
            .collect()
    }
}
