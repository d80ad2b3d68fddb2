use core_types::DataError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StrategyError {
    #[error("Strategy received invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Failed to read candle history: {0}")]
    DataAccess(#[from] DataError),
}
