use core_types::DataError;
use strategies::StrategyError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BacktestError {
    #[error("Strategy execution error: {0}")]
    Strategy(#[from] StrategyError),

    #[error("Failed to read candle history: {0}")]
    Data(#[from] DataError),

    #[error("Backtest aborted, instrument {symbol} failed: {source}")]
    BatchAborted {
        symbol: String,
        source: Box<BacktestError>,
    },

    #[error("A backtest worker terminated abnormally: {0}")]
    WorkerPanicked(String),

    #[error("Progress bar template error: {0}")]
    ProgressBarTemplate(String),
}

impl From<indicatif::style::TemplateError> for BacktestError {
    fn from(error: indicatif::style::TemplateError) -> Self {
        BacktestError::ProgressBarTemplate(error.to_string())
    }
}
