use indicatif::style::TemplateError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OptimizerError {
    #[error("Backtest execution failed within optimizer: {0}")]
    Backtest(#[from] backtester::BacktestError),

    #[error("Failed to store the best parameters: {0}")]
    Data(#[from] core_types::DataError),

    #[error("Invalid search space: {0}")]
    SearchSpace(String),

    #[error("Progress bar template error: {0}")]
    ProgressBarTemplate(String),
}

impl From<TemplateError> for OptimizerError {
    fn from(error: TemplateError) -> Self {
        OptimizerError::ProgressBarTemplate(error.to_string())
    }
}
