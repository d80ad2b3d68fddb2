use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid input for {0}: {1}")]
    InvalidInput(String, String),
}

/// Failures of the external collaborators (candle history, parameter and
/// advisory stores). These are never retried by the engine.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("The requested data was not found: {0}")]
    NotFound(String),

    #[error("I/O error while accessing stored data: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stored data could not be parsed: {0}")]
    Parse(String),

    #[error("Data source is unavailable: {0}")]
    Unavailable(String),
}
