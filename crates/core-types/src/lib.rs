pub mod enums;
pub mod error;
pub mod repository;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{Direction, Interval, OrderResult, StrategyId};
pub use error::{CoreError, DataError};
pub use repository::{
    AdviceRepository, CandleRepository, FetchDirection, InstrumentRepository, ParamsRepository,
};
pub use structs::{AdviceRecord, Advisory, Candlestick, Instrument, Outcome};
