//! # Adviser Storage Crate
//!
//! Adapters that give the engine its candle history, instrument list and
//! persistent parameter/advisory stores.
//!
//! ## Architectural Principles
//!
//! - **Layer 3 Adapter:** Every type here implements one of the repository
//!   traits from `core-types`. The rest of the application only sees the traits.
//! - **Decorators:** `TradingHoursFilter` and `CandleCache` wrap any candle
//!   source, so they stack in front of the CSV source (or each other).
//! - **Read-Only Hot Path:** `CandleCache` is populated once, before a batch
//!   starts, and is immutable afterwards. Concurrent workers read it without locks.
//!
//! ## Public API
//!
//! - `CandleCache`: Pre-populated in-memory candle history.
//! - `TradingHoursFilter`: Drops zero-close and off-session candles.
//! - `CsvCandleRepository`: Candle history from `<SYMBOL>_<interval>.csv` files.
//! - `CsvParamsRepository` / `CsvAdviceRepository`: Delimited-text stores.
//! - `StaticInstrumentRepository`: The configured instrument list.

// Declare the modules that constitute this crate.
pub mod advice_file;
pub mod cache;
pub mod csv_candles;
mod error;
pub mod filter;
pub mod instruments;
pub mod params_file;

// Re-export the key components to create a clean, public-facing API.
pub use advice_file::CsvAdviceRepository;
pub use cache::CandleCache;
pub use csv_candles::CsvCandleRepository;
pub use filter::TradingHoursFilter;
pub use instruments::StaticInstrumentRepository;
pub use params_file::CsvParamsRepository;

use std::path::{Path, PathBuf};

/// `<directory>/<name>.csv`, with `=` in `name` replaced so parameter-style
/// names stay valid file names.
pub(crate) fn record_file(directory: &Path, name: &str) -> PathBuf {
    directory.join(format!("{}.csv", name.replace('=', "_")))
}
