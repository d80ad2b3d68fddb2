//! # Adviser Analytics
//!
//! This crate provides the statistical toolkit the adviser family and the
//! backtester measure candle history with. It acts as the "unbiased judge" of
//! every advisory: the same calculator that derives window statistics also
//! replays the future to decide how an advisory would have resolved.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of external systems.
//!   It depends only on `core-types` (Layer 0).
//! - **Stateless Calculation:** The `CandleCalculator` is a stateless calculator. It takes
//!   candle slices as input and produces decimals or an `Outcome` as output.
//!
//! ## Public API
//!
//! - `CandleCalculator`: moving average, volatility, volume, range measures and
//!   outcome simulation.

pub mod calculator;

pub use calculator::CandleCalculator;
