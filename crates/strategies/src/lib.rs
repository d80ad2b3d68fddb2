//! # Adviser Strategy Library
//!
//! This crate contains the decision logic of the system. It defines the
//! `Adviser` trait and its three implementations: the base storm/calm
//! strategy, its self-scaling variant, and an independent trend follower.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** Advisers read candle history only through the
//!   `CandleRepository` trait and compute with the `analytics` calculator. They
//!   know nothing about files, caches or the backtester.
//! - **Flat Parameters:** Every adviser is driven by a flat `Decimal` vector.
//!   The named structs in `params` decode and validate it at the boundary.
//! - **Typed Rejections:** Declining to advise is a `Decision`, not an error.
//!   `StrategyError` is reserved for bad parameters and data-access failures.
//!
//! ## Public API
//!
//! - `Adviser`: The core trait all strategies implement.
//! - `Decision` / `Candidate`: What an adviser returns for one instant.
//! - `Rejection`, `CbsReason`, `FtReason`: Why no advisory was given.
//! - `Selector`: Picks one advisory out of overlapping candidates.
//! - `create_adviser`: The factory function to construct an adviser instance.

// Declare all the modules that constitute this crate.
pub mod cbs;
pub mod cbs_scaled;
pub mod error;
pub mod factory;
pub mod ft;
pub mod params;
pub mod reason;
pub mod selector;
mod window;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export the key components to create a clean, public-facing API.
pub use cbs::CbsAdviser;
pub use cbs_scaled::CbsScaledAdviser;
pub use error::StrategyError;
pub use factory::{create_adviser, default_bounds, param_names};
pub use ft::FtAdviser;
pub use params::{CbsParams, CbsScaledParams, FtParams, ParamVector};
pub use reason::{CbsReason, FtReason, Rejection};
pub use selector::{Selected, Selector};

// Re-export StrategyId from core_types
pub use core_types::StrategyId;

use async_trait::async_trait;
use core_types::{Advisory, Candlestick};
use rust_decimal::Decimal;

/// What an adviser decided for one instant.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Advice(Advisory),
    Rejected(Rejection),
}

/// One decision together with the lookback window it was made over.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub hours_before: u32,
    pub decision: Decision,
}

/// The core trait that all advisers implement.
///
/// The backtester holds advisers as `Arc<dyn Adviser>` and calls them from one
/// task per instrument, hence the `Send + Sync` bounds.
#[async_trait]
pub trait Adviser: Send + Sync {
    fn strategy(&self) -> StrategyId;

    /// Decides whether to advise at `current`, the candle of the decision instant.
    ///
    /// # Returns
    ///
    /// * `Ok(Decision::Advice(_))` - if every check passed.
    /// * `Ok(Decision::Rejected(_))` - if a check failed; later checks were not run.
    /// * `Err(StrategyError)` - if `params` has the wrong shape or history could not be read.
    async fn get_advice(
        &self,
        params: &[Decimal],
        current: &Candlestick,
        symbol: &str,
    ) -> Result<Decision, StrategyError>;

    /// Every candidate decision the adviser considered at `current`.
    ///
    /// Single-window advisers return exactly one candidate. The scaled adviser
    /// returns one per storm/calm split, for the `Selector` to choose from.
    async fn get_advices(
        &self,
        params: &[Decimal],
        current: &Candlestick,
        symbol: &str,
    ) -> Result<Vec<Candidate>, StrategyError>;
}
