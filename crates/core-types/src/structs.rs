use crate::enums::{Interval, OrderResult, StrategyId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One OHLC bar of an instrument's price history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candlestick {
    pub open: Decimal,
    pub low: Decimal,
    pub high: Decimal,
    pub close: Decimal,
    pub adj_close: Decimal,
    pub volume: i64,
    pub timestamp: DateTime<Utc>,
    pub interval: Interval,
    pub instrument_id: i64,
}

/// A tracked instrument (a quote in the history service).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    pub id: i64,
    pub symbol: String,
    pub name: String,
}

/// A proposed trade produced by an adviser for a single decision instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advisory {
    pub take_profit: Decimal,
    pub stop_loss: Decimal,
    pub expires_at: DateTime<Utc>,
}

/// The simulated resolution of an advisory.
///
/// `closed_at` is `None` when there was no subsequent history at all, in which
/// case the order expires immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub result: OrderResult,
    pub closed_at: Option<DateTime<Utc>>,
}

/// An evaluated advisory, as recorded by the backtester and the advisory store.
///
/// It carries the full parameter vector of the strategy that produced it so the
/// decision can be replayed later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdviceRecord {
    pub symbol: String,
    /// Size of the lookback window the adviser used, in hours.
    pub hours_before: u32,
    /// Hours between the decision and the outcome.
    pub hours_after: u32,
    pub timestamp: DateTime<Utc>,
    pub current_price: Decimal,
    pub take_profit: Decimal,
    pub stop_loss: Decimal,
    pub result: OrderResult,
    pub closed_at: DateTime<Utc>,
    pub strategy: StrategyId,
    pub params: Vec<Decimal>,
}

impl AdviceRecord {
    /// A buy advisory targets a price above the entry.
    pub fn is_buy(&self) -> bool {
        self.take_profit > self.current_price
    }
}
