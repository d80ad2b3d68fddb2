use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The sampling interval of a candlestick series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "1m")]
    Minute,
    #[serde(rename = "1h")]
    Hour,
    #[serde(rename = "1d")]
    Day,
    #[serde(rename = "1mo")]
    Month,
}

impl Interval {
    /// Length of one candle of this interval, in minutes.
    pub fn minutes(&self) -> i64 {
        match self {
            Interval::Minute => 1,
            Interval::Hour => 60,
            Interval::Day => 60 * 24,
            Interval::Month => 60 * 24 * 30,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::Minute => "1m",
            Interval::Hour => "1h",
            Interval::Day => "1d",
            Interval::Month => "1mo",
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1m" => Ok(Interval::Minute),
            "1h" => Ok(Interval::Hour),
            "1d" => Ok(Interval::Day),
            "1mo" => Ok(Interval::Month),
            other => Err(CoreError::InvalidInput("interval".to_string(), other.to_string())),
        }
    }
}

/// The direction of a price move, and therefore of the advised trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
}

/// Identifies one member of the adviser family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyId {
    /// Calm-before-storm with fixed window sizes.
    Cbs,
    /// Calm-before-storm searching its own window geometry.
    CbsScaled,
    /// Follow-the-trend.
    Ft,
}

impl StrategyId {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyId::Cbs => "cbs",
            StrategyId::CbsScaled => "cbs_scaled",
            StrategyId::Ft => "ft",
        }
    }
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cbs" => Ok(StrategyId::Cbs),
            "cbs_scaled" | "cbs-scaled" => Ok(StrategyId::CbsScaled),
            "ft" => Ok(StrategyId::Ft),
            other => Err(CoreError::InvalidInput("strategy".to_string(), other.to_string())),
        }
    }
}

/// How a simulated order resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderResult {
    TakeProfit,
    StopLoss,
    Expired,
}

impl OrderResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderResult::TakeProfit => "profit",
            OrderResult::StopLoss => "loss",
            OrderResult::Expired => "expired",
        }
    }
}

impl fmt::Display for OrderResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderResult {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "profit" => Ok(OrderResult::TakeProfit),
            "loss" => Ok(OrderResult::StopLoss),
            "expired" => Ok(OrderResult::Expired),
            other => Err(CoreError::InvalidInput("order result".to_string(), other.to_string())),
        }
    }
}
