use serde::{Deserialize, Serialize};
use std::fmt;

/// The two pending-order types the signal generator can propose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    BuyStop,
    SellStop,
}

impl OrderType {
    /// True for orders that open a long position.
    pub fn is_long(&self) -> bool {
        matches!(self, OrderType::BuyStop)
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderType::BuyStop => write!(f, "BUY_STOP"),
            OrderType::SellStop => write!(f, "SELL_STOP"),
        }
    }
}

/// The terminal event that closed a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
}

/// How a trailing level was derived. Recorded on every trailing update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrailingMode {
    Pips,
    Percent,
    ReferenceColumn,
}
