use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How a protective level follows price.
///
/// In TOML this is written as a single-key table, e.g. `{ pips = 900 }`,
/// `{ percent = 0.002 }` or `{ reference_column = "ema_50" }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrailingPolicy {
    /// Trail at a fixed distance measured in pips.
    Pips(Decimal),
    /// Trail at a fraction of the entry price.
    Percent(Decimal),
    /// Pin the level to a field of the previous strategy bar.
    ReferenceColumn(String),
}

/// Trailing behaviour for one run. Each level has at most one active policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrailingConfig {
    pub stop_loss: Option<TrailingPolicy>,
    pub take_profit: Option<TrailingPolicy>,
}
