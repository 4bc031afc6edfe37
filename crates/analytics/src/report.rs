use core_types::{CompletedTrade, OpenTrade};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The result of one simulation run.
///
/// `total_trades` counts only resolved trades. Trades still open when the
/// clock feed ended are listed in `open_records` and left out of `net_profit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    /// Sum of resolved trade profits, rounded to cents.
    pub net_profit: Decimal,
    pub win_records: Vec<CompletedTrade>,
    pub loss_records: Vec<CompletedTrade>,
    pub open_records: Vec<OpenTrade>,
    pub unresolved_trades: usize,
    /// The parameter combination that produced this result.
    pub parameters: serde_json::Value,
    pub statistics: PerformanceStatistics,
}

impl BacktestReport {
    /// A zero-profit result for a run without any orders.
    pub fn empty(parameters: serde_json::Value, initial_balance: Decimal) -> Self {
        Self {
            total_trades: 0,
            wins: 0,
            losses: 0,
            net_profit: Decimal::ZERO,
            win_records: Vec::new(),
            loss_records: Vec::new(),
            open_records: Vec::new(),
            unresolved_trades: 0,
            parameters,
            statistics: PerformanceStatistics::new(initial_balance),
        }
    }
}

/// Aggregate metrics over the resolved trades of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceStatistics {
    // I. Core Profitability Metrics
    pub gross_profit: Decimal,
    pub gross_loss: Decimal,
    pub profit_factor: Option<Decimal>, // Option<> because it can be infinite if GrossLoss is 0
    pub total_return_pct: Decimal,
    pub final_balance: Decimal,

    // II. Risk and Drawdown
    pub max_drawdown: Decimal,
    pub max_drawdown_pct: Decimal,

    // III. Trade-Level Statistics
    pub win_rate_pct: Option<Decimal>, // Option<> for cases with 0 trades
    pub average_win: Decimal,
    pub average_loss: Decimal,
    pub payoff_ratio: Option<Decimal>, // Option<> because avg_loss can be 0

    // IV. Time-Based Metrics
    #[serde(with = "humantime_serde")]
    pub average_holding_period: Duration,
}

impl PerformanceStatistics {
    /// Zeroed statistics for an account that never traded.
    pub fn new(initial_balance: Decimal) -> Self {
        Self {
            gross_profit: Decimal::ZERO,
            gross_loss: Decimal::ZERO,
            profit_factor: None,
            total_return_pct: Decimal::ZERO,
            final_balance: initial_balance,
            max_drawdown: Decimal::ZERO,
            max_drawdown_pct: Decimal::ZERO,
            win_rate_pct: None,
            average_win: Decimal::ZERO,
            average_loss: Decimal::ZERO,
            payoff_ratio: None,
            average_holding_period: Duration::ZERO,
        }
    }
}
