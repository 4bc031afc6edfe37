use crate::error::AnalyticsError;
use crate::report::{BacktestReport, PerformanceStatistics};
use core_types::{CompletedTrade, OpenTrade};
use rust_decimal::Decimal;
use std::time::Duration;

/// A stateless calculator for deriving a run's result from its trades.
#[derive(Debug, Default)]
pub struct AnalyticsEngine {}

impl AnalyticsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// The main entry point for building a run's result.
    ///
    /// # Arguments
    ///
    /// * `completed` - Resolved trades, in the order they closed.
    /// * `open` - Trades still open when the clock feed ended.
    /// * `parameters` - The parameter combination, recorded verbatim.
    /// * `initial_balance` - The starting balance of the run.
    /// * `final_balance` - Free balance plus reservations at the end of the run.
    pub fn calculate(
        &self,
        completed: Vec<CompletedTrade>,
        open: Vec<OpenTrade>,
        parameters: serde_json::Value,
        initial_balance: Decimal,
        final_balance: Decimal,
    ) -> Result<BacktestReport, AnalyticsError> {
        let mut statistics = PerformanceStatistics::new(initial_balance);
        statistics.final_balance = final_balance;

        self.calculate_profitability(&completed, initial_balance, &mut statistics);
        self.calculate_drawdown(&completed, initial_balance, &mut statistics);
        self.calculate_time_metrics(&completed, &mut statistics)?;

        let net_profit: Decimal = completed.iter().map(|trade| trade.profit).sum();
        let (win_records, loss_records): (Vec<_>, Vec<_>) =
            completed.into_iter().partition(|trade| trade.win);

        if !open.is_empty() {
            tracing::warn!(
                unresolved = open.len(),
                "Trades still open at the end of the clock feed"
            );
        }

        Ok(BacktestReport {
            total_trades: win_records.len() + loss_records.len(),
            wins: win_records.len(),
            losses: loss_records.len(),
            net_profit: net_profit.round_dp(2),
            win_records,
            loss_records,
            unresolved_trades: open.len(),
            open_records: open,
            parameters,
            statistics,
        })
    }

    /// Calculates all profitability-related metrics.
    fn calculate_profitability(
        &self,
        trades: &[CompletedTrade],
        initial_balance: Decimal,
        statistics: &mut PerformanceStatistics,
    ) {
        let mut winning_trades = 0usize;
        let mut losing_trades = 0usize;
        let mut net = Decimal::ZERO;

        for trade in trades {
            net += trade.profit;
            if trade.win {
                statistics.gross_profit += trade.profit;
                winning_trades += 1;
            } else {
                statistics.gross_loss += trade.profit.abs();
                losing_trades += 1;
            }
        }

        // --- Ratios ---
        if statistics.gross_loss > Decimal::ZERO {
            statistics.profit_factor = Some(statistics.gross_profit / statistics.gross_loss);
        }

        if !trades.is_empty() {
            statistics.win_rate_pct = Some(
                (Decimal::from(winning_trades) / Decimal::from(trades.len())) * Decimal::ONE_HUNDRED,
            );
        }

        if winning_trades > 0 {
            statistics.average_win = statistics.gross_profit / Decimal::from(winning_trades);
        }

        if losing_trades > 0 {
            statistics.average_loss = statistics.gross_loss / Decimal::from(losing_trades);
            if statistics.average_loss > Decimal::ZERO {
                statistics.payoff_ratio = Some(statistics.average_win / statistics.average_loss);
            }
        }

        if initial_balance > Decimal::ZERO {
            statistics.total_return_pct = (net / initial_balance) * Decimal::ONE_HUNDRED;
        }
    }

    /// Maximum drawdown of the realized equity curve, stepping once per close.
    fn calculate_drawdown(
        &self,
        trades: &[CompletedTrade],
        initial_balance: Decimal,
        statistics: &mut PerformanceStatistics,
    ) {
        let mut equity = initial_balance;
        let mut peak_equity = initial_balance;
        let mut max_drawdown = Decimal::ZERO;
        let mut peak_at_max = initial_balance;

        for trade in trades {
            equity += trade.profit;
            if equity > peak_equity {
                peak_equity = equity;
            }
            let drawdown = peak_equity - equity;
            if drawdown > max_drawdown {
                max_drawdown = drawdown;
                peak_at_max = peak_equity;
            }
        }

        statistics.max_drawdown = max_drawdown;
        if peak_at_max > Decimal::ZERO {
            statistics.max_drawdown_pct = (max_drawdown / peak_at_max) * Decimal::ONE_HUNDRED;
        }
    }

    /// Calculates time-based metrics.
    fn calculate_time_metrics(
        &self,
        trades: &[CompletedTrade],
        statistics: &mut PerformanceStatistics,
    ) -> Result<(), AnalyticsError> {
        if trades.is_empty() {
            return Ok(());
        }

        let mut total_secs: u64 = 0;
        for trade in trades {
            let held = trade.closing_time - trade.trade.open_time;
            let secs = u64::try_from(held.num_seconds()).map_err(|_| {
                AnalyticsError::InvalidHoldingPeriod {
                    trade_id: trade.trade.trade_id,
                    opened: trade.trade.open_time.to_rfc3339(),
                    closed: trade.closing_time.to_rfc3339(),
                }
            })?;
            total_secs += secs;
        }

        statistics.average_holding_period = Duration::from_secs(total_secs / trades.len() as u64);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profit::trade_profit;
    use chrono::{DateTime, TimeZone, Utc};
    use core_types::{CancelTime, ExitReason, OrderType, ProposedOrder};
    use rust_decimal_macros::dec;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 1, 12, minute, 0).unwrap()
    }

    fn open_trade(id: usize, opened: u32) -> OpenTrade {
        let order = ProposedOrder {
            order_type: OrderType::BuyStop,
            creation_time: at(0),
            stop_price: dec!(1.1050),
            stop_loss: dec!(1.1000),
            take_profit: dec!(1.1150),
            cancel_time: CancelTime::GoodTillCancel,
        };
        OpenTrade::from_order(&order, id, id, dec!(1.0), dec!(100), at(opened))
    }

    fn closed(id: usize, reason: ExitReason, closed_at: u32) -> CompletedTrade {
        let trade = open_trade(id, 1);
        let profit = trade_profit(
            trade.order_type,
            trade.stop_price,
            trade.exit_price(reason),
            trade.lot_size,
            dec!(100000),
        );
        trade.close(reason, at(closed_at), profit)
    }

    #[test]
    fn partitions_wins_and_losses() {
        let completed = vec![
            closed(0, ExitReason::TakeProfit, 11),
            closed(1, ExitReason::StopLoss, 21),
            closed(2, ExitReason::TakeProfit, 31),
        ];
        let report = AnalyticsEngine::new()
            .calculate(
                completed,
                vec![open_trade(3, 40)],
                serde_json::json!({ "fast_period": 12 }),
                dec!(10000),
                dec!(11500),
            )
            .unwrap();

        assert_eq!(report.total_trades, 3);
        assert_eq!(report.wins, 2);
        assert_eq!(report.losses, 1);
        assert_eq!(report.net_profit, dec!(1500.00));
        assert_eq!(report.unresolved_trades, 1);
        assert_eq!(report.open_records[0].trade_id, 3);

        let stats = &report.statistics;
        assert_eq!(stats.gross_profit, dec!(2000));
        assert_eq!(stats.gross_loss, dec!(500));
        assert_eq!(stats.profit_factor, Some(dec!(4)));
        assert_eq!(stats.max_drawdown, dec!(500));
        assert_eq!(stats.average_holding_period, Duration::from_secs(20 * 60));
    }

    #[test]
    fn no_trades_yields_a_zero_report() {
        let report = AnalyticsEngine::new()
            .calculate(Vec::new(), Vec::new(), serde_json::Value::Null, dec!(10000), dec!(10000))
            .unwrap();
        assert_eq!(report, BacktestReport::empty(serde_json::Value::Null, dec!(10000)));
    }

    #[test]
    fn report_serializes_holding_period_as_text() {
        let report = AnalyticsEngine::new()
            .calculate(
                vec![closed(0, ExitReason::TakeProfit, 11)],
                Vec::new(),
                serde_json::Value::Null,
                dec!(10000),
                dec!(11000),
            )
            .unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["statistics"]["average_holding_period"], "10m");
        assert_eq!(json["win_records"][0]["exit_reason"], "take_profit");
    }
}
