//! # Pipsim Backtester
//!
//! Replays a minute-resolution clock feed against a list of proposed stop
//! orders and reports what a fixed-fractional account would have made.
//!
//! ## Per-tick sequence
//!
//! 1. Every open trade trails its stop-loss, then its take-profit, and is
//!    then tested for a stop-loss hit, else a take-profit hit.
//! 2. The first live pending order whose stop price the candle reaches is
//!    filled. At most one order triggers per tick.
//! 3. Pending orders whose cancel time has passed are dropped.

use analytics::{AnalyticsEngine, BacktestReport, trade_profit};
use chrono::{DateTime, Utc};
use configuration::{Config, SymbolSpec, TrailingConfig};
use core_types::{Candle, CompletedTrade, ExitReason, OpenTrade, ProposedOrder};
use executor::{
    Account, TrailingAdjuster, evaluate_exit, order_has_expired, order_is_live, order_triggers,
};
use indicatif::{ProgressBar, ProgressStyle};
use risk::{FixedFractionalSizer, PositionSizer};
use rust_decimal::Decimal;

pub mod cancel;
pub mod error;
pub mod market;

pub use cancel::CancelFlag;
pub use error::BacktestError;
pub use market::MarketData;

/// The simulation engine for one symbol and one set of trailing rules.
///
/// `run` keeps all mutable state local, so a `Backtester` can be run any
/// number of times and always produces the same report for the same orders.
pub struct Backtester {
    // --- Context ---
    symbol: SymbolSpec,
    initial_balance: Decimal,
    market: MarketData,
    // --- Components ---
    sizer: Box<dyn PositionSizer>,
    trailing: TrailingAdjuster,
    analytics_engine: AnalyticsEngine,
    // --- Controls ---
    cancel: Option<CancelFlag>,
    show_progress: bool,
}

impl Backtester {
    pub fn new(
        symbol: SymbolSpec,
        initial_balance: Decimal,
        market: MarketData,
        sizer: Box<dyn PositionSizer>,
        trailing: TrailingAdjuster,
    ) -> Self {
        Self {
            symbol,
            initial_balance,
            market,
            sizer,
            trailing,
            analytics_engine: AnalyticsEngine::new(),
            cancel: None,
            show_progress: false,
        }
    }

    /// Builds a backtester from the application configuration.
    pub fn from_config(
        config: &Config,
        symbol: &str,
        trailing: &TrailingConfig,
        market: MarketData,
    ) -> Result<Self, BacktestError> {
        let spec = config.symbol_spec(symbol)?;
        let sizer = FixedFractionalSizer::new(
            config.risk_management.clone(),
            config.account.currency.clone(),
        )?;
        let trailing = TrailingAdjuster::new(trailing, spec.pip_size)?;
        Ok(Self::new(
            spec,
            config.account.initial_balance,
            market,
            Box::new(sizer),
            trailing,
        ))
    }

    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Draws a per-tick progress bar. Off by default so sweeps stay quiet.
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Runs the simulation over the whole clock feed.
    pub fn run(
        &self,
        orders: &[ProposedOrder],
        parameters: serde_json::Value,
    ) -> Result<BacktestReport, BacktestError> {
        if self.market.is_empty() {
            return Err(BacktestError::DataUnavailable);
        }
        self.trailing.check_feed(self.market.strategy())?;

        let clock = self.market.clock();
        let mut account = Account::new(self.initial_balance);
        let mut pending: Vec<(usize, &ProposedOrder)> = orders.iter().enumerate().collect();
        let mut open: Vec<OpenTrade> = Vec::new();
        let mut completed: Vec<CompletedTrade> = Vec::new();
        let mut next_trade_id = 0usize;

        tracing::info!(
            symbol = %self.symbol.symbol,
            ticks = clock.len(),
            orders = orders.len(),
            "Starting simulation"
        );

        let progress_bar = if self.show_progress {
            ProgressBar::new(clock.len() as u64)
        } else {
            ProgressBar::hidden()
        };
        progress_bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
                .progress_chars("=>-"),
        );

        for candle in clock.iter() {
            if self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled) {
                progress_bar.abandon_with_message("Simulation cancelled.");
                return Err(BacktestError::Cancelled);
            }

            // --- 1. OPEN TRADES ---
            // Every open trade is evaluated; closed ones are compacted out afterwards.
            let mut still_open = Vec::with_capacity(open.len());
            for mut trade in std::mem::take(&mut open) {
                self.apply_trailing(candle, &mut trade);
                match evaluate_exit(candle, &trade) {
                    Some(reason) => {
                        let closed = self.close_trade(trade, reason, candle.timestamp, &mut account)?;
                        completed.push(closed);
                    }
                    None => still_open.push(trade),
                }
            }
            open = still_open;

            // --- 2. PENDING ORDERS ---
            // A drained account cannot size new trades; orders stay pending.
            let triggered = (account.balance > Decimal::ZERO)
                .then(|| {
                    pending.iter().position(|(_, order)| {
                        order_is_live(candle.timestamp, order) && order_triggers(candle, order)
                    })
                })
                .flatten();
            if let Some(position) = triggered {
                let (order_index, order) = pending.remove(position);
                let trade = self.open_trade(order, order_index, next_trade_id, candle.timestamp, &mut account)?;
                next_trade_id += 1;
                open.push(trade);
            }

            // --- 3. EXPIRY ---
            pending.retain(|(_, order)| !order_has_expired(candle.timestamp, order));

            progress_bar.inc(1);
        }

        progress_bar.finish_with_message("Simulation complete.");

        let final_balance = account.equity();
        let report = self.analytics_engine.calculate(
            completed,
            open,
            parameters,
            self.initial_balance,
            final_balance,
        )?;

        tracing::info!(
            symbol = %self.symbol.symbol,
            total_trades = report.total_trades,
            wins = report.wins,
            losses = report.losses,
            net_profit = %report.net_profit,
            unresolved = report.unresolved_trades,
            "Simulation finished"
        );

        Ok(report)
    }

    /// Applies trailing stop-loss then trailing take-profit, logging each move.
    fn apply_trailing(&self, candle: &Candle, trade: &mut OpenTrade) {
        if !self.trailing.is_active() {
            return;
        }
        if let Some(update) = self.trailing.adjust_stop_loss(candle, trade, self.market.strategy()) {
            tracing::debug!(
                trade_id = trade.trade_id,
                from = %trade.stop_loss,
                to = %update.new_level,
                "Trailing stop-loss"
            );
            trade.trailing_stop_log.push(update.record(candle.timestamp, trade.stop_loss));
            trade.stop_loss = update.new_level;
        }
        if let Some(update) = self.trailing.adjust_take_profit(candle, trade, self.market.strategy()) {
            tracing::debug!(
                trade_id = trade.trade_id,
                from = %trade.take_profit,
                to = %update.new_level,
                "Trailing take-profit"
            );
            trade.trailing_take_profit_log.push(update.record(candle.timestamp, trade.take_profit));
            trade.take_profit = update.new_level;
        }
    }

    fn open_trade(
        &self,
        order: &ProposedOrder,
        order_index: usize,
        trade_id: usize,
        time: DateTime<Utc>,
        account: &mut Account,
    ) -> Result<OpenTrade, BacktestError> {
        let sizing = self
            .sizer
            .size_lot(account.balance, order.stop_price, order.stop_loss, &self.symbol)?;
        account.reserve(sizing.risk_amount)?;

        tracing::debug!(
            trade_id,
            order_index,
            order_type = %order.order_type,
            stop_price = %order.stop_price,
            lot_size = %sizing.lot_size,
            %time,
            "Order triggered"
        );

        Ok(OpenTrade::from_order(
            order,
            order_index,
            trade_id,
            sizing.lot_size,
            sizing.risk_amount,
            time,
        ))
    }

    fn close_trade(
        &self,
        trade: OpenTrade,
        reason: ExitReason,
        time: DateTime<Utc>,
        account: &mut Account,
    ) -> Result<CompletedTrade, BacktestError> {
        let profit = trade_profit(
            trade.order_type,
            trade.stop_price,
            trade.exit_price(reason),
            trade.lot_size,
            self.symbol.contract_size,
        );
        account.settle(trade.reserved_amount, profit)?;

        tracing::debug!(
            trade_id = trade.trade_id,
            ?reason,
            %profit,
            balance = %account.balance,
            %time,
            "Trade closed"
        );

        Ok(trade.close(reason, time, profit))
    }
}
