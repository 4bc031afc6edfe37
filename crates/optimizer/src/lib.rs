//! # Pipsim Optimizer
//!
//! Runs one simulation per (symbol, timeframe, parameter combination) on a
//! bounded rayon pool and reduces the results to the most profitable one.
//!
//! ## Public API
//!
//! - `Optimizer`: validates a sweep and runs every task.
//! - `generate_parameter_sets`: enumerates the parameter grid.
//! - `OrderSource`: the seam to the signal generator; `StaticOrderSource`
//!   serves pre-generated order files.
//! - `SweepSummary`: the best result, all results and the failed tasks.

use crate::generator::generate_parameter_sets;
use crate::task::TaskOutcome;
use analytics::BacktestReport;
use backtester::{Backtester, CancelFlag, MarketData};
use configuration::{Config, SweepConfig, TimeRange};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::collections::HashMap;

pub mod error;
pub mod generator;
pub mod source;
pub mod task;

pub use error::OptimizerError;
pub use generator::ParameterSet;
pub use source::{OrderSource, StaticOrderSource};
pub use task::{FailedTask, SweepResult, SweepSummary, SweepTask};

pub struct Optimizer {
    sweep: SweepConfig,
    base_config: Config,
    market: HashMap<(String, String), MarketData>,
    source: Box<dyn OrderSource>,
    cancel: CancelFlag,
    show_progress: bool,
}

impl Optimizer {
    pub fn new(sweep: SweepConfig, base_config: Config, source: Box<dyn OrderSource>) -> Self {
        Self {
            sweep,
            base_config,
            market: HashMap::new(),
            source,
            cancel: CancelFlag::new(),
            show_progress: true,
        }
    }

    /// Registers the feeds for one (symbol, timeframe) pair.
    pub fn add_market_data(&mut self, symbol: &str, timeframe: &str, market: MarketData) {
        self.market
            .insert((symbol.to_string(), timeframe.to_string()), market);
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// A handle that stops every running task at its next clock tick.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Builds the full task list. Fails before any work if the sweep is invalid.
    pub fn tasks(&self) -> Result<Vec<SweepTask>, OptimizerError> {
        self.sweep.base.validate()?;
        let parameter_sets = generate_parameter_sets(&self.sweep.parameter_space)?;

        let mut tasks = Vec::new();
        for symbol in &self.sweep.base.symbols {
            for timeframe in &self.sweep.base.timeframes {
                for parameters in &parameter_sets {
                    tasks.push(SweepTask {
                        index: tasks.len(),
                        symbol: symbol.clone(),
                        timeframe: timeframe.clone(),
                        parameters: parameters.clone(),
                        trailing: parameters.trailing(&self.base_config.trailing)?,
                    });
                }
            }
        }
        Ok(tasks)
    }

    pub fn run(&self) -> Result<SweepSummary, OptimizerError> {
        let base = self.sweep.base.validate()?;
        let tasks = self.tasks()?;
        let total_tasks = tasks.len();

        let workers = self
            .base_config
            .simulation
            .workers
            .unwrap_or_else(num_cpus::get);
        let pool = rayon::ThreadPoolBuilder::new().num_threads(workers).build()?;

        tracing::info!(
            strategy = %base.strategy,
            time_range = %base.time_range,
            tasks = total_tasks,
            workers,
            "Starting parameter sweep"
        );

        let progress_bar = if self.show_progress {
            ProgressBar::new(total_tasks as u64)
        } else {
            ProgressBar::hidden()
        };
        progress_bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
                .progress_chars("=>-"),
        );

        // Collecting keeps task order, so the reduction never depends on completion order.
        let outcomes: Vec<(SweepTask, Result<TaskOutcome, String>)> = pool.install(|| {
            tasks
                .into_par_iter()
                .map(|task| {
                    let outcome = self.execute_task(&task, base.time_range).map_err(|e| {
                        tracing::warn!(
                            task = task.index,
                            symbol = %task.symbol,
                            timeframe = %task.timeframe,
                            error = %e,
                            "Sweep task failed"
                        );
                        e.to_string()
                    });
                    progress_bar.inc(1);
                    (task, outcome)
                })
                .collect()
        });

        progress_bar.finish_with_message("Parameter sweep complete.");

        let summary = SweepSummary::reduce(total_tasks, outcomes);
        match &summary.best {
            Some(best) => tracing::info!(
                task = best.index,
                symbol = %best.symbol,
                timeframe = %best.timeframe,
                net_profit = %best.report.net_profit,
                failed = summary.failed.len(),
                degenerate = summary.degenerate,
                "Best combination found"
            ),
            None => tracing::warn!(failed = summary.failed.len(), "No sweep task succeeded"),
        }

        Ok(summary)
    }

    fn execute_task(&self, task: &SweepTask, time_range: TimeRange) -> Result<TaskOutcome, OptimizerError> {
        task.parameters.validate()?;

        let market = self
            .market
            .get(&(task.symbol.clone(), task.timeframe.clone()))
            .ok_or_else(|| OptimizerError::MissingMarketData {
                symbol: task.symbol.clone(),
                timeframe: task.timeframe.clone(),
            })?
            .trimmed(time_range);

        let parameters = task.parameters.to_value();
        let orders = self
            .source
            .orders(&task.symbol, &task.timeframe, &task.parameters)?
            .unwrap_or_default();
        if orders.is_empty() {
            tracing::debug!(task = task.index, "Order source returned no orders");
            return Ok(TaskOutcome::Degenerate(BacktestReport::empty(
                parameters,
                self.base_config.account.initial_balance,
            )));
        }

        let backtester = Backtester::from_config(&self.base_config, &task.symbol, &task.trailing, market)?
            .with_cancel_flag(self.cancel.clone());
        let report = backtester.run(&orders, parameters)?;
        Ok(TaskOutcome::Completed(report))
    }
}
