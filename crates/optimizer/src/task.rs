use crate::generator::ParameterSet;
use analytics::BacktestReport;
use configuration::TrailingConfig;
use serde::Serialize;

/// One unit of sweep work: a parameter combination on one (symbol, timeframe).
#[derive(Debug, Clone)]
pub struct SweepTask {
    pub index: usize,
    pub symbol: String,
    pub timeframe: String,
    pub parameters: ParameterSet,
    pub trailing: TrailingConfig,
}

/// The report of a task that ran to completion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepResult {
    pub index: usize,
    pub symbol: String,
    pub timeframe: String,
    pub report: BacktestReport,
}

/// A task that failed, with the error that stopped it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedTask {
    pub index: usize,
    pub symbol: String,
    pub timeframe: String,
    pub parameters: serde_json::Value,
    pub error: String,
}

/// What a single task produced.
#[derive(Debug)]
pub(crate) enum TaskOutcome {
    Completed(BacktestReport),
    /// The order source had no orders for this task.
    Degenerate(BacktestReport),
}

/// The reduced result of a whole sweep.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepSummary {
    pub total_tasks: usize,
    /// The highest `net_profit`. The lowest task index wins ties.
    pub best: Option<SweepResult>,
    /// Every successful task, in task order.
    pub results: Vec<SweepResult>,
    pub failed: Vec<FailedTask>,
    /// Tasks whose order source returned nothing.
    pub degenerate: usize,
}

impl SweepSummary {
    pub(crate) fn reduce(total_tasks: usize, outcomes: Vec<(SweepTask, Result<TaskOutcome, String>)>) -> Self {
        let mut results = Vec::new();
        let mut failed = Vec::new();
        let mut degenerate = 0;

        for (task, outcome) in outcomes {
            match outcome {
                Ok(TaskOutcome::Completed(report)) => results.push(SweepResult {
                    index: task.index,
                    symbol: task.symbol,
                    timeframe: task.timeframe,
                    report,
                }),
                Ok(TaskOutcome::Degenerate(report)) => {
                    degenerate += 1;
                    results.push(SweepResult {
                        index: task.index,
                        symbol: task.symbol,
                        timeframe: task.timeframe,
                        report,
                    });
                }
                Err(error) => failed.push(FailedTask {
                    index: task.index,
                    symbol: task.symbol,
                    timeframe: task.timeframe,
                    parameters: task.parameters.to_value(),
                    error,
                }),
            }
        }

        let best = results
            .iter()
            .fold(None::<&SweepResult>, |best, candidate| match best {
                Some(current) if current.report.net_profit >= candidate.report.net_profit => Some(current),
                _ => Some(candidate),
            })
            .cloned();

        Self {
            total_tasks,
            best,
            results,
            failed,
            degenerate,
        }
    }
}
