use analytics::BacktestReport;
use anyhow::{Context, Result};
use backtester::{Backtester, MarketData};
use clap::{Parser, Subcommand};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use configuration::{Config, TimeRange, init_tracing, load_config, load_sweep_config};
use core_types::{CancelWindow, Candle, ProposedOrder, StrategyCandle};
use optimizer::{Optimizer, StaticOrderSource, SweepSummary};
use std::path::PathBuf;

mod data;

/// The main entry point for the pipsim simulator.
fn main() -> Result<()> {
    // Parse command-line arguments
    let cli = Cli::parse();

    let config = load_config(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    // Held until exit so the file writer flushes.
    let _log_guard = init_tracing(&config.logging)?;

    // Execute the appropriate command
    match cli.command {
        Commands::Backtest(args) => handle_backtest(args, &config),
        Commands::Sweep(args) => handle_sweep(args, config),
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Replays stop orders against historical candles and sweeps strategy parameters.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the application configuration.
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate one list of proposed orders against a clock feed.
    Backtest(BacktestArgs),
    /// Run every parameter combination of a sweep definition in parallel.
    Sweep(SweepArgs),
}

#[derive(Parser)]
struct BacktestArgs {
    /// The symbol to simulate (e.g., "EURUSD"). Broker suffixes are ignored.
    #[arg(long)]
    symbol: String,

    /// JSON file of one-minute candles driving the simulation.
    #[arg(long)]
    clock: PathBuf,

    /// JSON file of strategy-timeframe candles with indicator columns.
    #[arg(long)]
    strategy: Option<PathBuf>,

    /// JSON file of proposed orders.
    #[arg(long)]
    orders: PathBuf,

    /// How much history to replay, counted back from the last clock candle.
    #[arg(long, value_enum, default_value = "All")]
    time_range: TimeRange,

    /// Overrides every order's cancel time: "GTC" or minutes after creation.
    #[arg(long)]
    cancel_window: Option<CancelWindow>,

    /// Where to write the full report as JSON.
    #[arg(long, short)]
    output: Option<PathBuf>,
}

#[derive(Parser)]
struct SweepArgs {
    /// Path to the sweep definition.
    #[arg(long, default_value = "sweep.toml")]
    sweep: PathBuf,

    /// Where to write the sweep summary as JSON.
    #[arg(long, short)]
    output: Option<PathBuf>,
}

// ==============================================================================
// Command Logic
// ==============================================================================

fn handle_backtest(args: BacktestArgs, config: &Config) -> Result<()> {
    let clock: Vec<Candle> = data::read_json(&args.clock)?;
    let strategy: Vec<StrategyCandle> = match &args.strategy {
        Some(path) => data::read_json(path)?,
        None => Vec::new(),
    };
    let mut orders: Vec<ProposedOrder> = data::read_json(&args.orders)?;
    if let Some(window) = args.cancel_window {
        for order in &mut orders {
            order.cancel_time = window.resolve(order.creation_time);
        }
    }

    let market = MarketData::new(clock, strategy).trimmed(args.time_range);
    let parameters = serde_json::json!({
        "symbol": args.symbol,
        "time_range": args.time_range.to_string(),
        "cancel_window": args.cancel_window.map(|window| window.to_string()),
    });

    let report = Backtester::from_config(config, &args.symbol, &config.trailing, market)?
        .with_progress(true)
        .run(&orders, parameters)?;

    println!("{}", report_table(&[(args.symbol.as_str(), "-", &report)]));
    if let Some(path) = &args.output {
        data::write_json(path, &report)?;
        tracing::info!(path = %path.display(), "Report written");
    }
    Ok(())
}

fn handle_sweep(args: SweepArgs, config: Config) -> Result<()> {
    let sweep = load_sweep_config(&args.sweep)
        .with_context(|| format!("Failed to load sweep definition from {}", args.sweep.display()))?;

    // Load every dataset up front; the feeds are shared read-only by all tasks.
    let mut source = StaticOrderSource::new();
    let mut markets = Vec::with_capacity(sweep.datasets.len());
    for dataset in &sweep.datasets {
        let clock: Vec<Candle> = data::read_json(&dataset.clock)?;
        let strategy: Vec<StrategyCandle> = data::read_json(&dataset.strategy)?;
        let orders: Vec<ProposedOrder> = data::read_json(&dataset.orders)?;
        source.insert(&dataset.symbol, &dataset.timeframe, orders);
        markets.push((
            dataset.symbol.clone(),
            dataset.timeframe.clone(),
            MarketData::new(clock, strategy),
        ));
    }

    let mut optimizer = Optimizer::new(sweep, config, Box::new(source));
    for (symbol, timeframe, market) in markets {
        optimizer.add_market_data(&symbol, &timeframe, market);
    }

    let summary = optimizer.run()?;
    print_sweep_summary(&summary);

    if let Some(path) = &args.output {
        data::write_json(path, &summary)?;
        tracing::info!(path = %path.display(), "Sweep summary written");
    }
    Ok(())
}

/// Number of top results shown in the terminal.
const TOP_RESULTS: usize = 10;

fn print_sweep_summary(summary: &SweepSummary) {
    let mut ranked: Vec<_> = summary.results.iter().collect();
    // Stable sort keeps task order among equal profits.
    ranked.sort_by(|a, b| b.report.net_profit.cmp(&a.report.net_profit));

    let rows: Vec<_> = ranked
        .iter()
        .take(TOP_RESULTS)
        .map(|result| (result.symbol.as_str(), result.timeframe.as_str(), &result.report))
        .collect();
    println!("{}", report_table(&rows));

    println!(
        "{} tasks: {} succeeded, {} failed, {} without orders.",
        summary.total_tasks,
        summary.results.len(),
        summary.failed.len(),
        summary.degenerate
    );
    for failed in &summary.failed {
        println!("  task {} ({} {}): {}", failed.index, failed.symbol, failed.timeframe, failed.error);
    }
    if let Some(best) = &summary.best {
        println!(
            "Best: task {} {} {} net profit {} with {}",
            best.index, best.symbol, best.timeframe, best.report.net_profit, best.report.parameters
        );
    }
}

fn report_table(rows: &[(&str, &str, &BacktestReport)]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            "Symbol",
            "Timeframe",
            "Trades",
            "Wins",
            "Losses",
            "Win rate %",
            "Net profit",
            "Max drawdown",
            "Unresolved",
        ]);

    for (symbol, timeframe, report) in rows {
        let win_rate = report
            .statistics
            .win_rate_pct
            .map(|rate| rate.round_dp(2).to_string())
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            symbol.to_string(),
            timeframe.to_string(),
            report.total_trades.to_string(),
            report.wins.to_string(),
            report.losses.to_string(),
            win_rate,
            report.net_profit.to_string(),
            report.statistics.max_drawdown.round_dp(2).to_string(),
            report.unresolved_trades.to_string(),
        ]);
    }
    table
}
