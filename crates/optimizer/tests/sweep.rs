use backtester::MarketData;
use chrono::{DateTime, TimeZone, Utc};
use configuration::{
    Account, Config, Logging, ParameterAxis, ParameterRange, ParameterSpace, RiskManagement,
    Simulation, SweepBase, SweepConfig, SymbolSettings, TrailingConfig,
};
use core_types::{CancelTime, Candle, OrderType, ProposedOrder};
use optimizer::{Optimizer, OptimizerError, StaticOrderSource};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;

fn at(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 2, 12, 10, minute, 0).unwrap()
}

fn candle(minute: u32, low: Decimal, high: Decimal) -> Candle {
    Candle {
        timestamp: at(minute),
        open: low,
        high,
        low,
        close: high,
    }
}

fn config(workers: usize) -> Config {
    let mut symbols = HashMap::new();
    symbols.insert(
        "EURUSD".to_string(),
        SymbolSettings {
            pip_size: dec!(0.0001),
            contract_size: dec!(100000),
            base_currency: "USD".to_string(),
            class: "standard".to_string(),
            exchange_rate: None,
        },
    );
    Config {
        account: Account {
            initial_balance: dec!(10000),
            currency: "USD".to_string(),
        },
        risk_management: RiskManagement {
            risk_per_trade_pct: dec!(0.01),
            max_lot_size: dec!(9.99),
            lot_decimals: 2,
        },
        symbol_classes: HashMap::new(),
        symbols,
        trailing: TrailingConfig::default(),
        simulation: Simulation {
            workers: Some(workers),
        },
        logging: Logging::default(),
    }
}

fn axis(optimize: bool, values: ParameterRange) -> ParameterAxis {
    ParameterAxis { optimize, values }
}

fn sweep(fast_periods: Vec<i64>, time_range: &str) -> SweepConfig {
    SweepConfig {
        base: SweepBase {
            strategy: "MACD_Crossover".to_string(),
            exchange: "mt5".to_string(),
            time_range: time_range.to_string(),
            symbols: vec!["EURUSD".to_string()],
            timeframes: vec!["H1".to_string()],
        },
        parameter_space: ParameterSpace {
            take_profit_multiplier: axis(true, ParameterRange::DiscreteDecimal(vec![dec!(1), dec!(2)])),
            stop_loss_multiplier: axis(false, ParameterRange::DiscreteDecimal(vec![dec!(1)])),
            fast_period: axis(true, ParameterRange::DiscreteInt(fast_periods)),
            slow_period: axis(false, ParameterRange::DiscreteInt(vec![26])),
            signal_period: axis(false, ParameterRange::DiscreteInt(vec![9])),
            cancel_window: axis(false, ParameterRange::Keywords(vec!["GTC".to_string()])),
            trailing_stop_pips: None,
            trailing_stop_percent: None,
            trailing_take_profit_pips: None,
            trailing_take_profit_percent: None,
        },
        datasets: Vec::new(),
    }
}

fn market() -> MarketData {
    MarketData::new(
        vec![
            candle(1, dec!(1.1990), dec!(1.2010)),
            candle(2, dec!(1.2000), dec!(1.2060)),
            candle(3, dec!(1.2040), dec!(1.2070)),
        ],
        Vec::new(),
    )
}

fn source() -> StaticOrderSource {
    let mut source = StaticOrderSource::new();
    source.insert(
        "EURUSD",
        "H1",
        vec![ProposedOrder {
            order_type: OrderType::BuyStop,
            creation_time: at(0),
            stop_price: dec!(1.2000),
            stop_loss: dec!(1.1950),
            take_profit: dec!(1.2050),
            cancel_time: CancelTime::GoodTillCancel,
        }],
    );
    source
}

fn optimizer(sweep: SweepConfig, workers: usize) -> Optimizer {
    let mut optimizer = Optimizer::new(sweep, config(workers), Box::new(source())).with_progress(false);
    optimizer.add_market_data("EURUSD", "H1", market());
    optimizer
}

#[test]
fn best_result_is_the_most_profitable_combination() {
    let summary = optimizer(sweep(vec![12], "All"), 2).run().unwrap();

    assert_eq!(summary.total_tasks, 2);
    assert_eq!(summary.results.len(), 2);
    assert!(summary.failed.is_empty());

    let best = summary.best.unwrap();
    assert_eq!(best.index, 0);
    assert_eq!(best.report.net_profit, dec!(100.00));
    // With a doubled target the trade never closes.
    assert_eq!(summary.results[1].report.unresolved_trades, 1);
    assert_eq!(summary.results[1].report.net_profit, Decimal::ZERO);
}

#[test]
fn invalid_combinations_fail_without_stopping_the_sweep() {
    let summary = optimizer(sweep(vec![12, 30], "All"), 2).run().unwrap();

    assert_eq!(summary.total_tasks, 4);
    assert_eq!(summary.results.len(), 2);
    assert_eq!(summary.failed.len(), 2);
    assert!(summary.failed.iter().all(|task| task.parameters["fast_period"] == 30));
    assert_eq!(summary.best.unwrap().index, 0);
}

#[test]
fn missing_market_data_is_a_task_failure() {
    let optimizer = Optimizer::new(sweep(vec![12], "All"), config(1), Box::new(source())).with_progress(false);
    let summary = optimizer.run().unwrap();
    assert_eq!(summary.failed.len(), 2);
    assert!(summary.best.is_none());
}

#[test]
fn empty_order_source_gives_degenerate_zero_results() {
    let mut optimizer =
        Optimizer::new(sweep(vec![12], "All"), config(1), Box::new(StaticOrderSource::new())).with_progress(false);
    optimizer.add_market_data("EURUSD", "H1", market());
    let summary = optimizer.run().unwrap();

    assert_eq!(summary.degenerate, 2);
    assert_eq!(summary.results.len(), 2);
    assert!(summary.results.iter().all(|result| result.report.net_profit.is_zero()));
    assert_eq!(summary.best.unwrap().index, 0);
}

#[test]
fn unsupported_time_range_fails_before_any_work() {
    let result = optimizer(sweep(vec![12], "2Weeks"), 1).run();
    assert!(matches!(result, Err(OptimizerError::Config(_))));
}

#[test]
fn worker_count_does_not_change_the_outcome() {
    let single = optimizer(sweep(vec![8, 12], "1Month"), 1).run().unwrap();
    let parallel = optimizer(sweep(vec![8, 12], "1Month"), 4).run().unwrap();
    assert_eq!(single, parallel);
}
