use crate::error::ConfigError;
use chrono::{DateTime, Months, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Defines a parameter sweep. This is deserialized from the `sweep.toml` file.
#[derive(Debug, Clone, Deserialize)]
pub struct SweepConfig {
    pub base: SweepBase,
    pub parameter_space: ParameterSpace,
    /// Input files for each (symbol, timeframe) pair.
    #[serde(default)]
    pub datasets: Vec<DatasetPaths>,
}

/// Base settings for the sweep. Identifiers stay as raw strings until
/// `validate` so an unsupported token is reported before any work starts.
#[derive(Debug, Clone, Deserialize)]
pub struct SweepBase {
    pub strategy: String,
    pub exchange: String,
    pub time_range: String,
    pub symbols: Vec<String>,
    pub timeframes: Vec<String>,
}

/// The identifiers of a `SweepBase` after validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatedBase {
    pub strategy: StrategyId,
    pub exchange: Exchange,
    pub time_range: TimeRange,
}

impl SweepBase {
    pub fn validate(&self) -> Result<ValidatedBase, ConfigError> {
        let validated = ValidatedBase {
            strategy: self.strategy.parse()?,
            exchange: self.exchange.parse()?,
            time_range: self.time_range.parse()?,
        };
        if self.symbols.is_empty() || self.timeframes.is_empty() {
            return Err(ConfigError::ValidationError(
                "a sweep needs at least one symbol and one timeframe".to_string(),
            ));
        }
        Ok(validated)
    }
}

/// File locations for one (symbol, timeframe) dataset.
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetPaths {
    pub symbol: String,
    pub timeframe: String,
    /// One-minute candles driving the simulation clock.
    pub clock: PathBuf,
    /// Candles of the strategy timeframe, with indicator columns.
    pub strategy: PathBuf,
    /// Proposed orders produced by the signal generator.
    pub orders: PathBuf,
}

/// Every axis of the strategy parameter grid, in enumeration order.
#[derive(Debug, Clone, Deserialize)]
pub struct ParameterSpace {
    pub take_profit_multiplier: ParameterAxis,
    pub stop_loss_multiplier: ParameterAxis,
    pub fast_period: ParameterAxis,
    pub slow_period: ParameterAxis,
    pub signal_period: ParameterAxis,
    pub cancel_window: ParameterAxis,
    pub trailing_stop_pips: Option<ParameterAxis>,
    pub trailing_stop_percent: Option<ParameterAxis>,
    pub trailing_take_profit_pips: Option<ParameterAxis>,
    pub trailing_take_profit_percent: Option<ParameterAxis>,
}

impl ParameterSpace {
    /// Named axes in their fixed enumeration order. Absent optional axes are skipped.
    pub fn axes(&self) -> Vec<(&'static str, &ParameterAxis)> {
        let mut axes = vec![
            ("take_profit_multiplier", &self.take_profit_multiplier),
            ("stop_loss_multiplier", &self.stop_loss_multiplier),
            ("fast_period", &self.fast_period),
            ("slow_period", &self.slow_period),
            ("signal_period", &self.signal_period),
            ("cancel_window", &self.cancel_window),
        ];
        let optional = [
            ("trailing_stop_pips", &self.trailing_stop_pips),
            ("trailing_stop_percent", &self.trailing_stop_percent),
            ("trailing_take_profit_pips", &self.trailing_take_profit_pips),
            ("trailing_take_profit_percent", &self.trailing_take_profit_percent),
        ];
        axes.extend(
            optional
                .into_iter()
                .filter_map(|(name, axis)| axis.as_ref().map(|axis| (name, axis))),
        );
        axes
    }
}

/// One grid axis. When `optimize` is false only the first value is used.
#[derive(Debug, Clone, Deserialize)]
pub struct ParameterAxis {
    #[serde(default)]
    pub optimize: bool,
    pub values: ParameterRange,
}

/// Represents a range of values for a single parameter to be tested.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ParameterRange {
    DiscreteInt(Vec<i64>),
    DiscreteDecimal(Vec<Decimal>),
    LinearInt { start: i64, end: i64, step: i64 },
    LinearDecimal { start: Decimal, end: Decimal, step: Decimal },
    Keywords(Vec<String>),
}

/// How far back from the end of the data a sweep looks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum TimeRange {
    #[cfg_attr(feature = "clap", value(name = "1Month"))]
    OneMonth,
    #[cfg_attr(feature = "clap", value(name = "3Months"))]
    ThreeMonths,
    #[cfg_attr(feature = "clap", value(name = "6Months"))]
    SixMonths,
    #[cfg_attr(feature = "clap", value(name = "1Year"))]
    OneYear,
    #[cfg_attr(feature = "clap", value(name = "2Years"))]
    TwoYears,
    #[cfg_attr(feature = "clap", value(name = "3Years"))]
    ThreeYears,
    #[cfg_attr(feature = "clap", value(name = "5Years"))]
    FiveYears,
    #[cfg_attr(feature = "clap", value(name = "All"))]
    All,
}

impl TimeRange {
    pub fn months(&self) -> Option<u32> {
        match self {
            TimeRange::OneMonth => Some(1),
            TimeRange::ThreeMonths => Some(3),
            TimeRange::SixMonths => Some(6),
            TimeRange::OneYear => Some(12),
            TimeRange::TwoYears => Some(24),
            TimeRange::ThreeYears => Some(36),
            TimeRange::FiveYears => Some(60),
            TimeRange::All => None,
        }
    }

    /// Start of the window ending at `end`, or `None` for an unbounded range.
    pub fn start_from(&self, end: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.months()
            .and_then(|months| end.checked_sub_months(Months::new(months)))
    }
}

impl FromStr for TimeRange {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1Month" => Ok(TimeRange::OneMonth),
            "3Months" => Ok(TimeRange::ThreeMonths),
            "6Months" => Ok(TimeRange::SixMonths),
            "1Year" => Ok(TimeRange::OneYear),
            "2Years" => Ok(TimeRange::TwoYears),
            "3Years" => Ok(TimeRange::ThreeYears),
            "5Years" => Ok(TimeRange::FiveYears),
            "All" => Ok(TimeRange::All),
            other => Err(ConfigError::UnsupportedTimeRange(other.to_string())),
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            TimeRange::OneMonth => "1Month",
            TimeRange::ThreeMonths => "3Months",
            TimeRange::SixMonths => "6Months",
            TimeRange::OneYear => "1Year",
            TimeRange::TwoYears => "2Years",
            TimeRange::ThreeYears => "3Years",
            TimeRange::FiveYears => "5Years",
            TimeRange::All => "All",
        };
        write!(f, "{token}")
    }
}

/// Data sources the historical feeds may come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exchange {
    Mt5,
}

impl FromStr for Exchange {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mt5" => Ok(Exchange::Mt5),
            _ => Err(ConfigError::UnsupportedExchange(s.to_string())),
        }
    }
}

/// Strategies whose proposed orders the sweep knows how to consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyId {
    MacdCrossover,
}

impl FromStr for StrategyId {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MACD_Crossover" => Ok(StrategyId::MacdCrossover),
            _ => Err(ConfigError::UnsupportedStrategy(s.to_string())),
        }
    }
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyId::MacdCrossover => write!(f, "MACD_Crossover"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn base() -> SweepBase {
        SweepBase {
            strategy: "MACD_Crossover".to_string(),
            exchange: "mt5".to_string(),
            time_range: "1Year".to_string(),
            symbols: vec!["EURUSD".to_string()],
            timeframes: vec!["H1".to_string()],
        }
    }

    #[test]
    fn supported_identifiers_validate() {
        let validated = base().validate().unwrap();
        assert_eq!(validated.time_range, TimeRange::OneYear);
        assert_eq!(validated.exchange, Exchange::Mt5);
        assert_eq!(validated.strategy, StrategyId::MacdCrossover);
    }

    #[test]
    fn unsupported_tokens_are_rejected() {
        let mut sweep = base();
        sweep.time_range = "2Weeks".to_string();
        assert!(matches!(sweep.validate(), Err(ConfigError::UnsupportedTimeRange(_))));

        let mut sweep = base();
        sweep.exchange = "binance".to_string();
        assert!(matches!(sweep.validate(), Err(ConfigError::UnsupportedExchange(_))));

        let mut sweep = base();
        sweep.strategy = "RSI_Divergence".to_string();
        assert!(matches!(sweep.validate(), Err(ConfigError::UnsupportedStrategy(_))));
    }

    #[test]
    fn time_range_windows_count_calendar_months() {
        let end = Utc.with_ymd_and_hms(2024, 3, 31, 12, 0, 0).unwrap();
        assert_eq!(
            TimeRange::OneMonth.start_from(end),
            Some(Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap())
        );
        assert_eq!(TimeRange::All.start_from(end), None);
        assert_eq!("5Years".parse::<TimeRange>().unwrap().to_string(), "5Years");
    }
}
