use crate::error::ConfigError;
use crate::trailing::TrailingConfig;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

/// Lot divisor used when a symbol names the built-in `standard` class.
const STANDARD_LOT_DIVISOR: Decimal = dec!(10);

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub account: Account,
    pub risk_management: RiskManagement,
    /// Contract-size classes, keyed by name (e.g. `standard`, `jpy`).
    #[serde(default)]
    pub symbol_classes: HashMap<String, SymbolClass>,
    /// Per-symbol metadata, keyed by the symbol without broker suffix.
    #[serde(default)]
    pub symbols: HashMap<String, SymbolSettings>,
    #[serde(default)]
    pub trailing: TrailingConfig,
    #[serde(default)]
    pub simulation: Simulation,
    #[serde(default)]
    pub logging: Logging,
}

/// The simulated trading account.
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    /// The starting balance for every simulation run.
    pub initial_balance: Decimal,
    /// The account currency. Symbols quoted in another currency need an exchange rate.
    #[serde(default = "default_currency")]
    pub currency: String,
}

/// Contains parameters for trade-level risk management.
#[derive(Debug, Clone, Deserialize)]
pub struct RiskManagement {
    /// The fraction of the balance to risk on a single trade (e.g., 0.01 for 1%).
    pub risk_per_trade_pct: Decimal,
    /// Upper bound on any sized lot.
    #[serde(default = "default_max_lot_size")]
    pub max_lot_size: Decimal,
    /// Broker lot granularity, in decimal places.
    #[serde(default = "default_lot_decimals")]
    pub lot_decimals: u32,
}

/// A class of symbols sharing the same lot scaling.
#[derive(Debug, Clone, Deserialize)]
pub struct SymbolClass {
    /// Pip value per lot unit. The raw lot size is `pip_value / lot_divisor`.
    pub lot_divisor: Decimal,
}

/// Symbol metadata as written in the configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct SymbolSettings {
    pub pip_size: Decimal,
    pub contract_size: Decimal,
    #[serde(default = "default_currency")]
    pub base_currency: String,
    #[serde(default = "default_class")]
    pub class: String,
    /// Conversion rate into the account currency, when they differ.
    pub exchange_rate: Option<Decimal>,
}

/// Fully resolved metadata for a single symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolSpec {
    pub symbol: String,
    pub pip_size: Decimal,
    pub contract_size: Decimal,
    pub base_currency: String,
    pub lot_divisor: Decimal,
    pub exchange_rate: Option<Decimal>,
}

/// Parameters for the simulation runtime.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Simulation {
    /// Size of the sweep worker pool. Defaults to the number of CPU cores.
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Logging {
    /// Default filter directive when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Directory for the daily rolling log file. Console only when absent.
    pub directory: Option<PathBuf>,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: None,
        }
    }
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_class() -> String {
    "standard".to_string()
}

fn default_max_lot_size() -> Decimal {
    dec!(9.99)
}

fn default_lot_decimals() -> u32 {
    2
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Strips a broker suffix such as `.a` from a symbol name.
pub fn normalize_symbol(symbol: &str) -> &str {
    symbol.split('.').next().unwrap_or(symbol)
}

impl Config {
    /// Checks the cross-field rules that deserialization cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.account.initial_balance <= Decimal::ZERO {
            return Err(ConfigError::ValidationError(
                "account.initial_balance must be positive".to_string(),
            ));
        }
        let risk = &self.risk_management;
        if risk.risk_per_trade_pct <= Decimal::ZERO || risk.risk_per_trade_pct >= Decimal::ONE {
            return Err(ConfigError::ValidationError(
                "risk_per_trade_pct must be between 0 and 1".to_string(),
            ));
        }
        if risk.max_lot_size <= Decimal::ZERO {
            return Err(ConfigError::ValidationError(
                "max_lot_size must be greater than 0".to_string(),
            ));
        }
        for (name, class) in &self.symbol_classes {
            if class.lot_divisor <= Decimal::ZERO {
                return Err(ConfigError::ValidationError(format!(
                    "symbol class '{name}' must have a positive lot_divisor"
                )));
            }
        }
        let mut seen = HashSet::new();
        for name in self.symbols.keys() {
            if !seen.insert(name.to_ascii_uppercase()) {
                return Err(ConfigError::ValidationError(format!(
                    "symbol '{name}' is listed more than once with different letter case"
                )));
            }
            self.symbol_spec(name)?;
        }
        if self.simulation.workers == Some(0) {
            return Err(ConfigError::ValidationError(
                "simulation.workers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolves the metadata for `symbol`, accepting broker-suffixed names.
    pub fn symbol_spec(&self, symbol: &str) -> Result<SymbolSpec, ConfigError> {
        let name = normalize_symbol(symbol);
        let settings = self
            .symbols
            .get(symbol)
            .or_else(|| self.symbols.get(name))
            .or_else(|| {
                self.symbols
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(name))
                    .map(|(_, settings)| settings)
            })
            .ok_or_else(|| ConfigError::UnknownSymbol(symbol.to_string()))?;

        if settings.pip_size <= Decimal::ZERO || settings.contract_size <= Decimal::ZERO {
            return Err(ConfigError::ValidationError(format!(
                "symbol '{name}' must have a positive pip_size and contract_size"
            )));
        }

        Ok(SymbolSpec {
            symbol: name.to_ascii_uppercase(),
            pip_size: settings.pip_size,
            contract_size: settings.contract_size,
            base_currency: settings.base_currency.clone(),
            lot_divisor: self.lot_divisor(&settings.class)?,
            exchange_rate: settings.exchange_rate,
        })
    }

    fn lot_divisor(&self, class: &str) -> Result<Decimal, ConfigError> {
        match self.symbol_classes.get(class) {
            Some(configured) => Ok(configured.lot_divisor),
            None if class == "standard" => Ok(STANDARD_LOT_DIVISOR),
            None => Err(ConfigError::ValidationError(format!(
                "symbol class '{class}' is not defined"
            ))),
        }
    }
}
