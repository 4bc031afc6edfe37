//! # Pipsim Configuration
//!
//! Typed configuration for the simulator and the parameter sweep.
//!
//! `config.toml` describes the account, risk limits, symbol metadata and
//! trailing behaviour shared by every run. `sweep.toml` describes the grid a
//! sweep enumerates. Both are read with the `config` crate and validated
//! before any simulation work starts.

use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;
pub mod sweep_config;
pub mod trailing;

// Re-export the core types to provide a clean public API.
pub use error::ConfigError;
pub use logging::init_tracing;
pub use settings::{
    Account, Config, Logging, RiskManagement, Simulation, SymbolClass, SymbolSettings, SymbolSpec,
    normalize_symbol,
};
pub use sweep_config::{
    DatasetPaths, Exchange, ParameterAxis, ParameterRange, ParameterSpace, StrategyId,
    SweepBase, SweepConfig, TimeRange, ValidatedBase,
};
pub use trailing::{TrailingConfig, TrailingPolicy};

/// Prefix for environment overrides, e.g. `PIPSIM_ACCOUNT__INITIAL_BALANCE`.
const ENV_PREFIX: &str = "PIPSIM";

/// Loads and validates the application configuration.
///
/// Values from the file can be overridden through `PIPSIM_`-prefixed
/// environment variables, with `__` separating nested keys.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;

    Ok(config)
}

/// Loads a sweep definition and checks its identifiers.
pub fn load_sweep_config(path: &Path) -> Result<SweepConfig, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from(path))
        .build()?;

    let sweep = builder.try_deserialize::<SweepConfig>()?;
    sweep.base.validate()?;

    Ok(sweep)
}
