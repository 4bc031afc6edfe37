use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration from file: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation error: {0}")]
    ValidationError(String),

    #[error("Time range '{0}' is not supported")]
    UnsupportedTimeRange(String),

    #[error("Exchange '{0}' is not supported")]
    UnsupportedExchange(String),

    #[error("Strategy '{0}' is not supported")]
    UnsupportedStrategy(String),

    #[error("No symbol metadata configured for '{0}'")]
    UnknownSymbol(String),

    #[error("Failed to initialise logging: {0}")]
    Logging(String),
}
