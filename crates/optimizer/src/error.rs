use indicatif::style::TemplateError;
use serde_json::Error as JsonError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OptimizerError {
    #[error("Configuration error: {0}")]
    Config(#[from] configuration::ConfigError),

    #[error("Backtest execution failed within optimizer: {0}")]
    Backtest(#[from] backtester::BacktestError),

    #[error("Parameter generation failed: {0}")]
    ParameterGeneration(String),

    #[error("Invalid parameter combination: {0}")]
    InvalidParameters(String),

    #[error("No market data loaded for {symbol} {timeframe}")]
    MissingMarketData { symbol: String, timeframe: String },

    #[error("Order source failed: {0}")]
    Source(String),

    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] JsonError),

    #[error("Failed to build the worker pool: {0}")]
    ThreadPool(String),

    #[error("Progress bar template error: {0}")]
    ProgressBarTemplate(String),
}

impl From<TemplateError> for OptimizerError {
    fn from(error: TemplateError) -> Self {
        OptimizerError::ProgressBarTemplate(error.to_string())
    }
}

impl From<rayon::ThreadPoolBuildError> for OptimizerError {
    fn from(error: rayon::ThreadPoolBuildError) -> Self {
        OptimizerError::ThreadPool(error.to_string())
    }
}
