use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RiskError {
    #[error("Risk parameters from configuration are invalid: {0}")]
    InvalidParameters(String),

    #[error("Stop price {stop_price} and stop-loss {stop_loss} are zero pips apart")]
    DegenerateStop {
        stop_price: Decimal,
        stop_loss: Decimal,
    },

    #[error("Symbol {symbol} is quoted in {currency} but no exchange rate is configured")]
    MissingExchangeRate { symbol: String, currency: String },

    #[error("The pip size for {0} is zero or negative.")]
    InvalidPipSize(String),

    #[error("The account balance ({0}) is zero or negative.")]
    InsufficientBalance(Decimal),
}
