use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutorError {
    #[error("Invalid trailing configuration: {0}")]
    InvalidTrailing(String),

    #[error("Strategy feed has no column named '{0}'")]
    UnknownColumn(String),

    #[error("Not enough balance to reserve for trade. Required: {required}, Available: {available}")]
    InsufficientBalance { required: Decimal, available: Decimal },

    #[error("Cannot release {requested} when only {reserved} is reserved")]
    ReservationMismatch { requested: Decimal, reserved: Decimal },
}
