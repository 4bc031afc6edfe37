use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    #[error("Trade {trade_id} closed at {closed} before it opened at {opened}")]
    InvalidHoldingPeriod {
        trade_id: usize,
        opened: String,
        closed: String,
    },
}
