pub mod enums;
pub mod error;
pub mod feed;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{ExitReason, OrderType, TrailingMode};
pub use error::CoreError;
pub use feed::StrategyFeed;
pub use structs::{
    CancelTime, CancelWindow, Candle, CompletedTrade, OpenTrade, ProposedOrder, StrategyCandle,
    TrailingUpdate,
};
