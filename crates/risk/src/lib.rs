//! # Pipsim Risk
//!
//! Position sizing for triggered stop orders.
//!
//! ## Architectural Principles
//!
//! - **Decoupled Logic:** The simulation loop only sees the `PositionSizer`
//!   trait. The fixed-fractional rule is one implementation of it.
//! - **Deterministic:** Sizing is a pure function of the balance at trigger
//!   time, the order's levels and the symbol metadata.

pub mod error;
pub mod fixed_fractional;

pub use error::RiskError;
pub use fixed_fractional::{FixedFractionalSizer, LotSizing};

use configuration::SymbolSpec;
use rust_decimal::Decimal;

/// Computes the lot size for an order at the moment it triggers.
pub trait PositionSizer: Send + Sync {
    fn size_lot(
        &self,
        balance: Decimal,
        stop_price: Decimal,
        stop_loss: Decimal,
        symbol: &SymbolSpec,
    ) -> Result<LotSizing, RiskError>;
}
