//! # Pipsim Executor Crate
//!
//! This crate decides what happens to orders and trades on a single clock
//! tick, and keeps the simulated account's books.
//!
//! ## Architectural Principles
//!
//! - **State vs. Logic Decoupling:** `fills` and `trailing` are pure
//!   calculators. They inspect a candle and return a decision without
//!   mutating anything. The `Account` struct is the state machine that
//!   applies reservations and settlements to the balance.
//! - **Loop Agnostic:** Nothing here knows about feeds or iteration order.
//!   The backtester owns sequencing and calls into these pieces.
//!
//! ## Public API
//!
//! - `fills`: trigger, liveness, expiry and exit predicates.
//! - `TrailingAdjuster`: proposes favorable moves of protective levels.
//! - `Account`: the balance ledger of one simulation run.
//! - `ExecutorError`: The specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod account;
pub mod error;
pub mod fills;
pub mod trailing;

// Re-export the key components to provide a clean, public-facing API.
pub use account::Account;
pub use error::ExecutorError;
pub use fills::{
    evaluate_exit, order_has_expired, order_is_live, order_triggers, stop_loss_hit,
    take_profit_hit,
};
pub use trailing::{LevelUpdate, TrailingAdjuster};
