//! # Pipsim Analytics Engine
//!
//! This crate turns the trades of one simulation run into its result. It
//! acts as the "unbiased judge" of every sweep task.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of external systems.
//!   It depends only on `core-types` (Layer 0).
//! - **Stateless Calculation:** The `AnalyticsEngine` is a stateless calculator. It takes
//!   the completed and still-open trades of a run as input and produces a `BacktestReport`
//!   as output.
//!
//! ## Public API
//!
//! - `AnalyticsEngine`: The main struct that contains the calculation logic.
//! - `BacktestReport`: The result of one run, with full trade records.
//! - `PerformanceStatistics`: Aggregate metrics attached to every report.
//! - `trade_profit`: The signed profit of a closed position.
//! - `AnalyticsError`: The specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod engine;
pub mod error;
pub mod profit;
pub mod report;

// Re-export the key components to create a clean, public-facing API.
pub use engine::AnalyticsEngine;
pub use error::AnalyticsError;
pub use profit::trade_profit;
pub use report::{BacktestReport, PerformanceStatistics};
