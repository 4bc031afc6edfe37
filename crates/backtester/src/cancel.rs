use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A cooperative stop signal shared between a caller and running simulations.
///
/// Simulations check it between clock ticks and abort with
/// `BacktestError::Cancelled` once it is raised.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
