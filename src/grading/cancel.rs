use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;

/// Cooperative cancellation flag shared between a run and its controller.
///
/// Runs check the flag between question batches; a batch already embedding is
/// allowed to finish.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation (idempotent).
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// A run stopped by its [`CancelHandle`]; its partial totals were discarded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("run cancelled after {processed_batches} of {total_batches} question batches")]
pub struct Cancelled {
    pub processed_batches: usize,
    pub total_batches: usize,
}
