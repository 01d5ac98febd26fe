//! Cooperative cancellation shared between a running batch and whoever
//! wants to stop it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Clonable cancellation flag.
///
/// Loops check it at iteration boundaries only; work already handed to the
/// backend runs to completion.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Check if cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Reset the flag (call before starting a new batch)
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
