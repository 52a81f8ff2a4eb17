//! Cooperative cancellation for read calls.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cancellation token polled between records during a read call.
///
/// Clones share one flag; cancelling any clone cancels them all. The
/// executor polls at file open/close boundaries and before each decode, so
/// cancellation is observed within one record's worth of work.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Readers observe it at the next record boundary.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}
