//! Cooperative cancellation shared by workers and subprocess runners.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Handle for cancelling an in-progress run.
///
/// Clones share the same flag. Nothing here installs signal handlers; the
/// binary wires interrupts to [`CancelToken::cancel`].
#[derive(Debug, Clone)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create a new cancel handle.
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    /// Signal cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Check if cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once the token has fired.
    pub fn check(&self) -> crate::Result<()> {
        if self.is_cancelled() {
            Err(crate::PagecastError::Cancelled)
        } else {
            Ok(())
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}
