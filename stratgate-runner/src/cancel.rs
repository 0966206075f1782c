//! Cooperative cancellation for gates that outlive their deadline.
//!
//! The orchestrator cannot kill a gate thread. Instead it hands every gate a
//! [`CancelToken`] and fires it once the deadline passes; long loops check the
//! token between iterations and bail out with [`ValidationError::Cancelled`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use stratgate_core::ValidationError;

#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every holder of this token to stop.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// `Err(Cancelled)` once the token has fired.
    pub fn check(&self) -> Result<(), ValidationError> {
        if self.is_cancelled() {
            Err(ValidationError::Cancelled)
        } else {
            Ok(())
        }
    }
}
