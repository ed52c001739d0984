//! Per-call deadline and cooperative cancellation.
//!
//! A [`CallContext`] travels with every summarization call. The calling thread
//! and the stream reader thread both observe it, so either side can notice an
//! expired deadline or an explicit [`CancelHandle::cancel`] and stop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::error::{CancelReason, SummarizeError};

/// A handle that can be used to request cancellation. Clones share one flag.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Calls observing this handle stop at their next
    /// check; an in-flight HTTP response is dropped once its reader notices.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Deadline plus cancellation flag for one call.
#[derive(Clone, Debug, Default)]
pub struct CallContext {
    cancel: CancelHandle,
    deadline: Option<Instant>,
}

impl CallContext {
    /// No deadline; only an explicit cancel stops the call.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        // Overflowing timeouts behave like no deadline at all.
        Self {
            cancel: CancelHandle::new(),
            deadline: Instant::now().checked_add(timeout),
        }
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            cancel: CancelHandle::new(),
            deadline: Some(deadline),
        }
    }

    /// Tie this context to an existing handle, e.g. one shared with a signal
    /// handler or a UI thread.
    pub fn cancelled_by(mut self, handle: CancelHandle) -> Self {
        self.cancel = handle;
        self
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Time left before the deadline, saturating at zero.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// `Err(Cancelled)` once the call should stop. Explicit cancellation wins
    /// over an elapsed deadline when both hold.
    pub fn check(&self) -> Result<(), SummarizeError> {
        if self.cancel.is_cancelled() {
            return Err(SummarizeError::Cancelled(CancelReason::Requested));
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                Err(SummarizeError::Cancelled(CancelReason::DeadlineExceeded))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_never_expires() {
        let ctx = CallContext::background();
        assert!(ctx.check().is_ok());
        assert_eq!(ctx.remaining(), None);
    }

    #[test]
    fn past_deadline_reports_deadline_exceeded() {
        let ctx = CallContext::with_deadline(Instant::now());
        match ctx.check() {
            Err(SummarizeError::Cancelled(CancelReason::DeadlineExceeded)) => {}
            other => panic!("expected deadline error, got {other:?}"),
        }
        assert_eq!(ctx.remaining(), Some(Duration::ZERO));
    }

    #[test]
    fn clones_share_the_cancel_flag() {
        let ctx = CallContext::with_timeout(Duration::from_secs(60));
        let observer = ctx.clone();
        ctx.cancel_handle().cancel();

        match observer.check() {
            Err(SummarizeError::Cancelled(CancelReason::Requested)) => {}
            other => panic!("expected requested cancellation, got {other:?}"),
        }
    }

    #[test]
    fn external_handle_controls_context() {
        let handle = CancelHandle::new();
        let ctx = CallContext::background().cancelled_by(handle.clone());
        assert!(ctx.check().is_ok());
        handle.cancel();
        assert!(ctx.check().is_err());
    }
}
