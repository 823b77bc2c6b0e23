//! Cancellation signal and the per-call context threaded through every call.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

use crate::errors::{cancelled, stack_overflow, EvalResult};

/// Cooperative cancellation token. Clones share the signal.
#[derive(Clone, Default)]
pub struct Cancellation(Arc<CancelState>);

#[derive(Default)]
struct CancelState {
    cancelled: AtomicBool,
    notify: Notify,
}

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal cancellation. Idempotent.
    pub fn cancel(&self) {
        if !self.0.cancelled.swap(true, Ordering::AcqRel) {
            tracing::debug!("execution cancelled");
            self.0.notify.notify_waiters();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.cancelled.load(Ordering::Acquire)
    }

    /// Resolves once the signal fires.
    pub async fn cancelled(&self) {
        loop {
            let notified = self.0.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }

    /// Cancel after `delay` on the current tokio runtime.
    pub fn cancel_after(&self, delay: Duration) -> tokio::task::JoinHandle<()> {
        let token = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            token.cancel();
        })
    }
}

impl std::fmt::Debug for Cancellation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cancellation")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Context handed to every call: the execution's cancellation signal and
/// the current call depth.
#[derive(Clone, Debug)]
pub struct CallContext {
    cancellation: Cancellation,
    depth: usize,
    max_depth: usize,
}

impl CallContext {
    pub fn new(cancellation: Cancellation, max_depth: usize) -> Self {
        CallContext {
            cancellation,
            depth: 0,
            max_depth,
        }
    }

    pub fn cancellation(&self) -> &Cancellation {
        &self.cancellation
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// `Err(Cancelled)` once the signal has fired.
    #[inline]
    pub fn check_cancelled(&self) -> EvalResult<()> {
        if self.is_cancelled() {
            Err(cancelled())
        } else {
            Ok(())
        }
    }

    /// Context for a call one level deeper.
    pub(crate) fn nested(&self) -> EvalResult<CallContext> {
        if self.depth >= self.max_depth {
            return Err(stack_overflow(self.max_depth));
        }
        Ok(CallContext {
            cancellation: self.cancellation.clone(),
            depth: self.depth + 1,
            max_depth: self.max_depth,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn test_cancel_is_shared_between_clones() {
        let token = Cancellation::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_nested_depth_limit() {
        let cx = CallContext::new(Cancellation::new(), 2);
        let one = cx.nested().map(|c| c.depth());
        assert!(matches!(one, Ok(1)));
        let two = cx.nested().and_then(|c| c.nested());
        assert!(two.is_ok());
        let three = two.and_then(|c| c.nested());
        assert!(matches!(three, Err(e) if e.kind == ErrorKind::StackOverflow));
    }

    #[tokio::test]
    async fn test_cancelled_resolves_after_cancel() {
        let token = Cancellation::new();
        let waiter = {
            let token = token.clone();
            tokio::spawn(async move { token.cancelled().await })
        };
        tokio::task::yield_now().await;
        token.cancel();
        assert!(waiter.await.is_ok());
    }

    #[tokio::test]
    async fn test_cancel_after_fires() {
        let token = Cancellation::new();
        let handle = token.cancel_after(Duration::from_millis(5));
        token.cancelled().await;
        assert!(token.is_cancelled());
        assert!(handle.await.is_ok());
    }
}
