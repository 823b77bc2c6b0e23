//! Stack growth helpers.
//!
//! The parser recurses once per nested expression and the evaluator polls
//! one boxed future per nested call, so deeply nested scripts can exhaust a
//! thread stack long before the evaluator's call depth limit is reached.
//! Both paths go through this crate to grow the stack on demand.
//!
//! - **Native targets**: `stacker::maybe_grow` with a 128KB red zone.
//! - **WASM targets**: passthrough.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// If less than this remains, grow the stack.
const RED_ZONE: usize = 128 * 1024;

/// Size of each newly allocated stack segment.
const STACK_PER_RECURSION: usize = 2 * 1024 * 1024;

/// Run `f`, first growing the stack if the remaining space is below the red zone.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}

/// Future adapter that polls its inner future with [`ensure_sufficient_stack`].
///
/// Nested `async` calls poll each other recursively, so wrapping every call
/// boundary keeps the poll chain from overflowing.
pub struct GrowingStack<F> {
    inner: F,
}

impl<F> GrowingStack<F> {
    pub fn new(inner: F) -> Self {
        GrowingStack { inner }
    }
}

impl<F: Future + Unpin> Future for GrowingStack<F> {
    type Output = F::Output;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let inner = &mut self.inner;
        ensure_sufficient_stack(|| Pin::new(inner).poll(cx))
    }
}

/// Wrap `fut` so that each poll runs with sufficient stack.
#[inline]
pub fn grow_on_poll<F: Future + Unpin>(fut: F) -> GrowingStack<F> {
    GrowingStack::new(fut)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_returns_closure_result() {
        let result: Result<i32, &str> = ensure_sufficient_stack(|| Ok(123));
        assert_eq!(result, Ok(123));
    }

    #[test]
    fn test_deep_recursion() {
        fn depth(n: u64) -> u64 {
            ensure_sufficient_stack(|| if n == 0 { 0 } else { depth(n - 1) + 1 })
        }

        assert_eq!(depth(100_000), 100_000);
    }

    #[tokio::test]
    async fn test_deep_async_recursion() {
        fn count(n: u64) -> Pin<Box<dyn Future<Output = u64> + Send>> {
            Box::pin(async move {
                if n == 0 {
                    0
                } else {
                    grow_on_poll(count(n - 1)).await + 1
                }
            })
        }

        assert_eq!(count(20_000).await, 20_000);
    }
}
