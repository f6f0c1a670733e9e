//! Cooperative cancellation
//!
//! Long loops (per scan line, per component, per candidate angle) call
//! [`CancelToken::check`] and bail out with [`Error::Cancelled`]. The token
//! is cheap to clone; clones share the same flag.

use crate::error::{Error, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

#[derive(Debug, Default)]
struct CancelState {
    cancelled: AtomicBool,
    /// Remaining polls before the token trips by itself; 0 = disarmed
    countdown: AtomicUsize,
}

/// Shared cancellation flag.
///
/// [`CancelToken::none`] never cancels and costs nothing to poll.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    state: Option<Arc<CancelState>>,
}

impl CancelToken {
    /// A token that can be cancelled through any of its clones.
    pub fn new() -> Self {
        Self {
            state: Some(Arc::new(CancelState::default())),
        }
    }

    /// A token that never cancels.
    pub fn none() -> Self {
        Self { state: None }
    }

    /// A token that cancels itself on the `polls`-th call to [`check`](Self::check).
    ///
    /// Lets tests interrupt an operation at a deterministic point.
    pub fn trip_after(polls: usize) -> Self {
        let state = CancelState {
            cancelled: AtomicBool::new(polls == 0),
            countdown: AtomicUsize::new(polls),
        };
        Self {
            state: Some(Arc::new(state)),
        }
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        if let Some(state) = &self.state {
            state.cancelled.store(true, Ordering::Release);
        }
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.state
            .as_ref()
            .is_some_and(|s| s.cancelled.load(Ordering::Acquire))
    }

    /// Poll the token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] once cancellation has been requested.
    #[inline]
    pub fn check(&self) -> Result<()> {
        let Some(state) = &self.state else {
            return Ok(());
        };
        let armed = state
            .countdown
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .ok();
        if armed == Some(1) {
            state.cancelled.store(true, Ordering::Release);
        }
        if state.cancelled.load(Ordering::Acquire) {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_never_cancels() {
        let token = CancelToken::none();
        token.cancel();
        assert!(token.check().is_ok());
        assert!(!token.is_cancelled());
    }

    #[test]
    fn test_clones_share_flag() {
        let token = CancelToken::new();
        let other = token.clone();
        assert!(token.check().is_ok());
        other.cancel();
        assert!(matches!(token.check(), Err(Error::Cancelled)));
    }

    #[test]
    fn test_trip_after() {
        let token = CancelToken::trip_after(3);
        assert!(token.check().is_ok());
        assert!(token.check().is_ok());
        assert!(token.check().is_err());
        assert!(token.check().is_err());
        assert!(token.is_cancelled());
    }
}
