//! Error context snapshot — the one piece of "metrics" §1 keeps explicitly in scope
//! ("metrics emission beyond an error-context snapshot" is a Non-goal, the snapshot itself
//! isn't).
//!
//! A small, cheaply-cloneable struct capturing the last link error, last management error, and
//! retry counters, exposed via [`crate::handle::ReceiverHandle::error_context`]. This replaces
//! the "global singleton logger/metrics" collaborators called out in §9 with an explicit,
//! injectable snapshot instead.

use fe2o3_amqp_types::definitions;
use parking_lot::Mutex;
use std::sync::Arc;

/// Point-in-time snapshot of the receiver's error and retry state.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The last error observed on the receive link, if any (§7 "remembered and returned as the
    /// cause of the next operation that fails on a closed link").
    pub last_link_error: Option<definitions::Error>,
    /// The last error returned by a management operation, if any.
    pub last_management_error: Option<String>,
    /// Number of link reattach attempts since the receiver was created.
    pub reattach_count: u32,
    /// Number of disposition retries performed since the receiver was created.
    pub disposition_retry_count: u32,
}

/// Shared, mutable handle to an [`ErrorContext`], updated by the reactor task and read by
/// `ReceiverHandle::error_context` from any thread.
#[derive(Debug, Clone, Default)]
pub struct ErrorContextHandle {
    inner: Arc<Mutex<ErrorContext>>,
}

impl ErrorContextHandle {
    /// Creates a fresh, empty context handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the current state.
    pub fn snapshot(&self) -> ErrorContext {
        self.inner.lock().clone()
    }

    /// Records the last observed link error.
    pub fn record_link_error(&self, error: definitions::Error) {
        self.inner.lock().last_link_error = Some(error);
    }

    /// Records the last observed management error.
    pub fn record_management_error(&self, error: impl std::fmt::Display) {
        self.inner.lock().last_management_error = Some(error.to_string());
    }

    /// Increments the reattach counter.
    pub fn record_reattach(&self) {
        self.inner.lock().reattach_count += 1;
    }

    /// Increments the disposition-retry counter.
    pub fn record_disposition_retry(&self) {
        self.inner.lock().disposition_retry_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use definitions::AmqpError;

    #[test]
    fn snapshot_reflects_recorded_state() {
        let ctx = ErrorContextHandle::new();
        ctx.record_reattach();
        ctx.record_reattach();
        ctx.record_link_error(definitions::Error::new(AmqpError::InternalError, None, None));

        let snapshot = ctx.snapshot();
        assert_eq!(snapshot.reattach_count, 2);
        assert!(snapshot.last_link_error.is_some());
    }
}
