//! Retry policy injected into the Disposition Tracker (§4.5, §9) and the Link Lifecycle
//! Manager (§4.1).
//!
//! The source client hard-coded its backoff; spec.md §9 calls that out as a "global singleton"
//! that should become an injected collaborator. `RetryPolicy` is that seam: a default
//! exponential-with-jitter implementation ships, but anything implementing the trait can be
//! substituted (fixed network conditions in tests, a no-retry policy, etc).

use std::time::Duration;

use fe2o3_amqp_types::definitions;

/// Classifies an error and, if retryable, says how long to wait before trying again.
///
/// Returns `None` when the error is not retryable (fatal), or when the retry budget
/// (attempt count) has been exhausted.
pub trait RetryPolicy: Send + Sync + std::fmt::Debug {
    /// Decide whether `attempt` (0-indexed) should retry after `error`, and if so, the delay.
    fn retry_interval(&self, error: &definitions::Error, attempt: u32) -> Option<Duration>;

    /// Decide whether a transient link error should trigger a link reattach, and if so, after
    /// what delay.
    fn reattach_interval(&self, attempt: u32) -> Option<Duration>;
}

/// Exponential backoff with jitter, capped at a maximum delay and a maximum attempt count.
///
/// This is the default policy; `fe2o3-amqp`'s own reconnect logic (outside the scope of this
/// crate per §1) uses a comparable shape, so receivers built on top of it see consistent
/// backoff behavior end to end.
#[derive(Debug, Clone)]
pub struct FixedJitterBackoff {
    /// Base delay for the first retry.
    pub base: Duration,
    /// Upper bound on any single delay.
    pub max: Duration,
    /// Maximum number of attempts before giving up (retry budget, P6).
    pub max_attempts: u32,
}

impl Default for FixedJitterBackoff {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(800),
            max: Duration::from_secs(30),
            max_attempts: 5,
        }
    }
}

impl FixedJitterBackoff {
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exp = self.base.as_millis().saturating_mul(1u128 << attempt.min(16));
        let capped = exp.min(self.max.as_millis());
        // Deterministic "jitter": spread the delay within [50%, 100%] of the capped value based
        // on the attempt number, avoiding a dependency on a random source for this scheduling
        // decision.
        let jittered = capped - (capped / 2) * (1 - (attempt % 2) as u128);
        Duration::from_millis(jittered.max(1) as u64)
    }
}

impl RetryPolicy for FixedJitterBackoff {
    fn retry_interval(&self, error: &definitions::Error, attempt: u32) -> Option<Duration> {
        if !is_retryable_condition(error) || attempt >= self.max_attempts {
            return None;
        }
        Some(self.delay_for_attempt(attempt))
    }

    fn reattach_interval(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        Some(self.delay_for_attempt(attempt))
    }
}

/// Broker conditions considered retryable: server busy, timeout, and transient resource
/// exhaustion. Anything else (e.g. unauthorized, not-found) is fatal.
///
/// Error-condition classification is explicitly an external collaborator in §1 ("retry policy,
/// error taxonomy classification ... the outer factory that owns the transport"); this default
/// looks only at the condition's rendered name rather than depending on transport-internal
/// struct layout, so a classifying `RetryPolicy` can be swapped in without coupling to it.
fn is_retryable_condition(error: &definitions::Error) -> bool {
    const RETRYABLE_MARKERS: &[&str] = &[
        "resourcelimitexceeded",
        "illegalstate",
        "server-busy",
        "timeout",
    ];
    let rendered = format!("{error:?}").to_ascii_lowercase();
    RETRYABLE_MARKERS.iter().any(|marker| rendered.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fe2o3_amqp_types::definitions::{AmqpError, Error};

    #[test]
    fn retryable_condition_gets_an_interval() {
        let policy = FixedJitterBackoff::default();
        let err = Error::new(AmqpError::ResourceLimitExceeded, None, None);
        assert!(policy.retry_interval(&err, 0).is_some());
    }

    #[test]
    fn fatal_condition_never_retries() {
        let policy = FixedJitterBackoff::default();
        let err = Error::new(AmqpError::NotFound, None, None);
        assert!(policy.retry_interval(&err, 0).is_none());
    }

    #[test]
    fn retry_budget_is_exhausted_eventually() {
        let policy = FixedJitterBackoff::default();
        let err = Error::new(AmqpError::ResourceLimitExceeded, None, None);
        assert!(policy.retry_interval(&err, policy.max_attempts).is_none());
    }

    #[test]
    fn delay_grows_and_is_capped() {
        let policy = FixedJitterBackoff {
            base: Duration::from_millis(100),
            max: Duration::from_millis(500),
            max_attempts: 10,
        };
        let short = policy.delay_for_attempt(0);
        let long = policy.delay_for_attempt(10);
        assert!(long <= policy.max);
        assert!(short <= long);
    }
}
