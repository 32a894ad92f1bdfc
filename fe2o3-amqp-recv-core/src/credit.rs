//! Credit Controller (C3, §4.2).
//!
//! Batches flow grants so the link issues one `flow` frame per batch instead of one per
//! message. Reactor-task-owned only (I6): nothing here is `Send`-shared, the controller lives
//! inside [`crate::reactor`]'s receiver state.

use std::sync::{atomic::{AtomicU32, Ordering}, Arc};

use crate::macros::log_debug;

/// Thread-safe mirror of the steady-state prefetch target, read synchronously by
/// [`crate::handle::ReceiverHandle::receive`] to validate `0 < max <= prefetch_count` before
/// ever reaching the reactor task (§4.4, §5 "prefetch_count under a short critical section").
/// The [`CreditController`] itself stays reactor-task-exclusive; this is a separate, cheap
/// snapshot kept in sync by whoever calls [`CreditController::set_prefetch_count`].
#[derive(Debug, Clone)]
pub struct PrefetchCountHandle {
    inner: Arc<AtomicU32>,
}

impl PrefetchCountHandle {
    /// Creates a handle seeded with the initial prefetch target.
    pub fn new(initial: u32) -> Self {
        Self {
            inner: Arc::new(AtomicU32::new(initial)),
        }
    }

    /// Current prefetch target, read with `Relaxed` ordering: this is a best-effort
    /// synchronous validation aid, not a source of truth the reactor itself depends on.
    pub fn get(&self) -> u32 {
        self.inner.load(Ordering::Relaxed)
    }

    /// Updates the mirrored value; called by the reactor task right after
    /// [`CreditController::set_prefetch_count`] changes the authoritative value.
    pub fn set(&self, value: u32) {
        self.inner.store(value, Ordering::Relaxed);
    }
}

/// Accumulates credit to flow and decides when to flush it to the link.
#[derive(Debug)]
pub struct CreditController {
    /// Total credits the application wants outstanding at the broker.
    prefetch_count: u32,
    /// Credits accumulated since the last flush.
    next_credit_to_flow: u32,
    /// Browsable (peek-only) sessions never issue credit (I4).
    browsable: bool,
}

/// What the caller of [`CreditController::enqueue`]/[`CreditController::set_prefetch_count`]
/// must actually do as a consequence — issuing the `flow` frame touches the link and must
/// happen on the reactor task, so the controller only returns *what* to flow, not how.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowInstruction {
    /// Net credit delta to add via `Receiver::set_credit`. May be negative in spirit (a shrink),
    /// but the link clamps the actual outstanding credit to `>= 0`, so this is always issued as
    /// `u32` alongside a `subtract` flag.
    pub amount: u32,
    /// Whether `amount` should be subtracted from outstanding credit rather than added.
    pub subtract: bool,
}

impl CreditController {
    /// Creates a controller for the given steady-state prefetch target.
    pub fn new(prefetch_count: u32, browsable: bool) -> Self {
        Self {
            prefetch_count,
            next_credit_to_flow: 0,
            browsable,
        }
    }

    /// Batching threshold mirrors spec.md §4.2 verbatim: flush at `>= prefetch_count` or
    /// `>= 100`, whichever is smaller in practice.
    fn flush_threshold(&self) -> u32 {
        self.prefetch_count.min(100)
    }

    /// Accumulates `credits` additional credit and returns a flow instruction if the batch
    /// should be flushed now.
    pub fn enqueue(&mut self, credits: u32) -> Option<FlowInstruction> {
        if self.browsable || credits == 0 {
            return None;
        }
        self.next_credit_to_flow = self.next_credit_to_flow.saturating_add(credits);
        if self.next_credit_to_flow >= self.prefetch_count || self.next_credit_to_flow >= 100 {
            let amount = self.next_credit_to_flow;
            self.next_credit_to_flow = 0;
            log_debug!("flushing accumulated receive credit: {amount}");
            return Some(FlowInstruction {
                amount,
                subtract: false,
            });
        }
        None
    }

    /// Forces whatever has accumulated so far out immediately, regardless of the batching
    /// threshold. Used when the link just (re)opened and the whole prefetch window needs to be
    /// granted up front (§4.1 "On OPEN ... immediately issue credit").
    pub fn flush(&mut self) -> Option<FlowInstruction> {
        if self.browsable || self.next_credit_to_flow == 0 {
            return None;
        }
        let amount = self.next_credit_to_flow;
        self.next_credit_to_flow = 0;
        Some(FlowInstruction {
            amount,
            subtract: false,
        })
    }

    /// Changes the steady-state prefetch target, returning the flow instruction needed to
    /// reconcile outstanding credit with the new target (§4.2 `set_prefetch_count`).
    ///
    /// A shrink (`new < old`) is issued as a negative delta to the same accumulator; the broker
    /// clamps to `>= 0` so over-shrinking below zero outstanding credit is harmless.
    pub fn set_prefetch_count(&mut self, new: u32) -> Option<FlowInstruction> {
        if self.prefetch_count == new {
            return None;
        }
        let old = self.prefetch_count;
        self.prefetch_count = new;
        if self.browsable {
            return None;
        }
        if new > old {
            Some(FlowInstruction {
                amount: new - old,
                subtract: false,
            })
        } else {
            Some(FlowInstruction {
                amount: old - new,
                subtract: true,
            })
        }
    }

    /// Current steady-state prefetch target.
    pub fn prefetch_count(&self) -> u32 {
        self.prefetch_count
    }

    /// Whether this controller is pinned to no-credit (browsable session) mode.
    pub fn is_browsable(&self) -> bool {
        self.browsable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flushes_at_prefetch_count() {
        let mut credit = CreditController::new(10, false);
        assert!(credit.enqueue(9).is_none());
        let flow = credit.enqueue(1).unwrap();
        assert_eq!(flow.amount, 10);
        assert!(!flow.subtract);
    }

    #[test]
    fn flushes_at_the_chattiness_cap_even_with_a_larger_prefetch() {
        let mut credit = CreditController::new(1000, false);
        for _ in 0..99 {
            assert!(credit.enqueue(1).is_none());
        }
        let flow = credit.enqueue(1).unwrap();
        assert_eq!(flow.amount, 100);
    }

    #[test]
    fn browsable_never_flows_credit() {
        let mut credit = CreditController::new(10, true);
        assert!(credit.enqueue(10).is_none());
        assert!(credit.flush().is_none());
    }

    #[test]
    fn shrinking_prefetch_issues_a_subtractive_delta() {
        let mut credit = CreditController::new(50, false);
        let flow = credit.set_prefetch_count(10).unwrap();
        assert_eq!(flow.amount, 40);
        assert!(flow.subtract);
    }

    #[test]
    fn growing_prefetch_issues_an_additive_delta() {
        let mut credit = CreditController::new(10, false);
        let flow = credit.set_prefetch_count(50).unwrap();
        assert_eq!(flow.amount, 40);
        assert!(!flow.subtract);
    }

    #[test]
    fn unchanged_prefetch_is_a_no_op() {
        let mut credit = CreditController::new(10, false);
        assert!(credit.set_prefetch_count(10).is_none());
    }
}
