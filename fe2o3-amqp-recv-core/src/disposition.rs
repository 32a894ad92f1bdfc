//! Disposition Tracker (C5, §3, §4.5) and Timeout Reaper (C10).
//!
//! The only structure touched from both the reactor task and an independent timer task (I6),
//! hence the `parking_lot::Mutex` rather than reactor-exclusive ownership like the other
//! queues. One entry per delivery tag currently being settled (I2); completed when a matching
//! terminal remote outcome arrives, retried on a retryable rejection, failed on timeout.

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use fe2o3_amqp_types::{definitions, definitions::DeliveryTag};
use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::{error::DispositionError, macros::log_warn, IntendedOutcome};

/// A single in-flight settlement request.
pub struct UpdateStateWorkItem {
    responder: oneshot::Sender<Result<(), DispositionError>>,
    intended: IntendedOutcome,
    deadline: Instant,
    attempt: u32,
    last_error: Option<definitions::Error>,
}

impl UpdateStateWorkItem {
    /// Begins tracking a new settlement request.
    pub fn new(
        responder: oneshot::Sender<Result<(), DispositionError>>,
        intended: IntendedOutcome,
        deadline: Instant,
    ) -> Self {
        Self {
            responder,
            intended,
            deadline,
            attempt: 0,
            last_error: None,
        }
    }

    /// The outcome the application originally asked for.
    pub fn intended(&self) -> &IntendedOutcome {
        &self.intended
    }

    /// Current retry attempt number (0-indexed).
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Deadline after which this item should be failed if still pending.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Records a retryable failure observed for this attempt, for use as the timeout cause if
    /// the deadline is reached before a future retry succeeds.
    pub fn record_retry(&mut self, error: definitions::Error) {
        self.last_error = Some(error);
        self.attempt += 1;
    }

    /// Completes the work item successfully.
    pub fn succeed(self) {
        let _ = self.responder.send(Ok(()));
    }

    /// Completes the work item with an error, e.g. a fatal broker outcome or a released
    /// delivery.
    pub fn fail(self, error: DispositionError) {
        let _ = self.responder.send(Err(error));
    }

    /// Completes the work item on timeout, using the last seen error as cause if one was
    /// recorded, else a generic timeout (P6, §4.5).
    pub fn timeout(self) {
        let message = match self.last_error {
            Some(error) => format!("last broker error before timeout: {error:?}"),
            None => "no broker response before deadline".to_string(),
        };
        let _ = self.responder.send(Err(DispositionError::Timeout(message)));
    }
}

/// Thread-safe map of delivery tag to in-flight disposition, shared between the reactor task
/// and the [`reap`] sweep.
#[derive(Clone, Default)]
pub struct DispositionTracker {
    inner: Arc<Mutex<HashMap<DeliveryTag, UpdateStateWorkItem>>>,
}

impl std::fmt::Debug for DispositionTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispositionTracker")
            .field("in_flight", &self.inner.lock().len())
            .finish()
    }
}

impl DispositionTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Begins tracking `item` for `tag`. Fails with [`DispositionError::AlreadyInFlight`] if a
    /// disposition is already outstanding for this tag (I2).
    pub fn begin(&self, tag: DeliveryTag, item: UpdateStateWorkItem) -> Result<(), UpdateStateWorkItem> {
        let mut guard = self.inner.lock();
        if guard.contains_key(&tag) {
            return Err(item);
        }
        guard.insert(tag, item);
        Ok(())
    }

    /// Removes and returns the in-flight item for `tag`, if any (called when a matching
    /// terminal remote outcome arrives, §4.3).
    pub fn remove(&self, tag: &DeliveryTag) -> Option<UpdateStateWorkItem> {
        self.inner.lock().remove(tag)
    }

    /// Records a retryable failure against `tag`'s in-flight item in place, returning the
    /// updated attempt count, or `None` if the tag is no longer tracked.
    pub fn record_retry(&self, tag: &DeliveryTag, error: definitions::Error) -> Option<u32> {
        let mut guard = self.inner.lock();
        let item = guard.get_mut(tag)?;
        item.record_retry(error);
        Some(item.attempt())
    }

    /// Whether `tag` currently has an in-flight disposition.
    pub fn contains(&self, tag: &DeliveryTag) -> bool {
        self.inner.lock().contains_key(tag)
    }

    /// The original deadline recorded for `tag`'s in-flight item, if still tracked. Used when
    /// scheduling a retry so the retry carries the same deadline rather than a fresh one.
    pub fn deadline_of(&self, tag: &DeliveryTag) -> Option<Instant> {
        self.inner.lock().get(tag).map(|item| item.deadline())
    }

    /// Number of in-flight dispositions.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Removes every tag whose deadline has passed at `now`, returning them for the caller to
    /// fail via [`UpdateStateWorkItem::timeout`].
    pub fn reap_expired(&self, now: Instant) -> Vec<(DeliveryTag, UpdateStateWorkItem)> {
        let mut guard = self.inner.lock();
        let expired_tags: Vec<DeliveryTag> = guard
            .iter()
            .filter(|(_, item)| item.deadline <= now)
            .map(|(tag, _)| tag.clone())
            .collect();
        expired_tags
            .into_iter()
            .filter_map(|tag| guard.remove(&tag).map(|item| (tag, item)))
            .collect()
    }

    /// Removes every in-flight item and returns them, used on receiver close (§5 "fails all
    /// pending dispositions").
    pub fn drain_all(&self) -> Vec<(DeliveryTag, UpdateStateWorkItem)> {
        self.inner.lock().drain().collect()
    }
}

/// Spawns the periodic sweep described in §4.5: once per second, fail every disposition whose
/// deadline has passed. Runs as an independent tokio task alongside the reactor task; stops
/// automatically once `tracker` has no other handles (weak upgrade fails).
pub fn spawn_reaper(tracker: DispositionTracker) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        loop {
            interval.tick().await;
            let now = Instant::now();
            let expired = tracker.reap_expired(now);
            for (tag, item) in expired {
                log_warn!("disposition timed out, reaping tag={:?}", tag);
                item.timeout();
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use definitions::AmqpError;

    fn tag(n: u8) -> DeliveryTag {
        DeliveryTag::from(vec![n])
    }

    #[tokio::test]
    async fn at_most_one_in_flight_per_tag() {
        let tracker = DispositionTracker::new();
        let (tx1, _rx1) = oneshot::channel();
        let (tx2, _rx2) = oneshot::channel();
        let deadline = Instant::now() + Duration::from_secs(30);

        let item1 = UpdateStateWorkItem::new(tx1, IntendedOutcome::Complete, deadline);
        assert!(tracker.begin(tag(1), item1).is_ok());

        let item2 = UpdateStateWorkItem::new(tx2, IntendedOutcome::Complete, deadline);
        assert!(tracker.begin(tag(1), item2).is_err());
    }

    #[tokio::test]
    async fn expired_items_are_reaped_with_last_error() {
        let tracker = DispositionTracker::new();
        let (tx, rx) = oneshot::channel();
        let past_deadline = Instant::now() - Duration::from_millis(1);
        let item = UpdateStateWorkItem::new(tx, IntendedOutcome::Complete, past_deadline);
        tracker.begin(tag(7), item).unwrap();
        tracker.record_retry(&tag(7), definitions::Error::new(AmqpError::InternalError, None, None));

        let expired = tracker.reap_expired(Instant::now());
        assert_eq!(expired.len(), 1);
        expired.into_iter().for_each(|(_, item)| item.timeout());

        let result = rx.await.unwrap();
        assert!(matches!(result, Err(DispositionError::Timeout(_))));
    }

    #[tokio::test]
    async fn reap_leaves_unexpired_items_untouched() {
        let tracker = DispositionTracker::new();
        let (tx, _rx) = oneshot::channel();
        let future_deadline = Instant::now() + Duration::from_secs(60);
        let item = UpdateStateWorkItem::new(tx, IntendedOutcome::Complete, future_deadline);
        tracker.begin(tag(9), item).unwrap();

        assert!(tracker.reap_expired(Instant::now()).is_empty());
        assert!(tracker.contains(&tag(9)));
    }
}
