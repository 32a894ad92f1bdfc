//! Receive-Request Queue (C4, §3, §4.4).
//!
//! Pending caller receive requests, served strictly FIFO (I5, P3): the earliest enqueued
//! request is the only one served when the next batch of messages arrives, even if that batch
//! is smaller than its `max_count` (partial batches are normal).

use std::{collections::VecDeque, time::Instant};

use tokio::{sync::oneshot, task::JoinHandle};

use crate::prefetch::PrefetchedMessage;

/// A pending `receive(max, timeout)` call waiting for messages to arrive or its deadline to
/// pass.
pub struct ReceiveWorkItem {
    id: u64,
    responder: oneshot::Sender<Vec<PrefetchedMessage>>,
    deadline: Instant,
    max_count: u32,
    /// Cancel handle for the timer task armed when this item was enqueued; aborted on
    /// completion so the timer does not fire against a stale queue slot.
    timer: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for ReceiveWorkItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReceiveWorkItem")
            .field("id", &self.id)
            .field("deadline", &self.deadline)
            .field("max_count", &self.max_count)
            .finish()
    }
}

impl ReceiveWorkItem {
    /// Wraps a pending receive request with its responder, deadline, and the timer that will
    /// expire it. `id` is a reactor-assigned sequence number used to find this item again when
    /// its timer fires (the timer itself cannot mutate the reactor-owned queue, per I6).
    pub fn new(
        id: u64,
        responder: oneshot::Sender<Vec<PrefetchedMessage>>,
        deadline: Instant,
        max_count: u32,
        timer: JoinHandle<()>,
    ) -> Self {
        Self {
            id,
            responder,
            deadline,
            max_count,
            timer: Some(timer),
        }
    }

    /// Reactor-assigned id, used to correlate a fired timeout timer back to this item.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Requested maximum batch size.
    pub fn max_count(&self) -> u32 {
        self.max_count
    }

    /// Deadline after which this item should be expired with an empty result.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Cancels the timeout timer and fulfills the promise with `messages` (possibly empty only
    /// if called from the timeout path itself).
    pub fn complete(mut self, messages: Vec<PrefetchedMessage>) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        let _ = self.responder.send(messages);
    }
}

/// FIFO queue of pending receive requests (I5).
#[derive(Debug, Default)]
pub struct ReceiveRequestQueue {
    items: VecDeque<ReceiveWorkItem>,
}

impl ReceiveRequestQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self {
            items: VecDeque::new(),
        }
    }

    /// Enqueues a new receive request at the back (arrives after any already-pending request).
    pub fn push(&mut self, item: ReceiveWorkItem) {
        self.items.push_back(item);
    }

    /// Removes and returns the head item, if any (P3: head is served first).
    pub fn pop_front(&mut self) -> Option<ReceiveWorkItem> {
        self.items.pop_front()
    }

    /// Removes and returns the item with the given `id`, if it is still queued. Used when its
    /// timeout timer fires; a miss means the item was already served or cancelled.
    pub fn remove_by_id(&mut self, id: u64) -> Option<ReceiveWorkItem> {
        let position = self.items.iter().position(|item| item.id == id)?;
        self.items.remove(position)
    }

    /// Removes every item whose deadline is at or before `now`, returning them for the caller
    /// to complete with an empty result. Used by both the synchronous timer path and as a
    /// defensive sweep.
    pub fn drain_expired(&mut self, now: Instant) -> Vec<ReceiveWorkItem> {
        let mut expired = Vec::new();
        let mut remaining = VecDeque::with_capacity(self.items.len());
        for item in self.items.drain(..) {
            if item.deadline <= now {
                expired.push(item);
            } else {
                remaining.push_back(item);
            }
        }
        self.items = remaining;
        expired
    }

    /// Removes every pending item and returns them, used on receiver close (§5 "close cancels
    /// all pending receives").
    pub fn drain_all(&mut self) -> Vec<ReceiveWorkItem> {
        self.items.drain(..).collect()
    }

    /// Number of requests currently queued.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the queue holds no pending requests.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn work_item() -> (ReceiveWorkItem, oneshot::Receiver<Vec<PrefetchedMessage>>) {
        let (tx, rx) = oneshot::channel();
        let timer = tokio::spawn(async {});
        (
            ReceiveWorkItem::new(1, tx, Instant::now() + Duration::from_secs(30), 10, timer),
            rx,
        )
    }

    #[tokio::test]
    async fn fifo_order_is_preserved() {
        let mut queue = ReceiveRequestQueue::new();
        let (first, _first_rx) = work_item();
        let (second, _second_rx) = work_item();
        queue.push(first);
        queue.push(second);

        assert_eq!(queue.pop_front().unwrap().max_count(), 10);
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test]
    async fn complete_fulfills_the_responder_and_cancels_the_timer() {
        let (item, rx) = work_item();
        item.complete(vec![]);
        let result = rx.await.unwrap();
        assert!(result.is_empty());
    }
}
