//! Prefetch Queue (C1, §2/§4.3).
//!
//! FIFO buffer of messages that have finished receiving but have not yet been handed to a
//! caller. Reactor-task-owned only (I6).

use std::collections::VecDeque;

use fe2o3_amqp_types::{
    definitions::DeliveryTag, messaging::Message, primitives::Value,
};

/// A decoded message paired with its delivery tag, as it sits in the prefetch buffer. The body
/// type parameter is `Value` (not `Body<Value>`): `Message<T>::body` is already the `Body<T>`
/// wrapper, so `T` names the unwrapped section payload.
pub type PrefetchedMessage = (Message<Value>, DeliveryTag);

/// FIFO buffer of messages ready to be handed to a caller via `poll_prefetch` (§4.3).
#[derive(Debug, Default)]
pub struct PrefetchQueue {
    messages: VecDeque<PrefetchedMessage>,
}

impl PrefetchQueue {
    /// Creates an empty prefetch queue.
    pub fn new() -> Self {
        Self {
            messages: VecDeque::new(),
        }
    }

    /// Appends a newly received message to the back of the queue.
    pub fn push(&mut self, message: PrefetchedMessage) {
        self.messages.push_back(message);
    }

    /// Drains up to `n` messages from the front of the queue. Returns fewer than `n` (possibly
    /// zero) if the queue does not hold enough; partial batches are normal (§4.4 "Fairness").
    pub fn drain(&mut self, n: u32) -> Vec<PrefetchedMessage> {
        let count = (n as usize).min(self.messages.len());
        self.messages.drain(..count).collect()
    }

    /// Number of messages currently buffered.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the queue is currently empty.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fe2o3_amqp_types::messaging::Message;

    fn fake(tag: u8) -> PrefetchedMessage {
        (
            Message::builder().value(Value::Null).build(),
            DeliveryTag::from(vec![tag]),
        )
    }

    #[test]
    fn drains_in_fifo_order() {
        let mut queue = PrefetchQueue::new();
        queue.push(fake(1));
        queue.push(fake(2));
        queue.push(fake(3));

        let drained = queue.drain(2);
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].1, DeliveryTag::from(vec![1]));
        assert_eq!(drained[1].1, DeliveryTag::from(vec![2]));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn draining_more_than_available_returns_a_partial_batch() {
        let mut queue = PrefetchQueue::new();
        queue.push(fake(1));

        let drained = queue.drain(5);
        assert_eq!(drained.len(), 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn draining_an_empty_queue_is_a_no_op() {
        let mut queue = PrefetchQueue::new();
        assert!(queue.drain(10).is_empty());
    }
}
