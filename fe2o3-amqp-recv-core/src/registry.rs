//! Delivery Registry (C2, §3 I1).
//!
//! Maps a delivery tag to the live [`fe2o3_amqp::link::delivery::Delivery`] handle so it can be
//! disposed once the application decides an outcome. Reactor-task-owned only (I6); settled or
//! auto-accepted (sender-settled) deliveries are never inserted.

use std::collections::HashMap;

use fe2o3_amqp::Delivery;
use fe2o3_amqp_types::{definitions::DeliveryTag, primitives::Value};

/// Map from delivery tag to the retained delivery handle awaiting disposition. `Delivery<Value>`
/// (not `Delivery<Body<Value>>`: the body section wrapper is already implicit in `Delivery`/
/// `Message`, so the type parameter names the unwrapped payload).
#[derive(Debug, Default)]
pub struct DeliveryRegistry {
    deliveries: HashMap<DeliveryTag, Delivery<Value>>,
}

impl DeliveryRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            deliveries: HashMap::new(),
        }
    }

    /// Records a newly received, not-yet-settled delivery.
    pub fn insert(&mut self, tag: DeliveryTag, delivery: Delivery<Value>) {
        self.deliveries.insert(tag, delivery);
    }

    /// Looks up the delivery for `tag` without removing it (used to issue a disposition while
    /// still tracking retries against the same handle, §5 "retry ... reusing the same delivery
    /// handle").
    pub fn get(&self, tag: &DeliveryTag) -> Option<&Delivery<Value>> {
        self.deliveries.get(tag)
    }

    /// Removes and returns the delivery for `tag`, called once settlement is final.
    pub fn remove(&mut self, tag: &DeliveryTag) -> Option<Delivery<Value>> {
        self.deliveries.remove(tag)
    }

    /// Whether `tag` is currently tracked.
    pub fn contains(&self, tag: &DeliveryTag) -> bool {
        self.deliveries.contains_key(tag)
    }

    /// Number of deliveries awaiting disposition.
    pub fn len(&self) -> usize {
        self.deliveries.len()
    }

    /// Whether the registry holds no deliveries.
    pub fn is_empty(&self) -> bool {
        self.deliveries.is_empty()
    }

    /// Drops all tracked deliveries; called when the receiver closes (§5 "clears the delivery
    /// registry").
    pub fn clear(&mut self) {
        self.deliveries.clear();
    }
}
