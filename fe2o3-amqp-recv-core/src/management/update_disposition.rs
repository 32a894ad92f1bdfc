//! Update disposition by lock token, §4.6 row 3. The non-session-filter companion to
//! [`crate::disposition::DispositionTracker`]: settles messages fetched via
//! [`super::receive_by_sequence::ReceiveBySequenceNumberRequest`] or peek-lock management calls
//! that never went through the normal credit-flow delivery path, so there is no delivery handle
//! to call `.disposition()` on directly.

use fe2o3_amqp_management::{request::Request, response::Response};
use fe2o3_amqp_types::messaging::Message;
use fe2o3_amqp_types::primitives::{OrderedMap, Value};

use super::wire::{lock_token_value, map_of};

const OPERATION: &str = "com.microsoft:update-disposition";

/// The target state requested for one or more lock-token-identified messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispositionStatus {
    /// Equivalent to an `accepted` outcome.
    Completed,
    /// Equivalent to a `modified` outcome without `undeliverable_here`.
    Abandoned,
    /// Equivalent to a `modified` outcome with `undeliverable_here = true`.
    Deferred,
    /// Moves the message(s) to the dead-letter queue.
    Suspended,
}

impl DispositionStatus {
    fn as_wire_str(self) -> &'static str {
        match self {
            DispositionStatus::Completed => "completed",
            DispositionStatus::Abandoned => "abandoned",
            DispositionStatus::Deferred => "deferred",
            DispositionStatus::Suspended => "suspended",
        }
    }
}

/// Settles one or more lock-token-identified messages via the management channel (§4.6 row 3).
#[derive(Debug, Clone)]
pub struct UpdateDispositionRequest {
    /// Lock tokens to settle.
    pub lock_tokens: Vec<uuid::Uuid>,
    /// Target disposition status.
    pub status: DispositionStatus,
    /// Dead-letter reason, only meaningful when `status` is `Suspended`.
    pub dead_letter_reason: Option<String>,
    /// Dead-letter description, only meaningful when `status` is `Suspended`.
    pub dead_letter_description: Option<String>,
    /// Extra properties merged into the message(s) on dead-letter.
    pub properties_to_modify: std::collections::HashMap<String, String>,
    /// Session to scope the call to, for session receivers.
    pub session_id: Option<String>,
}

impl Request for UpdateDispositionRequest {
    const OPERATION: &'static str = OPERATION;
    type Response = UpdateDispositionResponse;
    type Body = Value;

    fn encode_body(self) -> Self::Body {
        let tokens = Value::List(self.lock_tokens.into_iter().map(lock_token_value).collect());
        let properties_to_modify = if self.properties_to_modify.is_empty() {
            None
        } else {
            let mut map = OrderedMap::default();
            for (key, value) in self.properties_to_modify {
                map.insert(Value::String(key), Value::String(value));
            }
            Some(Value::Map(map))
        };
        map_of(vec![
            ("lock-tokens", Some(tokens)),
            (
                "disposition-status",
                Some(Value::String(self.status.as_wire_str().to_string())),
            ),
            ("dead-letter-reason", self.dead_letter_reason.map(Value::String)),
            (
                "dead-letter-description",
                self.dead_letter_description.map(Value::String),
            ),
            ("properties-to-modify", properties_to_modify),
            ("session-id", self.session_id.map(Value::String)),
        ])
    }
}

/// Status-only result of an [`UpdateDispositionRequest`] (§4.6: "status only").
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateDispositionResponse;

impl Response for UpdateDispositionResponse {
    const STATUS_CODE: u16 = 200;
    type Body = Value;
    type Error = fe2o3_amqp_management::error::Error;

    fn decode_message(_message: Message<Self::Body>) -> Result<Self, Self::Error> {
        Ok(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dead_letter_carries_reason_and_description() {
        let mut properties_to_modify = std::collections::HashMap::new();
        properties_to_modify.insert("x".to_string(), "1".to_string());
        let request = UpdateDispositionRequest {
            lock_tokens: vec![uuid::Uuid::nil()],
            status: DispositionStatus::Suspended,
            dead_letter_reason: Some("bad".to_string()),
            dead_letter_description: Some("schema".to_string()),
            properties_to_modify,
            session_id: None,
        };
        match request.encode_body() {
            Value::Map(map) => {
                assert_eq!(
                    map.as_inner()
                        .get(&Value::String("disposition-status".to_string())),
                    Some(&Value::String("suspended".to_string()))
                );
                assert!(map
                    .as_inner()
                    .contains_key(&Value::String("properties-to-modify".to_string())));
            }
            _ => panic!("expected a map body"),
        }
    }

    #[test]
    fn completed_omits_dead_letter_fields() {
        let request = UpdateDispositionRequest {
            lock_tokens: vec![uuid::Uuid::nil()],
            status: DispositionStatus::Completed,
            dead_letter_reason: None,
            dead_letter_description: None,
            properties_to_modify: Default::default(),
            session_id: None,
        };
        match request.encode_body() {
            Value::Map(map) => assert_eq!(map.as_inner().len(), 2),
            _ => panic!("expected a map body"),
        }
    }
}
