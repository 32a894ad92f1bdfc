//! Peek messages, §4.6 row 7. Browses messages starting from a sequence number without
//! acquiring a lock or consuming credit; the sole source of messages for a browsable (peek-mode)
//! session receiver (I4), and usable standalone for any receiver.

use fe2o3_amqp_management::{request::Request, response::Response};
use fe2o3_amqp_types::messaging::Message;
use fe2o3_amqp_types::primitives::Value;

use crate::macros::log_warn;

use super::wire::{as_list, decode_embedded_message, map_of};

const OPERATION: &str = "com.microsoft:peek-message";

/// Browses up to `message_count` messages starting at `from_sequence_number`, without locking
/// or consuming them.
#[derive(Debug, Clone)]
pub struct PeekMessagesRequest {
    /// Sequence number to start browsing from.
    pub from_sequence_number: i64,
    /// Maximum number of messages to return.
    pub message_count: i32,
    /// Session to scope the browse to, for session receivers.
    pub session_id: Option<String>,
}

impl Request for PeekMessagesRequest {
    const OPERATION: &'static str = OPERATION;
    type Response = PeekMessagesResponse;
    type Body = Value;

    fn encode_body(self) -> Self::Body {
        map_of(vec![
            (
                "from-sequence-number",
                Some(Value::Long(self.from_sequence_number)),
            ),
            ("message-count", Some(Value::Int(self.message_count))),
            ("session-id", self.session_id.map(Value::String)),
        ])
    }
}

/// A message returned by a peek, with no associated lock token (browsing never locks).
#[derive(Debug, Clone)]
pub struct PeekedMessage {
    /// The decoded message.
    pub message: Message<Value>,
}

/// Result of a [`PeekMessagesRequest`].
#[derive(Debug, Clone, Default)]
pub struct PeekMessagesResponse {
    /// Messages returned, in sequence-number order.
    pub messages: Vec<PeekedMessage>,
}

impl Response for PeekMessagesResponse {
    const STATUS_CODE: u16 = 200;
    type Body = Value;
    type Error = fe2o3_amqp_management::error::Error;

    fn decode_message(message: Message<Self::Body>) -> Result<Self, Self::Error> {
        let messages = as_list(message.body)
            .into_iter()
            .filter_map(|entry| match entry {
                Value::Map(fields) => {
                    let bytes = match fields
                        .as_inner()
                        .get(&Value::String("message".to_string()))
                    {
                        Some(Value::Binary(bytes)) => bytes.clone(),
                        _ => {
                            log_warn!("peek-message entry missing a message blob");
                            return None;
                        }
                    };
                    decode_embedded_message(&bytes).map(|message| PeekedMessage { message })
                }
                _ => None,
            })
            .collect();
        Ok(Self { messages })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_from_sequence_and_count() {
        let request = PeekMessagesRequest {
            from_sequence_number: 42,
            message_count: 10,
            session_id: None,
        };
        match request.encode_body() {
            Value::Map(map) => assert_eq!(map.as_inner().len(), 2),
            _ => panic!("expected a map body"),
        }
    }

    #[test]
    fn empty_response_decodes_to_no_messages() {
        let message = Message::builder().value(Value::List(vec![])).build();
        let response = PeekMessagesResponse::decode_message(message).unwrap();
        assert!(response.messages.is_empty());
    }
}
