//! Receive by sequence numbers, §4.6 row 2: a side-channel receive used to pull specific
//! messages (e.g. previously deferred ones) outside the normal credit-flow path.

use fe2o3_amqp_management::{request::Request, response::Response};
use fe2o3_amqp_types::messaging::Message;
use fe2o3_amqp_types::primitives::Value;

use crate::macros::log_warn;

use super::wire::{as_list, decode_embedded_message, map_of, value_as_lock_token};

const OPERATION: &str = "com.microsoft:receive-by-sequence-number";

/// Receives specific messages by their broker-assigned sequence number, bypassing prefetch.
#[derive(Debug, Clone)]
pub struct ReceiveBySequenceNumberRequest {
    /// Sequence numbers to fetch.
    pub sequence_numbers: Vec<i64>,
    /// `0` (first) or `1` (second), mirroring `ReceiverSettleMode` (§4.6).
    pub receiver_settle_mode: u8,
    /// Session to scope the request to, for session receivers.
    pub session_id: Option<String>,
}

impl Request for ReceiveBySequenceNumberRequest {
    const OPERATION: &'static str = OPERATION;
    type Response = ReceiveBySequenceNumberResponse;
    type Body = Value;

    fn encode_body(self) -> Self::Body {
        let sequence_numbers =
            Value::List(self.sequence_numbers.into_iter().map(Value::Long).collect());
        map_of(vec![
            ("sequence-numbers", Some(sequence_numbers)),
            (
                "receiver-settle-mode",
                Some(Value::UByte(self.receiver_settle_mode)),
            ),
            ("session-id", self.session_id.map(Value::String)),
        ])
    }
}

/// A message fetched by sequence number, paired with the lock token the broker assigned it.
#[derive(Debug, Clone)]
pub struct ReceivedMessage {
    /// Broker-assigned lock token for this specific message.
    pub lock_token: uuid::Uuid,
    /// The decoded message.
    pub message: Message<Value>,
}

/// Result of a [`ReceiveBySequenceNumberRequest`].
#[derive(Debug, Clone, Default)]
pub struct ReceiveBySequenceNumberResponse {
    /// Messages returned, in broker order.
    pub messages: Vec<ReceivedMessage>,
}

impl Response for ReceiveBySequenceNumberResponse {
    const STATUS_CODE: u16 = 200;
    type Body = Value;
    type Error = fe2o3_amqp_management::error::Error;

    fn decode_message(message: Message<Self::Body>) -> Result<Self, Self::Error> {
        let messages = as_list(message.body)
            .into_iter()
            .filter_map(|entry| match entry {
                Value::Map(fields) => {
                    let lock_token = fields
                        .as_inner()
                        .get(&Value::String("lock-token".to_string()))
                        .and_then(value_as_lock_token)?;
                    let bytes = match fields
                        .as_inner()
                        .get(&Value::String("message".to_string()))
                    {
                        Some(Value::Binary(bytes)) => bytes.clone(),
                        _ => {
                            log_warn!("receive-by-sequence-number entry missing a message blob");
                            return None;
                        }
                    };
                    let decoded = decode_embedded_message(&bytes)?;
                    Some(ReceivedMessage {
                        lock_token,
                        message: decoded,
                    })
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
    fn encodes_settle_mode_as_a_single_byte() {
        let request = ReceiveBySequenceNumberRequest {
            sequence_numbers: vec![1, 2, 3],
            receiver_settle_mode: 1,
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
        let response = ReceiveBySequenceNumberResponse::decode_message(message).unwrap();
        assert!(response.messages.is_empty());
    }
}
