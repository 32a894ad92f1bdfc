//! Renew locks (by lock token), §4.6 row 1.

use chrono::{DateTime, Utc};
use fe2o3_amqp_management::{request::Request, response::Response};
use fe2o3_amqp_types::messaging::Message;
use fe2o3_amqp_types::primitives::Value;

use crate::filters::ticks_to_utc;

use super::wire::{as_list, lock_token_value, map_of};

const OPERATION: &str = "com.microsoft:renew-lock";

/// Renews the peek-lock on one or more messages identified by lock token.
#[derive(Debug, Clone)]
pub struct RenewLockRequest {
    /// Lock tokens to renew.
    pub lock_tokens: Vec<uuid::Uuid>,
    /// Session to scope the renewal to, for session receivers.
    pub session_id: Option<String>,
}

impl Request for RenewLockRequest {
    const OPERATION: &'static str = OPERATION;
    type Response = RenewLockResponse;
    type Body = Value;

    fn encode_body(self) -> Self::Body {
        let tokens = Value::List(self.lock_tokens.into_iter().map(lock_token_value).collect());
        map_of(vec![
            ("lock-tokens", Some(tokens)),
            ("session-id", self.session_id.map(Value::String)),
        ])
    }
}

/// New expiration instants for each renewed lock, in request order.
#[derive(Debug, Clone)]
pub struct RenewLockResponse {
    /// Updated lock expirations, one per requested token.
    pub expirations: Vec<DateTime<Utc>>,
}

impl Response for RenewLockResponse {
    const STATUS_CODE: u16 = 200;
    type Body = Value;
    type Error = fe2o3_amqp_management::error::Error;

    fn decode_message(message: Message<Self::Body>) -> Result<Self, Self::Error> {
        let expirations = as_list(message.body)
            .into_iter()
            .filter_map(|value| match value {
                Value::Long(ticks) => Some(ticks_to_utc(ticks)),
                Value::ULong(ticks) => Some(ticks_to_utc(ticks as i64)),
                _ => None,
            })
            .collect();
        Ok(Self { expirations })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_tokens_and_session_id() {
        let request = RenewLockRequest {
            lock_tokens: vec![uuid::Uuid::nil()],
            session_id: Some("s1".to_string()),
        };
        match request.encode_body() {
            Value::Map(map) => assert_eq!(map.as_inner().len(), 2),
            _ => panic!("expected a map body"),
        }
    }
}
