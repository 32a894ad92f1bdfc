//! Renew session lock, §4.6 row 4. Distinct from [`super::renew_locks`] (which renews
//! message-level peek-locks by lock token): this renews the session-level exclusive lock a
//! session receiver holds on its `session_id`, and its response feeds back into
//! [`crate::session::SessionFacet::set_session_locked_until`].

use chrono::{DateTime, Utc};
use fe2o3_amqp_management::{request::Request, response::Response};
use fe2o3_amqp_types::messaging::Message;
use fe2o3_amqp_types::primitives::Value;

use crate::filters::ticks_to_utc;

use super::wire::{as_map, map_of};

const OPERATION: &str = "com.microsoft:renew-session-lock";

/// Renews the exclusive session-level lock held by a session receiver.
#[derive(Debug, Clone)]
pub struct RenewSessionLockRequest {
    /// The session id whose lock should be renewed.
    pub session_id: String,
}

impl Request for RenewSessionLockRequest {
    const OPERATION: &'static str = OPERATION;
    type Response = RenewSessionLockResponse;
    type Body = Value;

    fn encode_body(self) -> Self::Body {
        map_of(vec![("session-id", Some(Value::String(self.session_id)))])
    }
}

/// New expiration instant for the session lock.
#[derive(Debug, Clone)]
pub struct RenewSessionLockResponse {
    /// The broker's new lock expiration for the session.
    pub expiration: DateTime<Utc>,
}

impl Response for RenewSessionLockResponse {
    const STATUS_CODE: u16 = 200;
    type Body = Value;
    type Error = fe2o3_amqp_management::error::Error;

    fn decode_message(message: Message<Self::Body>) -> Result<Self, Self::Error> {
        let map = as_map(message.body);
        let expiration = match map.get(&Value::String("expiration".to_string())) {
            Some(Value::Long(ticks)) => ticks_to_utc(*ticks),
            Some(Value::ULong(ticks)) => ticks_to_utc(*ticks as i64),
            _ => crate::filters::unknown_lock_expiry(),
        };
        Ok(Self { expiration })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_session_id() {
        let request = RenewSessionLockRequest {
            session_id: "s1".to_string(),
        };
        match request.encode_body() {
            Value::Map(map) => assert_eq!(map.as_inner().len(), 1),
            _ => panic!("expected a map body"),
        }
    }

    #[test]
    fn missing_expiration_falls_back_to_unknown() {
        let message = Message::builder().value(Value::Map(Default::default())).build();
        let response = RenewSessionLockResponse::decode_message(message).unwrap();
        assert_eq!(response.expiration, crate::filters::unknown_lock_expiry());
    }
}
