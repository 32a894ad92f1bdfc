//! Get/set session state, §4.6 rows 5 and 6. Session state is an opaque, application-defined
//! binary blob the broker stores alongside a session, independent of any message; `None`
//! means "no state set" on both the read and write sides.

use fe2o3_amqp_management::{request::Request, response::Response};
use fe2o3_amqp_types::messaging::Message;
use fe2o3_amqp_types::primitives::Value;

use super::wire::{as_map, map_of};

const GET_OPERATION: &str = "com.microsoft:get-session-state";
const SET_OPERATION: &str = "com.microsoft:set-session-state";

/// Reads the opaque application-defined state blob stored for a session.
#[derive(Debug, Clone)]
pub struct GetSessionStateRequest {
    /// The session to read state for.
    pub session_id: String,
}

impl Request for GetSessionStateRequest {
    const OPERATION: &'static str = GET_OPERATION;
    type Response = GetSessionStateResponse;
    type Body = Value;

    fn encode_body(self) -> Self::Body {
        map_of(vec![("session-id", Some(Value::String(self.session_id)))])
    }
}

/// The session's current state, or `None` if no state has ever been set.
#[derive(Debug, Clone, Default)]
pub struct GetSessionStateResponse {
    /// Raw state bytes, if any.
    pub state: Option<Vec<u8>>,
}

impl Response for GetSessionStateResponse {
    const STATUS_CODE: u16 = 200;
    type Body = Value;
    type Error = fe2o3_amqp_management::error::Error;

    fn decode_message(message: Message<Self::Body>) -> Result<Self, Self::Error> {
        let map = as_map(message.body);
        let state = match map.get(&Value::String("session-state".to_string())) {
            Some(Value::Binary(bytes)) => Some(bytes.clone().into_vec()),
            _ => None,
        };
        Ok(Self { state })
    }
}

/// Overwrites the opaque application-defined state blob stored for a session. Passing `None`
/// clears it.
#[derive(Debug, Clone)]
pub struct SetSessionStateRequest {
    /// The session to write state for.
    pub session_id: String,
    /// New state bytes, or `None` to clear.
    pub state: Option<Vec<u8>>,
}

impl Request for SetSessionStateRequest {
    const OPERATION: &'static str = SET_OPERATION;
    type Response = SetSessionStateResponse;
    type Body = Value;

    fn encode_body(self) -> Self::Body {
        let state = self
            .state
            .map(|bytes| Value::Binary(fe2o3_amqp_types::primitives::Binary::from(bytes)));
        map_of(vec![
            ("session-id", Some(Value::String(self.session_id))),
            ("session-state", state),
        ])
    }
}

/// Status-only result of a [`SetSessionStateRequest`] (§4.6: "status only").
#[derive(Debug, Clone, Copy, Default)]
pub struct SetSessionStateResponse;

impl Response for SetSessionStateResponse {
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
    fn get_request_encodes_session_id_only() {
        let request = GetSessionStateRequest {
            session_id: "s1".to_string(),
        };
        match request.encode_body() {
            Value::Map(map) => assert_eq!(map.as_inner().len(), 1),
            _ => panic!("expected a map body"),
        }
    }

    #[test]
    fn set_request_omits_state_when_clearing() {
        let request = SetSessionStateRequest {
            session_id: "s1".to_string(),
            state: None,
        };
        match request.encode_body() {
            Value::Map(map) => assert_eq!(map.as_inner().len(), 1),
            _ => panic!("expected a map body"),
        }
    }

    #[test]
    fn missing_state_decodes_to_none() {
        let message = Message::builder().value(Value::Map(Default::default())).build();
        let response = GetSessionStateResponse::decode_message(message).unwrap();
        assert!(response.state.is_none());
    }
}
