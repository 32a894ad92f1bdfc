//! Management Operations (C8, §4.6, §9 "coroutine-style composition").
//!
//! One `Request`/`Response` pair (from `fe2o3_amqp_management::{Request, Response}`) per broker
//! operation, multiplexed over a single lazily-attached [`fe2o3_amqp_management::MgmtClient`]
//! shared behind a `tokio::sync::Mutex` (§5 "request/response link creation under a mutex;
//! afterwards it is a thread-safe object").

mod peek;
mod receive_by_sequence;
mod renew_locks;
mod session_lock;
mod session_state;
mod update_disposition;

pub use peek::{PeekMessagesRequest, PeekMessagesResponse, PeekedMessage};
pub use receive_by_sequence::{
    ReceiveBySequenceNumberRequest, ReceiveBySequenceNumberResponse, ReceivedMessage,
};
pub use renew_locks::{RenewLockRequest, RenewLockResponse};
pub use session_lock::{RenewSessionLockRequest, RenewSessionLockResponse};
pub use session_state::{
    GetSessionStateRequest, GetSessionStateResponse, SetSessionStateRequest,
    SetSessionStateResponse,
};
pub use update_disposition::{
    DispositionStatus, UpdateDispositionRequest, UpdateDispositionResponse,
};

use fe2o3_amqp::session::SessionHandle;
use fe2o3_amqp_management::{client::MgmtClient, request::Request, response::Response};
use fe2o3_amqp_types::messaging::FromBody;
use tokio::sync::Mutex;

use crate::error::ManagementError;

/// Extra properties carried on a dead-letter disposition (§6, §12).
#[derive(Debug, Clone, Default)]
pub struct DeadLetterDetails {
    /// `dead-letter-reason` application property.
    pub reason: Option<String>,
    /// `dead-letter-description` application property.
    pub description: Option<String>,
    /// Additional custom properties merged into the rejection's error info map.
    pub properties: std::collections::HashMap<String, String>,
}

/// Multiplexes the seven management operations of §4.6 over one request/response link.
pub struct ManagementOperations {
    client_node_address: String,
    management_node_address: String,
    client: Mutex<Option<MgmtClient>>,
}

impl std::fmt::Debug for ManagementOperations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagementOperations")
            .field("management_node_address", &self.management_node_address)
            .finish()
    }
}

impl ManagementOperations {
    /// Creates an operations multiplexer that attaches its request/response link lazily, on the
    /// first call.
    pub fn new(
        client_node_address: impl Into<String>,
        management_node_address: impl Into<String>,
    ) -> Self {
        Self {
            client_node_address: client_node_address.into(),
            management_node_address: management_node_address.into(),
            client: Mutex::new(None),
        }
    }

    /// Executes `request`, attaching the underlying management client first if this is the
    /// first call (§5).
    pub async fn call<R, Req>(
        &self,
        session: &mut SessionHandle<R>,
        request: Req,
    ) -> Result<Req::Response, ManagementError>
    where
        Req: Request,
        Req::Response: Response<Error = fe2o3_amqp_management::error::Error>,
        for<'de> <Req::Response as Response>::Body: FromBody<'de> + std::fmt::Debug + Send,
    {
        let mut guard = self.client.lock().await;
        if guard.is_none() {
            let attached = MgmtClient::builder()
                .client_node_addr(self.client_node_address.clone())
                .management_node_address(self.management_node_address.clone())
                .attach(session)
                .await?;
            *guard = Some(attached);
        }
        let client = guard.as_mut().expect("attached above");
        client.call(request).await.map_err(ManagementError::from)
    }

    /// Detaches the underlying management link, if attached. Called on receiver close (§4.1
    /// "closes the receive link and, if created, the request/response link").
    pub async fn close(&self) {
        let mut guard = self.client.lock().await;
        if let Some(client) = guard.take() {
            let _ = client.close().await;
        }
    }
}

pub(crate) mod wire {
    //! Small shared encode/decode helpers used by every operation module, keeping the
    //! broker-specific map shape (§4.6's key table) in one place.

    use fe2o3_amqp_types::{
        messaging::{AmqpValue, Body, Message},
        primitives::{OrderedMap, Uuid as AmqpUuid, Value},
    };

    /// Converts an application-facing `uuid::Uuid` lock token into the wire `Value::Uuid`.
    pub fn lock_token_value(token: uuid::Uuid) -> Value {
        Value::Uuid(AmqpUuid::from(*token.as_bytes()))
    }

    /// Reads a `Value::Uuid` back into an application-facing `uuid::Uuid`.
    pub fn value_as_lock_token(value: &Value) -> Option<uuid::Uuid> {
        match value {
            Value::Uuid(inner) => {
                let bytes: [u8; 16] = inner.clone().into_inner();
                Some(uuid::Uuid::from_bytes(bytes))
            }
            _ => None,
        }
    }

    /// Builds a `Value::Map` from an ordered list of key/value pairs, skipping `None` values.
    pub fn map_of(entries: Vec<(&str, Option<Value>)>) -> Value {
        let mut map = OrderedMap::default();
        for (key, value) in entries {
            if let Some(value) = value {
                map.insert(Value::String(key.to_string()), value);
            }
        }
        Value::Map(map)
    }

    /// Extracts the `Value::Map` entries from a decoded response body, or an empty map if the
    /// body was not a map (malformed/unexpected broker response).
    pub fn as_map(body: Body<Value>) -> OrderedMap<Value, Value> {
        match body {
            Body::Value(AmqpValue(Value::Map(map))) => map,
            _ => OrderedMap::default(),
        }
    }

    /// Extracts the `Value::List` entries from a decoded response body.
    pub fn as_list(body: Body<Value>) -> Vec<Value> {
        match body {
            Body::Value(AmqpValue(Value::List(items))) => items,
            _ => Vec::new(),
        }
    }

    /// Decodes a nested raw AMQP message (as embedded, binary-encoded, in a management
    /// response) back into a `Message<Value>`.
    pub fn decode_embedded_message(bytes: &[u8]) -> Option<Message<Value>> {
        serde_amqp::from_slice(bytes).ok()
    }
}
