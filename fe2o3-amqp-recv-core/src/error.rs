//! Error taxonomy for the receiver core.
//!
//! One enum per failure domain, following `fe2o3_amqp::link::error` and
//! `fe2o3_amqp_management::error`: `#[error(transparent)]` wrapping plus `#[from]`
//! conversions from the underlying transport errors, no hand-rolled `Display` impls.

use fe2o3_amqp::link::{DispositionError as LinkDispositionError, ReceiverAttachError, RecvError};
use fe2o3_amqp_types::definitions;

/// Errors surfaced by [`crate::handle::ReceiverHandle`] public operations.
#[derive(Debug, thiserror::Error)]
pub enum ReceiverError {
    /// `max` was zero or exceeded `prefetch_count` (§4.4).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The reactor task could not be reached; it has already exited.
    #[error("failed to schedule operation on the receiver's reactor task")]
    SchedulingFailure,

    /// A browsable (peek-only) session receiver does not grant credit and cannot `receive`.
    #[error("browsable session receivers do not support receive(); use peek() instead")]
    BrowsableReceiveNotSupported,

    /// The link failed to open within its deadline.
    #[error("link open timed out")]
    OpenTimeout {
        /// The last error observed on the link, if any.
        #[source]
        last_error: Option<LinkLifecycleError>,
    },

    /// The link failed to close within its deadline.
    #[error("link close timed out")]
    CloseTimeout,

    /// Non-transient error on the link; all pending work has been failed.
    #[error(transparent)]
    Link(#[from] LinkLifecycleError),

    /// Failure attaching or exercising the underlying receive link.
    #[error(transparent)]
    Attach(#[from] ReceiverAttachError),

    /// Failure receiving from the underlying link.
    #[error(transparent)]
    Recv(#[from] RecvError),
}

/// Errors surfaced by a single disposition ([`crate::handle::ReceiverHandle::complete`] and
/// friends).
#[derive(Debug, thiserror::Error)]
pub enum DispositionError {
    /// The delivery tag does not appear in the Delivery Registry (never received, or already
    /// settled).
    #[error("delivery not found for the given tag")]
    DeliveryNotFound,

    /// A disposition is already in flight for this delivery tag (I2: at most one in-flight
    /// update per tag).
    #[error("a disposition is already in flight for this delivery")]
    AlreadyInFlight,

    /// The operation did not complete within its deadline.
    #[error("disposition timed out: {0}")]
    Timeout(String),

    /// The remote party released the delivery (a cancellation-style outcome).
    #[error("operation cancelled: delivery was released by the remote endpoint")]
    OperationCancelled,

    /// A non-retryable broker or protocol error was returned for the disposition.
    #[error("fatal error settling delivery: {0:?}")]
    Fatal(definitions::Error),

    /// Could not schedule the disposition on the reactor task.
    #[error("failed to schedule disposition on the receiver's reactor task")]
    SchedulingFailure,

    /// The receiver closed while this disposition was still in flight.
    #[error("receiver closed while disposition was in flight")]
    Closed,

    /// Underlying link-level disposition failure.
    #[error(transparent)]
    Link(#[from] LinkDispositionError),
}

/// Errors from the link lifecycle state machine (§4.1).
#[derive(Debug, Clone, thiserror::Error)]
pub enum LinkLifecycleError {
    /// A session receiver's link opened but the remote source did not echo the session filter
    /// (P7).
    #[error("session filter was not echoed back by the remote source")]
    SessionFilterMissing,

    /// The link closed with a non-transient remote or local error.
    #[error("link closed: {0:?}")]
    Closed(Option<definitions::Error>),

    /// A transient error was observed while reattaching; carried as context, not a terminal
    /// failure by itself.
    #[error("transient link error: {0:?}")]
    Transient(Option<definitions::Error>),
}

/// Errors from the management request/response channel (§4.6).
#[derive(Debug, thiserror::Error)]
pub enum ManagementError {
    /// The response's status code was not `200 OK`.
    #[error("management operation failed with status {code}: {description:?}")]
    Status {
        /// The status code returned by the broker.
        code: u16,
        /// The status description, if the broker supplied one.
        description: Option<String>,
    },

    /// Could not schedule the operation on the reactor task (the management link is owned by
    /// it, just like the receive link).
    #[error("failed to schedule management operation on the receiver's reactor task")]
    SchedulingFailure,

    /// The operation did not complete within its deadline.
    #[error("management operation timed out")]
    Timeout,

    /// Underlying management client failure (attach, send, or decode).
    #[error(transparent)]
    Client(#[from] fe2o3_amqp_management::error::Error),

    /// Failure attaching the management link.
    #[error(transparent)]
    Attach(#[from] fe2o3_amqp_management::error::AttachError),

    /// The operation is session-scoped but the receiver was not created in session mode.
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Errors specific to session-mode operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The receiver was not created with `is_session_receiver = true`.
    #[error("receiver is not a session receiver")]
    NotASessionReceiver,

    /// The session id is not yet known (link has not finished opening).
    #[error("session id is not yet known")]
    SessionIdUnknown,
}
