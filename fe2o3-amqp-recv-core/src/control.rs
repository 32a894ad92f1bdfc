//! Control messages posted from [`crate::handle::ReceiverHandle`] to the reactor task (C9, §5).
//!
//! Mirrors the `ConnectionControl`/`SessionControl` dispatcher idiom in `fe2o3_amqp::control`:
//! every public operation is a variant carrying its arguments plus a `oneshot` responder: no
//! method on `Receiver`/`SessionHandle` is ever touched from any thread but the one running the
//! reactor task (I6).

use std::time::{Duration, Instant};

use tokio::sync::oneshot;

use crate::{
    error::{DispositionError, ManagementError, ReceiverError},
    management::{
        GetSessionStateResponse, PeekMessagesResponse, ReceiveBySequenceNumberResponse,
        RenewLockResponse, RenewSessionLockResponse, SetSessionStateResponse,
        UpdateDispositionRequest, UpdateDispositionResponse,
    },
    prefetch::PrefetchedMessage,
    IntendedOutcome,
};

use fe2o3_amqp_types::definitions::DeliveryTag;

/// One request posted onto the reactor task's control channel.
pub enum ReceiverControl {
    /// `receive(max, timeout)` (§4.4).
    Receive {
        /// Upper bound on the number of messages to return.
        max_count: u32,
        /// How long to wait before resolving empty.
        timeout: Duration,
        /// Completed with up to `max_count` messages, or fewer (possibly zero) on timeout.
        /// `receive()` never fails once scheduled: an empty vector on timeout is a normal
        /// result, not an error (§4.4).
        responder: oneshot::Sender<Vec<PrefetchedMessage>>,
    },
    /// Settle a previously received delivery (§4.5).
    Dispose {
        /// The delivery tag to settle.
        tag: DeliveryTag,
        /// The outcome the application intends.
        outcome: IntendedOutcome,
        /// Per-operation deadline.
        deadline: Instant,
        /// Completed once a terminal outcome (successful or not) is reached.
        responder: oneshot::Sender<Result<(), DispositionError>>,
    },
    /// Changes the steady-state prefetch target (§4.2).
    SetPrefetchCount {
        /// The new prefetch target.
        new_prefetch_count: u32,
        responder: oneshot::Sender<()>,
    },
    /// Renews the peek-lock on one or more messages by lock token (§4.6).
    RenewLocks {
        lock_tokens: Vec<uuid::Uuid>,
        session_id: Option<String>,
        responder: oneshot::Sender<Result<RenewLockResponse, ManagementError>>,
    },
    /// Receives specific messages by sequence number, bypassing prefetch (§4.6).
    ReceiveBySequenceNumber {
        sequence_numbers: Vec<i64>,
        receiver_settle_mode: u8,
        session_id: Option<String>,
        responder: oneshot::Sender<Result<ReceiveBySequenceNumberResponse, ManagementError>>,
    },
    /// Settles one or more lock-token-identified messages via the management channel (§4.6).
    UpdateDispositionByLockToken {
        request: UpdateDispositionRequest,
        responder: oneshot::Sender<Result<UpdateDispositionResponse, ManagementError>>,
    },
    /// Renews the session-level exclusive lock (§4.6, session receivers only).
    RenewSessionLock {
        responder: oneshot::Sender<Result<RenewSessionLockResponse, ManagementError>>,
    },
    /// Reads the opaque session state blob (§4.6, session receivers only).
    GetSessionState {
        responder: oneshot::Sender<Result<GetSessionStateResponse, ManagementError>>,
    },
    /// Overwrites the opaque session state blob (§4.6, session receivers only).
    SetSessionState {
        state: Option<Vec<u8>>,
        responder: oneshot::Sender<Result<SetSessionStateResponse, ManagementError>>,
    },
    /// Browses messages starting at a sequence number without locking them (§4.6).
    Peek {
        from_sequence_number: i64,
        message_count: i32,
        session_id: Option<String>,
        responder: oneshot::Sender<Result<PeekMessagesResponse, ManagementError>>,
    },
    /// Closes the receive link and, if attached, the management link (§4.1).
    Close {
        responder: oneshot::Sender<Result<(), ReceiverError>>,
    },

    /// Posted by a per-request timer task when a [`ReceiveWorkItem`](crate::receive_queue::ReceiveWorkItem)'s
    /// deadline is reached (§4.4). A miss (the item already served) is a silent no-op.
    ReceiveTimeoutExpired {
        /// The `id` of the expired [`ReceiveWorkItem`](crate::receive_queue::ReceiveWorkItem).
        id: u64,
    },

    /// Posted by a retry-backoff timer task after a retryable disposition failure, asking the
    /// reactor to attempt the same outcome again (§4.5, §5 "retry with backoff"). Silently
    /// dropped if the tag is no longer tracked (already settled, timed out, or the receiver
    /// closed in the meantime).
    RetryDisposition {
        /// The delivery tag being retried.
        tag: DeliveryTag,
        /// The outcome being retried.
        outcome: IntendedOutcome,
        /// The original per-operation deadline, unchanged by the retry.
        deadline: Instant,
    },
}
