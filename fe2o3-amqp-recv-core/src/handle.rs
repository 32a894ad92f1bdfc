//! Reactor Dispatcher Shim (C9, §4.1/§5) and the receiver's public API surface.
//!
//! `ReceiverHandle` is the only type application code touches. It owns nothing link-related
//! itself: every method builds a [`ReceiverControl`] carrying a `oneshot` "promise" and posts it
//! to the reactor task spawned by [`ReceiverHandle::create`]/[`ReceiverHandle::create_session`].
//! This mirrors `fe2o3_amqp::session::SessionHandle`/`fe2o3_amqp::connection::ConnectionHandle`:
//! a thin, `Clone`-free handle around an `mpsc::Sender`, where a closed channel (the reactor task
//! has exited) is the one failure mode every public method must handle explicitly.

use std::time::{Duration, Instant};

use fe2o3_amqp::session::SessionHandle;
use fe2o3_amqp_types::definitions::{DeliveryTag, ReceiverSettleMode, SenderSettleMode};
use tokio::{sync::{mpsc, oneshot}, task::JoinHandle};

use crate::{
    context::{ErrorContext, ErrorContextHandle},
    control::ReceiverControl,
    credit::PrefetchCountHandle,
    disposition::{self, DispositionTracker},
    error::{DispositionError, ManagementError, ReceiverError},
    lifecycle::{LinkConfig, LinkLifecycleManager},
    management::{
        DeadLetterDetails, DispositionStatus, GetSessionStateResponse, ManagementOperations,
        PeekMessagesResponse, ReceiveBySequenceNumberResponse, RenewLockResponse,
        RenewSessionLockResponse, SetSessionStateResponse, UpdateDispositionRequest,
        UpdateDispositionResponse,
    },
    prefetch::PrefetchedMessage,
    reactor::{ReactorConfig, Reactor},
    retry::{FixedJitterBackoff, RetryPolicy},
    session::{SessionFacet, SessionFacetHandle},
    IntendedOutcome,
};

/// Default bound on the control channel. Generous enough that a burst of concurrent callers
/// never blocks on `send` under normal load; the reactor drains it continuously.
const CONTROL_CHANNEL_CAPACITY: usize = 256;

/// Knobs needed to open a receive link, independent of whether this is a session receiver
/// (§4.1 `create`/`create_session`).
#[derive(Debug, Clone)]
pub struct ReceiverOptions {
    /// Link name; stable across reattaches.
    pub link_name: String,
    /// Source address (queue, subscription, or topic path).
    pub address: String,
    /// Steady-state prefetch target (C3); also the upper bound on a single `receive(max, _)`.
    pub prefetch_count: u32,
    /// Negotiated sender settle mode.
    pub sender_settle_mode: SenderSettleMode,
    /// Negotiated receiver settle mode.
    pub receiver_settle_mode: ReceiverSettleMode,
    /// Server-side operation timeout hint advertised via `com.microsoft:timeout` (§6).
    pub server_timeout: Option<Duration>,
    /// Deadline for the initial link attach.
    pub open_timeout: Duration,
    /// Deadline for `close()`.
    pub close_timeout: Duration,
    /// Client-node address used when lazily attaching the management link (§4.6).
    pub management_client_node_address: String,
    /// Management node address (conventionally `$management`).
    pub management_node_address: String,
    /// Retry policy for disposition retries and link reattaches (§4.1, §4.5, §9).
    pub retry_policy: Box<dyn RetryPolicy>,
}

impl Default for ReceiverOptions {
    fn default() -> Self {
        Self {
            link_name: format!("rust-receiver-link-{}", uuid::Uuid::new_v4()),
            address: String::new(),
            prefetch_count: 0,
            sender_settle_mode: SenderSettleMode::Mixed,
            receiver_settle_mode: ReceiverSettleMode::Second,
            server_timeout: None,
            open_timeout: Duration::from_secs(60),
            close_timeout: Duration::from_secs(60),
            management_client_node_address: format!("rust-mgmt-client-{}", uuid::Uuid::new_v4()),
            management_node_address: "$management".to_string(),
            retry_policy: Box::new(FixedJitterBackoff::default()),
        }
    }
}

/// Application handle to a running receiver. Cheaply cloneable (an `mpsc::Sender` clone);
/// dropping every clone lets the reactor task's `control_rx.recv()` return `None` and the task
/// exit on its own.
#[derive(Clone)]
pub struct ReceiverHandle {
    control: mpsc::Sender<ReceiverControl>,
    error_context: ErrorContextHandle,
    session_facet: Option<SessionFacetHandle>,
    prefetch_count: PrefetchCountHandle,
}

impl std::fmt::Debug for ReceiverHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReceiverHandle")
            .field("is_session_receiver", &self.session_facet.is_some())
            .finish()
    }
}

/// What spawning a receiver hands back: the handle plus the reactor task and reaper task join
/// handles, kept only so an owning façade can await a clean shutdown if it wants to; neither is
/// required to drive the receiver (the reactor drives itself once spawned).
pub struct SpawnedReceiver {
    /// The application-facing handle.
    pub handle: ReceiverHandle,
    /// Join handle for the reactor task (C9). Completes once every clone of `handle` is dropped
    /// or [`ReceiverHandle::close`] is called.
    pub reactor_task: JoinHandle<()>,
    /// Join handle for the periodic Timeout Reaper (C10).
    pub reaper_task: JoinHandle<()>,
}

impl ReceiverHandle {
    /// `create(factory, name, path, prefetch, settle_modes) → Promise<Receiver>` (§4.1): opens a
    /// plain (non-session) receive link and spawns the reactor task that will own it. Resolves
    /// only once the link has opened, or fails with [`ReceiverError::OpenTimeout`] /
    /// the attach error otherwise.
    pub async fn create<R>(
        session: SessionHandle<R>,
        options: ReceiverOptions,
    ) -> Result<SpawnedReceiver, ReceiverError>
    where
        R: Send + 'static,
    {
        Self::spawn(session, options, None).await
    }

    /// `create_session(..., session_id, browsable) → Promise<Receiver>` (§4.1): as
    /// [`Self::create`], plus a session filter and (when `browsable`) the peek-mode link
    /// property. `session_id = None` requests the next available session; the broker assigns
    /// one, learned from the filter echo on open (§4.1, P7).
    pub async fn create_session<R>(
        session: SessionHandle<R>,
        options: ReceiverOptions,
        session_id: Option<String>,
        browsable: bool,
    ) -> Result<SpawnedReceiver, ReceiverError>
    where
        R: Send + 'static,
    {
        let facet = SessionFacet::new(session_id, browsable);
        Self::spawn(session, options, Some(facet)).await
    }

    async fn spawn<R>(
        session: SessionHandle<R>,
        options: ReceiverOptions,
        session_facet: Option<SessionFacet>,
    ) -> Result<SpawnedReceiver, ReceiverError>
    where
        R: Send + 'static,
    {
        let browsable = session_facet.as_ref().map(SessionFacet::is_browsable).unwrap_or(false);
        let session_id = session_facet.as_ref().and_then(|f| f.session_id().map(str::to_string));

        let link_config = LinkConfig {
            name: options.link_name.clone(),
            address: options.address.clone(),
            is_session_receiver: session_facet.is_some(),
            session_id,
            browsable,
            server_timeout: options.server_timeout,
            properties: None,
            sender_settle_mode: options.sender_settle_mode,
            receiver_settle_mode: options.receiver_settle_mode,
        };

        let lifecycle = LinkLifecycleManager::new(link_config);
        let management = ManagementOperations::new(
            options.management_client_node_address,
            options.management_node_address,
        );
        let error_context = ErrorContextHandle::new();
        let tracker = DispositionTracker::new();
        let session_facet_handle = session_facet.map(SessionFacetHandle::new);
        let prefetch_count_handle = PrefetchCountHandle::new(options.prefetch_count);

        let (control_tx, control_rx) = mpsc::channel(CONTROL_CHANNEL_CAPACITY);

        let reactor_config = ReactorConfig {
            lifecycle,
            management,
            retry_policy: options.retry_policy,
            session_facet: session_facet_handle.clone(),
            error_context: error_context.clone(),
            tracker: tracker.clone(),
            prefetch_count: options.prefetch_count,
            prefetch_count_handle: prefetch_count_handle.clone(),
            browsable,
            open_timeout: options.open_timeout,
            close_timeout: options.close_timeout,
        };
        let reactor = Reactor::new(session, reactor_config, control_tx.clone(), control_rx);

        let (open_tx, open_rx) = oneshot::channel();
        let reactor_task = tokio::spawn(reactor.run(open_tx));
        let reaper_task = disposition::spawn_reaper(tracker);

        match open_rx.await {
            Ok(Ok(())) => Ok(SpawnedReceiver {
                handle: ReceiverHandle {
                    control: control_tx,
                    error_context,
                    session_facet: session_facet_handle,
                    prefetch_count: prefetch_count_handle,
                },
                reactor_task,
                reaper_task,
            }),
            Ok(Err(error)) => {
                reaper_task.abort();
                Err(error)
            }
            Err(_recv_error) => {
                reaper_task.abort();
                Err(ReceiverError::SchedulingFailure)
            }
        }
    }

    async fn dispatch<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> ReceiverControl,
    ) -> Result<T, ReceiverError> {
        let (tx, rx) = oneshot::channel();
        self.control
            .send(build(tx))
            .await
            .map_err(|_| ReceiverError::SchedulingFailure)?;
        rx.await.map_err(|_| ReceiverError::SchedulingFailure)
    }

    /// `receive(max, timeout) → Promise<Collection>` (§4.4). Validates `0 < max ≤
    /// prefetch_count` synchronously; a timeout with no delivery resolves to an empty vector,
    /// never an error (P5).
    pub async fn receive(
        &self,
        max_count: u32,
        timeout: Duration,
    ) -> Result<Vec<PrefetchedMessage>, ReceiverError> {
        if self.is_browsable() {
            return Err(ReceiverError::BrowsableReceiveNotSupported);
        }
        let prefetch_count = self.prefetch_count.get();
        if max_count == 0 || max_count > prefetch_count {
            return Err(ReceiverError::InvalidArgument(format!(
                "max_count must satisfy 0 < max_count <= prefetch_count ({prefetch_count})"
            )));
        }
        self.dispatch(|responder| ReceiverControl::Receive {
            max_count,
            timeout,
            responder,
        })
        .await
    }

    async fn dispose(
        &self,
        tag: DeliveryTag,
        outcome: IntendedOutcome,
        timeout: Duration,
    ) -> Result<(), DispositionError> {
        let (tx, rx) = oneshot::channel();
        let deadline = Instant::now() + timeout;
        self.control
            .send(ReceiverControl::Dispose {
                tag,
                outcome,
                deadline,
                responder: tx,
            })
            .await
            .map_err(|_| DispositionError::SchedulingFailure)?;
        rx.await.map_err(|_| DispositionError::SchedulingFailure)?
    }

    /// Accepts a previously received message; it will not be redelivered (§4.5, §6).
    pub async fn complete(
        &self,
        tag: DeliveryTag,
        timeout: Duration,
    ) -> Result<(), DispositionError> {
        self.dispose(tag, IntendedOutcome::Complete, timeout).await
    }

    /// Makes a message available for redelivery without penalizing its delivery count (§4.5).
    pub async fn abandon(
        &self,
        tag: DeliveryTag,
        timeout: Duration,
    ) -> Result<(), DispositionError> {
        self.dispose(tag, IntendedOutcome::Abandon, timeout).await
    }

    /// Makes a message unavailable to this receiver without expiring its lock elsewhere (§4.5).
    pub async fn defer(
        &self,
        tag: DeliveryTag,
        timeout: Duration,
    ) -> Result<(), DispositionError> {
        self.dispose(tag, IntendedOutcome::Defer, timeout).await
    }

    /// Moves a previously received message to the dead-letter queue with the given details
    /// (§4.5, §6).
    pub async fn dead_letter(
        &self,
        tag: DeliveryTag,
        details: DeadLetterDetails,
        timeout: Duration,
    ) -> Result<(), DispositionError> {
        self.dispose(tag, IntendedOutcome::DeadLetter(details), timeout)
            .await
    }

    /// `set_prefetch_count(new)` (§4.2): recomputes the credit delta and flows it on the reactor
    /// task.
    pub async fn set_prefetch_count(&self, new_prefetch_count: u32) -> Result<(), ReceiverError> {
        self.dispatch(|responder| ReceiverControl::SetPrefetchCount {
            new_prefetch_count,
            responder,
        })
        .await?;
        self.prefetch_count.set(new_prefetch_count);
        Ok(())
    }

    /// Renews the peek-lock on one or more messages by lock token (§4.6 row 1).
    pub async fn renew_locks(
        &self,
        lock_tokens: Vec<uuid::Uuid>,
    ) -> Result<RenewLockResponse, ManagementError> {
        let session_id = self.scoped_session_id();
        self.dispatch_management(|responder| ReceiverControl::RenewLocks {
            lock_tokens,
            session_id,
            responder,
        })
        .await
    }

    /// Receives specific messages by sequence number, bypassing prefetch (§4.6 row 2).
    pub async fn receive_by_sequence_number(
        &self,
        sequence_numbers: Vec<i64>,
        receiver_settle_mode: u8,
    ) -> Result<ReceiveBySequenceNumberResponse, ManagementError> {
        let session_id = self.scoped_session_id();
        self.dispatch_management(|responder| ReceiverControl::ReceiveBySequenceNumber {
            sequence_numbers,
            receiver_settle_mode,
            session_id,
            responder,
        })
        .await
    }

    /// Settles one or more lock-token-identified messages via the management channel, without
    /// a live delivery handle (§4.6 row 3) — the counterpart to [`Self::complete`]/
    /// [`Self::abandon`]/[`Self::defer`]/[`Self::dead_letter`] for messages fetched via
    /// [`Self::receive_by_sequence_number`] or a raw peek-lock.
    pub async fn update_disposition_by_lock_token(
        &self,
        lock_tokens: Vec<uuid::Uuid>,
        status: DispositionStatus,
        dead_letter_reason: Option<String>,
        dead_letter_description: Option<String>,
        properties_to_modify: std::collections::HashMap<String, String>,
    ) -> Result<UpdateDispositionResponse, ManagementError> {
        let session_id = self.scoped_session_id();
        let request = UpdateDispositionRequest {
            lock_tokens,
            status,
            dead_letter_reason,
            dead_letter_description,
            properties_to_modify,
            session_id,
        };
        self.dispatch_management(|responder| ReceiverControl::UpdateDispositionByLockToken {
            request,
            responder,
        })
        .await
    }

    /// Renews the session-level exclusive lock (§4.6 row 4, session receivers only).
    pub async fn renew_session_lock(&self) -> Result<RenewSessionLockResponse, ManagementError> {
        self.require_session()?;
        self.dispatch_management(|responder| ReceiverControl::RenewSessionLock { responder })
            .await
    }

    /// Reads the opaque session state blob (§4.6 row 5, session receivers only).
    pub async fn get_session_state(&self) -> Result<GetSessionStateResponse, ManagementError> {
        self.require_session()?;
        self.dispatch_management(|responder| ReceiverControl::GetSessionState { responder })
            .await
    }

    /// Overwrites the opaque session state blob (§4.6 row 6, session receivers only).
    pub async fn set_session_state(
        &self,
        state: Option<Vec<u8>>,
    ) -> Result<SetSessionStateResponse, ManagementError> {
        self.require_session()?;
        self.dispatch_management(|responder| ReceiverControl::SetSessionState { state, responder })
            .await
    }

    /// Browses messages starting at a sequence number via the management channel, without
    /// locking them (§4.6 row 7). The only source of messages for a browsable session receiver
    /// (I4); usable standalone for any receiver otherwise.
    pub async fn peek(
        &self,
        from_sequence_number: i64,
        message_count: i32,
    ) -> Result<PeekMessagesResponse, ManagementError> {
        let session_id = self.scoped_session_id();
        self.dispatch_management(|responder| ReceiverControl::Peek {
            from_sequence_number,
            message_count,
            session_id,
            responder,
        })
        .await
    }

    /// `close() → Promise<void>` (§4.1): closes the receive link and, if attached, the
    /// management link. Idempotent (P4): a second call after the reactor task has already
    /// exited resolves immediately rather than erroring, since there is nothing left to close.
    pub async fn close(&self) -> Result<(), ReceiverError> {
        let (tx, rx) = oneshot::channel();
        match self.control.send(ReceiverControl::Close { responder: tx }).await {
            Ok(()) => rx.await.unwrap_or(Ok(())),
            Err(_) => Ok(()),
        }
    }

    /// Point-in-time snapshot of the last link/management error and retry counters (§1, §7) —
    /// the one piece of metrics-style observability this crate keeps in scope.
    pub fn error_context(&self) -> ErrorContext {
        self.error_context.snapshot()
    }

    /// The session id this receiver is scoped to, once known. `None` for a non-session receiver
    /// or before a next-available-session receiver's link has finished opening.
    pub fn session_id(&self) -> Option<String> {
        self.session_facet.as_ref().and_then(SessionFacetHandle::session_id)
    }

    /// The broker-reported session lock expiration; `epoch 0` means unknown or not a session
    /// receiver (§3).
    pub fn session_locked_until(&self) -> chrono::DateTime<chrono::Utc> {
        self.session_facet
            .as_ref()
            .map(SessionFacetHandle::session_locked_until)
            .unwrap_or_else(crate::filters::unknown_lock_expiry)
    }

    /// Whether this is a non-consuming (peek-only) session receiver (I4).
    pub fn is_browsable(&self) -> bool {
        self.session_facet
            .as_ref()
            .map(SessionFacetHandle::is_browsable)
            .unwrap_or(false)
    }

    fn scoped_session_id(&self) -> Option<String> {
        self.session_facet.as_ref().and_then(SessionFacetHandle::session_id)
    }

    fn require_session(&self) -> Result<(), ManagementError> {
        if self.session_facet.is_some() {
            Ok(())
        } else {
            Err(ManagementError::Session(
                crate::error::SessionError::NotASessionReceiver,
            ))
        }
    }

    async fn dispatch_management<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<T, ManagementError>>) -> ReceiverControl,
    ) -> Result<T, ManagementError> {
        let (tx, rx) = oneshot::channel();
        self.control
            .send(build(tx))
            .await
            .map_err(|_| ManagementError::SchedulingFailure)?;
        rx.await.map_err(|_| ManagementError::SchedulingFailure)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_set_a_unique_link_name() {
        let a = ReceiverOptions::default();
        let b = ReceiverOptions::default();
        assert_ne!(a.link_name, b.link_name);
        assert_eq!(a.receiver_settle_mode, ReceiverSettleMode::Second);
    }
}
