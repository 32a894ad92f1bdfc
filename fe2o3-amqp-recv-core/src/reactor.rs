//! The reactor task (C9, §5): the single tokio task that owns the receive link, the management
//! link, and every queue/tracker in this crate exclusively (I6). Every other module's state is
//! touched only from here; [`crate::handle::ReceiverHandle`] never reaches in except through
//! [`crate::control::ReceiverControl`] messages and the couple of `Arc<Mutex<_>>` snapshots
//! ([`crate::context::ErrorContextHandle`], [`crate::session::SessionFacetHandle`]) built for
//! cheap synchronous reads from any thread.

use std::time::{Duration, Instant};

use fe2o3_amqp::{session::SessionHandle, Receiver};
use fe2o3_amqp_types::{
    definitions::{self, AmqpError, DeliveryTag},
    messaging::{Accepted, Modified, Rejected},
    primitives::{Symbol, Value},
};
use tokio::sync::{mpsc, oneshot};

use crate::{
    control::ReceiverControl,
    context::ErrorContextHandle,
    credit::{CreditController, FlowInstruction, PrefetchCountHandle},
    disposition::{DispositionTracker, UpdateStateWorkItem},
    error::{DispositionError, LinkLifecycleError, ManagementError, ReceiverError, SessionError},
    filters::DEAD_LETTER_NAME,
    lifecycle::{self, LinkLifecycleManager},
    macros::{log_debug, log_warn},
    management::{
        GetSessionStateRequest, ManagementOperations, PeekMessagesRequest,
        ReceiveBySequenceNumberRequest, RenewLockRequest, RenewSessionLockRequest,
        SetSessionStateRequest,
    },
    prefetch::{PrefetchQueue, PrefetchedMessage},
    receive_queue::{ReceiveRequestQueue, ReceiveWorkItem},
    registry::DeliveryRegistry,
    retry::RetryPolicy,
    session::SessionFacetHandle,
    IntendedOutcome,
};

/// Everything the reactor needs to run, handed over by [`crate::handle`] once at spawn time.
pub struct ReactorConfig {
    pub lifecycle: LinkLifecycleManager,
    pub management: ManagementOperations,
    pub retry_policy: Box<dyn RetryPolicy>,
    pub session_facet: Option<SessionFacetHandle>,
    pub error_context: ErrorContextHandle,
    pub tracker: DispositionTracker,
    pub prefetch_count: u32,
    pub prefetch_count_handle: PrefetchCountHandle,
    pub browsable: bool,
    /// Deadline for the initial link attach (§4.1 "arms an open-timeout timer").
    pub open_timeout: Duration,
    /// Deadline for [`ReceiverControl::Close`] (§4.1 "arms a close-timeout timer").
    pub close_timeout: Duration,
}

/// Owns the receive link, the management link, and every reactor-exclusive queue (I6). Generic
/// over `R`, the AMQP session's link-listener type parameter, the same way every `fe2o3_amqp`
/// function that takes a `&mut SessionHandle<R>` is.
pub struct Reactor<R> {
    session: SessionHandle<R>,
    lifecycle: LinkLifecycleManager,
    management: ManagementOperations,
    retry_policy: Box<dyn RetryPolicy>,
    session_facet: Option<SessionFacetHandle>,
    error_context: ErrorContextHandle,
    credit: CreditController,
    prefetch: PrefetchQueue,
    registry: DeliveryRegistry,
    receive_queue: ReceiveRequestQueue,
    tracker: DispositionTracker,
    prefetch_count_handle: PrefetchCountHandle,
    control_rx: mpsc::Receiver<ReceiverControl>,
    control_tx: mpsc::Sender<ReceiverControl>,
    outstanding_credit: u32,
    next_receive_id: u64,
    reattach_attempt: u32,
    open_timeout: Duration,
    close_timeout: Duration,
}

impl<R> Reactor<R>
where
    R: Send + 'static,
{
    /// Builds a reactor. `control_tx`/`control_rx` are the two ends of the channel
    /// [`crate::handle::ReceiverHandle`] posts onto; `control_tx` is kept by the reactor itself
    /// too, so timer tasks it spawns (receive timeouts, disposition retries) can post back onto
    /// the same channel rather than needing a direct handle back into reactor state.
    pub fn new(
        session: SessionHandle<R>,
        config: ReactorConfig,
        control_tx: mpsc::Sender<ReceiverControl>,
        control_rx: mpsc::Receiver<ReceiverControl>,
    ) -> Self {
        Self {
            session,
            lifecycle: config.lifecycle,
            management: config.management,
            retry_policy: config.retry_policy,
            session_facet: config.session_facet,
            error_context: config.error_context,
            credit: CreditController::new(config.prefetch_count, config.browsable),
            prefetch: PrefetchQueue::new(),
            registry: DeliveryRegistry::new(),
            receive_queue: ReceiveRequestQueue::new(),
            tracker: config.tracker,
            prefetch_count_handle: config.prefetch_count_handle,
            control_tx,
            control_rx,
            outstanding_credit: 0,
            next_receive_id: 0,
            reattach_attempt: 0,
            open_timeout: config.open_timeout,
            close_timeout: config.close_timeout,
        }
    }

    /// Runs the reactor to completion: opens the link (bounded by `open_timeout`, reporting the
    /// outcome on `open_result`), then alternates between servicing control messages and inbound
    /// deliveries until [`ReceiverControl::Close`] is handled or every
    /// [`crate::handle::ReceiverHandle`] has been dropped. Exits immediately if the initial open
    /// fails or times out: nothing has been established yet for a reattach to preserve (§4.1).
    pub async fn run(mut self, open_result: oneshot::Sender<Result<(), ReceiverError>>) {
        if !self.initial_open(open_result).await {
            return;
        }

        loop {
            let recv_enabled = self.can_recv();
            tokio::select! {
                received = self.control_rx.recv() => {
                    match received {
                        Some(message) => {
                            let should_stop = self.handle_control(message).await;
                            if should_stop {
                                break;
                            }
                        }
                        None => break,
                    }
                }
                result = Self::recv_next(&mut self.lifecycle), if recv_enabled => {
                    self.handle_recv_result(result).await;
                }
            }

            if self.lifecycle.state() == lifecycle::LinkState::Reopening {
                self.attempt_reattach().await;
            }
        }
    }

    fn can_recv(&self) -> bool {
        self.lifecycle.state() == lifecycle::LinkState::Open && !self.credit.is_browsable()
    }

    async fn recv_next(
        lifecycle: &mut LinkLifecycleManager,
    ) -> Result<fe2o3_amqp::Delivery<Value>, fe2o3_amqp::link::RecvError> {
        match lifecycle.receiver_mut() {
            Some(receiver) => receiver.recv::<Value>().await,
            None => std::future::pending().await,
        }
    }

    /// Returns `true` if the reactor should proceed into its main loop.
    async fn initial_open(
        &mut self,
        open_result: oneshot::Sender<Result<(), ReceiverError>>,
    ) -> bool {
        match tokio::time::timeout(self.open_timeout, self.lifecycle.open(&mut self.session)).await
        {
            Ok(Ok(())) => {
                self.on_link_opened().await;
                let _ = open_result.send(Ok(()));
                true
            }
            Ok(Err(error)) => {
                log_warn!("initial link attach failed: {:?}", error);
                self.note_link_error(&error);
                let _ = open_result.send(Err(ReceiverError::Link(error)));
                false
            }
            Err(_elapsed) => {
                log_warn!("initial link attach timed out after {:?}", self.open_timeout);
                let last_error = self.lifecycle.last_error().cloned();
                self.lifecycle.mark_closed(None);
                let _ = open_result.send(Err(ReceiverError::OpenTimeout { last_error }));
                false
            }
        }
    }

    async fn on_link_opened(&mut self) {
        self.reattach_attempt = 0;
        self.outstanding_credit = 0;
        self.sync_session_facet();
        if let Some(instruction) = self.credit.enqueue(self.credit.prefetch_count()) {
            self.apply_flow_instruction(instruction).await;
        }
        if let Some(instruction) = self.credit.flush() {
            self.apply_flow_instruction(instruction).await;
        }
    }

    fn sync_session_facet(&mut self) {
        let Some(facet) = self.session_facet.clone() else {
            return;
        };
        facet.set_session_locked_until(self.lifecycle.session_locked_until());
        if facet.session_id().is_none() {
            if let Some(echoed) = self
                .lifecycle
                .receiver()
                .and_then(|receiver| receiver.source().as_ref())
                .and_then(|source| source.filter.clone())
                .and_then(|filters| crate::filters::echoed_session_id(&filters))
            {
                facet.set_session_id(echoed);
            }
        }
    }

    async fn apply_flow_instruction(&mut self, instruction: FlowInstruction) {
        self.outstanding_credit = if instruction.subtract {
            self.outstanding_credit.saturating_sub(instruction.amount)
        } else {
            self.outstanding_credit.saturating_add(instruction.amount)
        };
        let Some(receiver) = self.lifecycle.receiver_mut() else {
            return;
        };
        if let Err(error) = receiver.set_credit(self.outstanding_credit).await {
            log_warn!("failed to flow credit: {:?}", error);
        }
    }

    async fn handle_recv_result(
        &mut self,
        result: Result<fe2o3_amqp::Delivery<Value>, fe2o3_amqp::link::RecvError>,
    ) {
        match result {
            Ok(delivery) => self.handle_inbound_delivery(delivery).await,
            Err(error) => self.handle_recv_error(error).await,
        }
    }

    async fn handle_inbound_delivery(&mut self, delivery: fe2o3_amqp::Delivery<Value>) {
        let tag = delivery.delivery_tag().clone();
        let message = delivery.message().clone();
        // `outstanding_credit` tracks how much of what we last flowed the broker hasn't spent yet;
        // one inbound transfer consumes exactly one unit of it (I3/P1).
        self.outstanding_credit = self.outstanding_credit.saturating_sub(1);
        if self.lifecycle.sender_presettles() {
            if let Some(receiver) = self.lifecycle.receiver_mut() {
                if let Err(error) = receiver.accept(&delivery).await {
                    log_warn!("failed to auto-accept a sender-settled delivery: {:?}", error);
                }
            }
        } else {
            self.registry.insert(tag.clone(), delivery);
        }
        self.prefetch.push((message, tag));
        self.serve_pending_receive().await;
    }

    async fn serve_pending_receive(&mut self) {
        let Some(item) = self.receive_queue.pop_front() else {
            return;
        };
        let messages = self.poll_prefetch(item.max_count()).await;
        item.complete(messages);
    }

    async fn poll_prefetch(&mut self, max_count: u32) -> Vec<PrefetchedMessage> {
        let drained = self.prefetch.drain(max_count);
        if !drained.is_empty() {
            if let Some(instruction) = self.credit.enqueue(drained.len() as u32) {
                self.apply_flow_instruction(instruction).await;
            }
        }
        drained
    }

    async fn handle_recv_error(&mut self, error: fe2o3_amqp::link::RecvError) {
        let transient = lifecycle::classify_recv_error(&error);
        log_warn!("receive link error (transient={transient}): {:?}", error);
        if transient {
            self.error_context.record_reattach();
            self.lifecycle.mark_transient_failure(None);
        } else {
            self.lifecycle.mark_closed(None);
        }
        self.fail_all_pending().await;
    }

    async fn attempt_reattach(&mut self) {
        let Some(delay) = self.retry_policy.reattach_interval(self.reattach_attempt) else {
            log_warn!("reattach budget exhausted, closing receiver");
            self.lifecycle.mark_closed(None);
            self.fail_all_pending().await;
            return;
        };
        tokio::time::sleep(delay).await;
        self.lifecycle.detach_for_reopen().await;
        match self.lifecycle.open(&mut self.session).await {
            Ok(()) => self.on_link_opened().await,
            Err(error) => {
                self.reattach_attempt += 1;
                self.note_link_error(&error);
            }
        }
    }

    fn note_link_error(&mut self, error: &LinkLifecycleError) {
        if let LinkLifecycleError::Closed(Some(cause)) | LinkLifecycleError::Transient(Some(cause)) =
            error
        {
            self.error_context.record_link_error(cause.clone());
        }
    }

    /// §5 "close cancels all pending receives ... fails all pending dispositions; clears the
    /// delivery registry". Also used on a non-transient link failure: receives are always
    /// completed with an empty batch per [`crate::control::ReceiverControl::Receive`]'s contract
    /// (it has no error slot), with failure detail left to [`crate::handle::ReceiverHandle::error_context`].
    async fn fail_all_pending(&mut self) {
        for item in self.receive_queue.drain_all() {
            item.complete(vec![]);
        }
        let reason = definitions::Error::new(
            AmqpError::IllegalState,
            Some("receive link is not open".to_string()),
            None,
        );
        for (_, item) in self.tracker.drain_all() {
            item.fail(DispositionError::Fatal(reason.clone()));
        }
        self.registry.clear();
    }

    /// Returns `true` if the reactor should stop its main loop (only on `Close`).
    async fn handle_control(&mut self, message: ReceiverControl) -> bool {
        match message {
            ReceiverControl::Receive {
                max_count,
                timeout,
                responder,
            } => {
                self.handle_receive(max_count, timeout, responder).await;
                false
            }
            ReceiverControl::Dispose {
                tag,
                outcome,
                deadline,
                responder,
            } => {
                self.handle_dispose_request(tag, outcome, deadline, responder)
                    .await;
                false
            }
            ReceiverControl::SetPrefetchCount {
                new_prefetch_count,
                responder,
            } => {
                if let Some(instruction) = self.credit.set_prefetch_count(new_prefetch_count) {
                    self.apply_flow_instruction(instruction).await;
                }
                self.prefetch_count_handle.set(new_prefetch_count);
                let _ = responder.send(());
                false
            }
            ReceiverControl::RenewLocks {
                lock_tokens,
                session_id,
                responder,
            } => {
                let request = RenewLockRequest {
                    lock_tokens,
                    session_id,
                };
                let result = self.management.call(&mut self.session, request).await;
                self.note_management_result(&result);
                let _ = responder.send(result);
                false
            }
            ReceiverControl::ReceiveBySequenceNumber {
                sequence_numbers,
                receiver_settle_mode,
                session_id,
                responder,
            } => {
                let request = ReceiveBySequenceNumberRequest {
                    sequence_numbers,
                    receiver_settle_mode,
                    session_id,
                };
                let result = self.management.call(&mut self.session, request).await;
                self.note_management_result(&result);
                let _ = responder.send(result);
                false
            }
            ReceiverControl::UpdateDispositionByLockToken { request, responder } => {
                let result = self.management.call(&mut self.session, request).await;
                self.note_management_result(&result);
                let _ = responder.send(result);
                false
            }
            ReceiverControl::RenewSessionLock { responder } => {
                let result = match self.require_session_id() {
                    Ok(session_id) => {
                        let request = RenewSessionLockRequest { session_id };
                        let result = self.management.call(&mut self.session, request).await;
                        if let Ok(response) = &result {
                            if let Some(facet) = &self.session_facet {
                                facet.set_session_locked_until(response.expiration);
                            }
                        }
                        result
                    }
                    Err(error) => Err(error),
                };
                self.note_management_result(&result);
                let _ = responder.send(result);
                false
            }
            ReceiverControl::GetSessionState { responder } => {
                let result = match self.require_session_id() {
                    Ok(session_id) => {
                        self.management
                            .call(&mut self.session, GetSessionStateRequest { session_id })
                            .await
                    }
                    Err(error) => Err(error),
                };
                self.note_management_result(&result);
                let _ = responder.send(result);
                false
            }
            ReceiverControl::SetSessionState { state, responder } => {
                let result = match self.require_session_id() {
                    Ok(session_id) => {
                        self.management
                            .call(&mut self.session, SetSessionStateRequest { session_id, state })
                            .await
                    }
                    Err(error) => Err(error),
                };
                self.note_management_result(&result);
                let _ = responder.send(result);
                false
            }
            ReceiverControl::Peek {
                from_sequence_number,
                message_count,
                session_id,
                responder,
            } => {
                let request = PeekMessagesRequest {
                    from_sequence_number,
                    message_count,
                    session_id,
                };
                let result = self.management.call(&mut self.session, request).await;
                self.note_management_result(&result);
                let _ = responder.send(result);
                false
            }
            ReceiverControl::Close { responder } => {
                let result = self.handle_close().await;
                let _ = responder.send(result);
                true
            }
            ReceiverControl::ReceiveTimeoutExpired { id } => {
                self.handle_receive_timeout(id).await;
                false
            }
            ReceiverControl::RetryDisposition {
                tag,
                outcome,
                deadline,
            } => {
                self.handle_retry_disposition(tag, outcome, deadline).await;
                false
            }
        }
    }

    fn require_session_id(&self) -> Result<String, ManagementError> {
        let facet = self
            .session_facet
            .as_ref()
            .ok_or(ManagementError::Session(SessionError::NotASessionReceiver))?;
        facet
            .session_id()
            .ok_or(ManagementError::Session(SessionError::SessionIdUnknown))
    }

    fn note_management_result<T>(&self, result: &Result<T, ManagementError>) {
        if let Err(error) = result {
            self.error_context.record_management_error(error);
        }
    }

    async fn handle_receive(
        &mut self,
        max_count: u32,
        timeout: Duration,
        responder: tokio::sync::oneshot::Sender<Vec<PrefetchedMessage>>,
    ) {
        let messages = self.poll_prefetch(max_count).await;
        if !messages.is_empty() {
            let _ = responder.send(messages);
            return;
        }

        let id = self.next_receive_id;
        self.next_receive_id += 1;
        let deadline = Instant::now() + timeout;
        let control_tx = self.control_tx.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let _ = control_tx.send(ReceiverControl::ReceiveTimeoutExpired { id }).await;
        });
        self.receive_queue
            .push(ReceiveWorkItem::new(id, responder, deadline, max_count, timer));
    }

    /// §4.4/§9 open question: a receive timeout re-issues the same outstanding credit total as a
    /// net-zero-delta nudge, preserved as a compatibility shim rather than removed.
    async fn handle_receive_timeout(&mut self, id: u64) {
        let Some(item) = self.receive_queue.remove_by_id(id) else {
            return;
        };
        self.apply_flow_instruction(FlowInstruction {
            amount: 0,
            subtract: false,
        })
        .await;
        item.complete(vec![]);
    }

    async fn handle_dispose_request(
        &mut self,
        tag: DeliveryTag,
        outcome: IntendedOutcome,
        deadline: Instant,
        responder: tokio::sync::oneshot::Sender<Result<(), DispositionError>>,
    ) {
        if !self.registry.contains(&tag) {
            let _ = responder.send(Err(DispositionError::DeliveryNotFound));
            return;
        }
        let item = UpdateStateWorkItem::new(responder, outcome.clone(), deadline);
        if let Err(item) = self.tracker.begin(tag.clone(), item) {
            item.fail(DispositionError::AlreadyInFlight);
            return;
        }
        self.perform_dispose(tag, outcome).await;
    }

    async fn handle_retry_disposition(
        &mut self,
        tag: DeliveryTag,
        outcome: IntendedOutcome,
        deadline: Instant,
    ) {
        if !self.tracker.contains(&tag) {
            return;
        }
        if Instant::now() >= deadline {
            if let Some(item) = self.tracker.remove(&tag) {
                item.timeout();
            }
            self.registry.remove(&tag);
            return;
        }
        self.perform_dispose(tag, outcome).await;
    }

    /// The core of every disposition path (§4.3, §4.5). `dispose()` on the underlying link
    /// directly awaits the broker's terminal outcome rather than returning once the frame is
    /// sent, which folds the event-driven "inbound callback correlates by tag" model described
    /// for the original system into a single call here: there is no separate branch for "a
    /// disposition frame arrived for a tag we're tracking", because `dispose()`'s `Ok`/`Err`
    /// already is that correlation.
    async fn perform_dispose(&mut self, tag: DeliveryTag, outcome: IntendedOutcome) {
        let Some(receiver) = self.lifecycle.receiver_mut() else {
            if let Some(item) = self.tracker.remove(&tag) {
                item.fail(DispositionError::Closed);
            }
            self.registry.remove(&tag);
            return;
        };
        let Some(delivery) = self.registry.get(&tag) else {
            if let Some(item) = self.tracker.remove(&tag) {
                item.fail(DispositionError::DeliveryNotFound);
            }
            return;
        };
        let result = match &outcome {
            IntendedOutcome::Complete => receiver.dispose(delivery, Accepted {}).await,
            IntendedOutcome::Abandon => {
                let modified = Modified {
                    delivery_failed: Some(true),
                    undeliverable_here: None,
                    message_annotations: None,
                };
                receiver.dispose(delivery, modified).await
            }
            IntendedOutcome::Defer => {
                let modified = Modified {
                    delivery_failed: None,
                    undeliverable_here: Some(true),
                    message_annotations: None,
                };
                receiver.dispose(delivery, modified).await
            }
            IntendedOutcome::DeadLetter(details) => {
                let mut info = definitions::Fields::default();
                if let Some(reason) = &details.reason {
                    info.insert(
                        Symbol::from("dead-letter-reason"),
                        Value::String(reason.clone()),
                    );
                }
                if let Some(description) = &details.description {
                    info.insert(
                        Symbol::from("dead-letter-description"),
                        Value::String(description.clone()),
                    );
                }
                for (key, value) in &details.properties {
                    info.insert(Symbol::from(key.as_str()), Value::String(value.clone()));
                }
                let error = definitions::Error::new(
                    definitions::ErrorCondition::Custom(Symbol::from(DEAD_LETTER_NAME)),
                    details.reason.clone(),
                    Some(info),
                );
                let rejected = Rejected { error: Some(error) };
                receiver.dispose(delivery, rejected).await
            }
        };

        match result {
            Ok(()) => {
                self.registry.remove(&tag);
                if let Some(item) = self.tracker.remove(&tag) {
                    item.succeed();
                }
            }
            Err(error) => self.handle_dispose_failure(tag, outcome, error).await,
        }
    }

    async fn handle_dispose_failure(
        &mut self,
        tag: DeliveryTag,
        outcome: IntendedOutcome,
        error: fe2o3_amqp::link::DispositionError,
    ) {
        log_debug!("disposition failed for tag={:?}: {:?}", tag, error);

        let condition = dispose_error_condition(&error);
        let Some(attempt) = self.tracker.record_retry(&tag, condition.clone()) else {
            return;
        };

        match self.retry_policy.retry_interval(&condition, attempt - 1) {
            Some(delay) => {
                self.error_context.record_disposition_retry();
                let Some(deadline) = self.tracker.deadline_of(&tag) else {
                    return;
                };
                let control_tx = self.control_tx.clone();
                let retry_tag = tag.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = control_tx
                        .send(ReceiverControl::RetryDisposition {
                            tag: retry_tag,
                            outcome,
                            deadline,
                        })
                        .await;
                });
            }
            None => {
                self.registry.remove(&tag);
                if let Some(item) = self.tracker.remove(&tag) {
                    item.fail(DispositionError::Link(error));
                }
            }
        }
    }

    async fn handle_close(&mut self) -> Result<(), ReceiverError> {
        self.fail_all_pending().await;
        let closed = tokio::time::timeout(self.close_timeout, async {
            self.management.close().await;
            if let Err(error) = self.lifecycle.close().await {
                log_warn!("link close failed, proceeding anyway: {:?}", error);
            }
        })
        .await;
        closed.map_err(|_elapsed| ReceiverError::CloseTimeout)
    }
}

/// Maps a link-level disposition failure onto the condition the retry policy classifies against
/// (§4.3, §7 error taxonomy), rather than collapsing every failure to one synthetic
/// `AmqpError::InternalError` that the default policy's substring classification can never match.
/// `fe2o3_amqp::link::DispositionError` is the local link-state error raised when `dispose()`
/// itself cannot be sent (the link already detached or its session ended mid-flight); both
/// variants describe the same "link is in no state to settle" condition, so both map onto
/// `AmqpError::IllegalState`, carrying the variant's own description rather than a discarded one.
fn dispose_error_condition(error: &fe2o3_amqp::link::DispositionError) -> definitions::Error {
    use fe2o3_amqp::link::DispositionError;
    let description = error.to_string();
    match error {
        DispositionError::IllegalState | DispositionError::IllegalSessionState => {
            definitions::Error::new(AmqpError::IllegalState, Some(description), None)
        }
    }
}
