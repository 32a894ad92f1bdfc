//! Link Lifecycle Manager (C6, §4.1, §7).
//!
//! Wraps `fe2o3_amqp::link::Receiver` in the state machine `INIT -> OPENING -> OPEN <-> REOPENING
//! -> CLOSED` (§7). Owned exclusively by the reactor task (I6); every transition here happens on
//! that task, so no locking is needed around the wrapped link itself.

use std::time::Duration;

use fe2o3_amqp::{
    link::{
        receiver::CreditMode, DetachError, ReceiverAttachError, RecvError,
        DispositionError as LinkDispositionError,
    },
    session::SessionHandle,
    Receiver,
};
use fe2o3_amqp_types::{
    definitions::{self, Fields, ReceiverSettleMode, SenderSettleMode},
    messaging::{Source, Target},
    primitives::Value,
};

use crate::{
    filters::{
        echoed_session_id, session_filter_set, ticks_to_utc, unknown_lock_expiry,
        LOCKED_UNTIL_UTC_PROPERTY, PEEK_MODE_PROPERTY, SERVER_TIMEOUT_PROPERTY,
    },
    macros::{log_debug, log_warn},
};

pub use crate::error::LinkLifecycleError as Error;

/// Configuration needed to (re)open the receive link, stable across reattaches (§4.1).
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// The link name; stable across reattaches so the broker can recognize resumption.
    pub name: String,
    /// Source (queue/subscription/session) address.
    pub address: String,
    /// Whether this link was created through `create_session` at all (§4.1), distinct from
    /// `session_id`: a "next available session" receiver is in session mode with `session_id ==
    /// None`, the same shape as a plain (non-session) receiver, so this flag is what actually
    /// distinguishes them.
    pub is_session_receiver: bool,
    /// Session id to scope the link to, for session receivers.
    pub session_id: Option<String>,
    /// Whether this is a non-consuming (peek-only) session receiver (I4).
    pub browsable: bool,
    /// Server-side operation timeout advertised as a link property, if any.
    pub server_timeout: Option<Duration>,
    /// Additional application-supplied link properties.
    pub properties: Option<Fields>,
    /// Negotiated sender settle mode. `Settled` means every inbound delivery is already
    /// considered settled by the sender (§6 "If sender is SETTLED, inbound deliveries are
    /// auto-accepted and immediately settled locally").
    pub sender_settle_mode: SenderSettleMode,
    /// Negotiated receiver settle mode (first = auto-settle on receipt, second = explicit
    /// disposition round trip).
    pub receiver_settle_mode: ReceiverSettleMode,
}

/// Current phase of the link lifecycle state machine (§7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// No attach attempt has been made yet.
    Init,
    /// An attach is in flight.
    Opening,
    /// The link is attached and usable.
    Open,
    /// A transient failure occurred; a reattach is in flight.
    Reopening,
    /// The link has closed (terminally) and will not reopen.
    Closed,
}

/// Owns the live `Receiver` handle (when attached) plus the state machine around it.
pub struct LinkLifecycleManager {
    config: LinkConfig,
    state: LinkState,
    receiver: Option<Receiver>,
    session_locked_until: chrono::DateTime<chrono::Utc>,
    last_error: Option<Error>,
}

impl std::fmt::Debug for LinkLifecycleManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkLifecycleManager")
            .field("state", &self.state)
            .field("name", &self.config.name)
            .finish()
    }
}

impl LinkLifecycleManager {
    /// Creates a manager that has not yet attempted to attach.
    pub fn new(config: LinkConfig) -> Self {
        Self {
            config,
            state: LinkState::Init,
            receiver: None,
            session_locked_until: unknown_lock_expiry(),
            last_error: None,
        }
    }

    /// Current lifecycle phase.
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// The last non-fatal error observed, kept around so a subsequent failing call can report it
    /// as cause (§7 "remembered and returned as the cause of the next operation that fails").
    pub fn last_error(&self) -> Option<&Error> {
        self.last_error.as_ref()
    }

    /// Broker-reported session lock expiration, if this is a session receiver and the link has
    /// opened at least once.
    pub fn session_locked_until(&self) -> chrono::DateTime<chrono::Utc> {
        self.session_locked_until
    }

    /// Immutable access to the attached link, if currently `Open`.
    pub fn receiver(&self) -> Option<&Receiver> {
        self.receiver.as_ref()
    }

    /// Mutable access to the attached link, if currently `Open`.
    pub fn receiver_mut(&mut self) -> Option<&mut Receiver> {
        self.receiver.as_mut()
    }

    /// Whether the negotiated sender settle mode means every inbound delivery already arrives
    /// settled (§6): no tag registration or disposition is needed, only a local `accept`.
    pub fn sender_presettles(&self) -> bool {
        matches!(self.config.sender_settle_mode, SenderSettleMode::Settled)
    }

    fn build_source(&self) -> Source {
        let mut builder = Source::builder().address(self.config.address.clone());
        if let Some(session_id) = &self.config.session_id {
            builder = builder.filter(session_filter_set(session_id));
        }
        builder.build()
    }

    fn build_properties(&self) -> Option<Fields> {
        let mut fields = self.config.properties.clone().unwrap_or_default();
        if let Some(timeout) = self.config.server_timeout {
            fields.insert(
                SERVER_TIMEOUT_PROPERTY.into(),
                Value::UInt(timeout.as_millis() as u32),
            );
        }
        if self.config.browsable {
            fields.insert(PEEK_MODE_PROPERTY.into(), Value::Bool(true));
        }
        if fields.as_inner().is_empty() {
            None
        } else {
            Some(fields)
        }
    }

    /// Attempts to attach the link for the first time, or to reattach after a transient
    /// failure. `session` is the AMQP session the link should live on.
    ///
    /// On success, transitions to `Open` and decodes the session-filter echo and
    /// `locked-until-utc` property if this is a session receiver (P7).
    pub async fn open<R>(&mut self, session: &mut SessionHandle<R>) -> Result<(), Error> {
        self.state = LinkState::Opening;
        let source = self.build_source();
        let properties = self.build_properties();

        let result = Receiver::builder()
            .name(self.config.name.clone())
            .source(Some(source))
            .sender_settle_mode(self.config.sender_settle_mode)
            .receiver_settle_mode(self.config.receiver_settle_mode)
            .credit_mode(CreditMode::Manual)
            .properties(properties.unwrap_or_default())
            .attach(session)
            .await;

        let receiver = match result {
            Ok(receiver) => receiver,
            Err(attach_error) => {
                log_warn!("receive link attach failed: {:?}", attach_error);
                self.state = LinkState::Init;
                return Err(self.fail_attach(attach_error));
            }
        };

        if let Err(err) = self.validate_opened_source(&receiver) {
            self.state = LinkState::Init;
            self.last_error = Some(err.clone());
            return Err(err);
        }

        self.apply_locked_until(&receiver);
        self.receiver = Some(receiver);
        self.state = LinkState::Open;
        self.last_error = None;
        Ok(())
    }

    fn fail_attach(&mut self, attach_error: ReceiverAttachError) -> Error {
        let error = Error::Transient(None);
        self.last_error = Some(error.clone());
        log_debug!("attach_error = {:?}", attach_error);
        error
    }

    /// Checks that a session receiver's remote source actually echoed the requested session
    /// filter (or assigned one, for a next-available-session request), per P7. Gated on
    /// `is_session_receiver` rather than `session_id.is_some()`, since a "next available session"
    /// receiver has `session_id == None` and still requires the echo.
    fn validate_opened_source(&self, receiver: &Receiver) -> Result<(), Error> {
        if !self.config.is_session_receiver {
            return Ok(());
        }
        let source = receiver.source().as_ref();
        let echoed = source
            .map(|s| echoed_session_id(&s.filter.clone().unwrap_or_default()))
            .unwrap_or(None);
        if echoed.is_none() {
            return Err(Error::SessionFilterMissing);
        }
        Ok(())
    }

    fn apply_locked_until(&mut self, receiver: &Receiver) {
        let ticks = receiver.properties(|fields| {
            fields.as_ref().and_then(|fields| {
                fields
                    .get(&fe2o3_amqp_types::primitives::Symbol::from(
                        LOCKED_UNTIL_UTC_PROPERTY,
                    ))
                    .and_then(|value| match value {
                        Value::Long(ticks) => Some(*ticks),
                        Value::ULong(ticks) => Some(*ticks as i64),
                        _ => None,
                    })
            })
        });
        self.session_locked_until = match ticks {
            Some(ticks) => ticks_to_utc(ticks),
            None => unknown_lock_expiry(),
        };
    }

    /// Marks the link as failed with a transient error, moving to `Reopening`; the reactor is
    /// expected to call [`open`](Self::open) again after the retry policy's delay.
    pub fn mark_transient_failure(&mut self, error: Option<definitions::Error>) {
        self.state = LinkState::Reopening;
        self.receiver = None;
        self.last_error = Some(Error::Transient(error));
    }

    /// Marks the link as terminally closed; no further reattach will be attempted.
    pub fn mark_closed(&mut self, error: Option<definitions::Error>) {
        self.state = LinkState::Closed;
        self.receiver = None;
        self.last_error = Some(Error::Closed(error));
    }

    /// Detaches (without closing) the underlying link, used before a reattach driven by
    /// `mark_transient_failure`. A failure to detach cleanly is logged but not treated as fatal:
    /// the broker will eventually time out the stale link on its own.
    pub async fn detach_for_reopen(&mut self) {
        if let Some(receiver) = self.receiver.take() {
            if let Err((_, err)) = receiver.detach().await {
                log_debug!("detach before reopen failed, proceeding anyway: {:?}", err);
            }
        }
        self.state = LinkState::Reopening;
    }

    /// Closes the link for good (§5 "fails all pending work" precedes this at the reactor
    /// level; this only tears down the wire-level link).
    pub async fn close(&mut self) -> Result<(), DetachError> {
        self.state = LinkState::Closed;
        match self.receiver.take() {
            Some(receiver) => receiver.close().await,
            None => Ok(()),
        }
    }
}

/// Classifies a [`RecvError`] or [`LinkDispositionError`] observed on the open link as either a
/// transient condition (worth a reattach) or terminal, consulting `filters` only for the
/// message rendering used in logs.
pub fn classify_recv_error(error: &RecvError) -> bool {
    let rendered = format!("{error:?}").to_ascii_lowercase();
    rendered.contains("timeout") || rendered.contains("detached") || rendered.contains("closed")
}

/// Same classification for disposition-path errors (used by the reactor when `dispose()`
/// itself fails at the transport level, not when the broker returns a retryable outcome).
pub fn classify_disposition_error(error: &LinkDispositionError) -> bool {
    let rendered = format!("{error:?}").to_ascii_lowercase();
    rendered.contains("timeout") || rendered.contains("detached")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> LinkConfig {
        LinkConfig {
            name: "link-1".to_string(),
            address: "queue-1".to_string(),
            is_session_receiver: false,
            session_id: None,
            browsable: false,
            server_timeout: Some(Duration::from_secs(30)),
            properties: None,
            sender_settle_mode: SenderSettleMode::Mixed,
            receiver_settle_mode: ReceiverSettleMode::Second,
        }
    }

    #[test]
    fn starts_in_init_state() {
        let manager = LinkLifecycleManager::new(config());
        assert_eq!(manager.state(), LinkState::Init);
        assert_eq!(manager.session_locked_until(), unknown_lock_expiry());
    }

    #[test]
    fn build_properties_carries_server_timeout_in_millis() {
        let manager = LinkLifecycleManager::new(config());
        let fields = manager.build_properties().unwrap();
        assert_eq!(
            fields.get(&fe2o3_amqp_types::primitives::Symbol::from(
                SERVER_TIMEOUT_PROPERTY
            )),
            Some(&Value::UInt(30_000))
        );
    }

    #[test]
    fn no_properties_configured_is_none() {
        let cfg = LinkConfig {
            server_timeout: None,
            ..config()
        };
        let manager = LinkLifecycleManager::new(cfg);
        assert!(manager.build_properties().is_none());
    }

    #[test]
    fn mark_transient_failure_moves_to_reopening() {
        let mut manager = LinkLifecycleManager::new(config());
        manager.mark_transient_failure(None);
        assert_eq!(manager.state(), LinkState::Reopening);
        assert!(manager.receiver_mut().is_none());
    }

    #[test]
    fn mark_closed_is_terminal() {
        let mut manager = LinkLifecycleManager::new(config());
        manager.mark_closed(None);
        assert_eq!(manager.state(), LinkState::Closed);
    }
}
