//! Credit-flow pull receiver core.
//!
//! This crate sits beside [`fe2o3_amqp_management`] and [`fe2o3_amqp_cbs`] the way those two
//! crates sit beside [`fe2o3_amqp`] itself: it adds nothing to the wire protocol and instead
//! translates `fe2o3_amqp`'s link/session primitives into an asynchronous, promise-returning
//! pull API with prefetch, credit batching, disposition tracking with retry, lock-token based
//! management operations, and session-scoped consumption.
//!
//! The receiver runs as a single tokio task (the "reactor" of the design) that owns the
//! underlying [`fe2o3_amqp::link::Receiver`] exclusively; callers reach it only through
//! [`ReceiverHandle`], which posts [`control::ReceiverControl`] messages across an `mpsc`
//! channel and awaits a `oneshot` reply. This mirrors the `ConnectionControl`/`SessionControl`
//! dispatcher idiom already used by `fe2o3-amqp` itself (see `fe2o3_amqp::control`).

mod macros;

pub mod context;
pub mod control;
pub mod credit;
pub mod disposition;
pub mod error;
pub mod filters;
pub mod handle;
pub mod lifecycle;
pub mod management;
pub mod prefetch;
pub mod reactor;
pub mod receive_queue;
pub mod registry;
pub mod retry;
pub mod session;

pub use context::ErrorContext;
pub use error::{
    DispositionError, LinkLifecycleError, ManagementError, ReceiverError, SessionError,
};
pub use handle::{ReceiverHandle, ReceiverOptions, SpawnedReceiver};
pub use management::{DeadLetterDetails, DispositionStatus, PeekedMessage, ReceivedMessage};
pub use retry::{FixedJitterBackoff, RetryPolicy};
pub use session::SessionFacet;

/// Outcome the caller intends for a previously received message.
///
/// Maps onto the protocol outcomes exactly as spec'd: `Complete` becomes `accepted`,
/// `Abandon`/`Defer` become `modified` (with `undeliverable_here` set for defer), and
/// `DeadLetter` becomes `rejected` with the broker's dead-letter error condition.
#[derive(Debug, Clone)]
pub enum IntendedOutcome {
    /// Accept the message; it will not be redelivered.
    Complete,
    /// Make the message available for redelivery without penalizing its delivery count.
    Abandon,
    /// Make the message unavailable to this receiver without expiring its lock elsewhere.
    Defer,
    /// Move the message to the dead-letter queue with the given details.
    DeadLetter(DeadLetterDetails),
}
