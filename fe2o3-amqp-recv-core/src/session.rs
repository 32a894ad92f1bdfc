//! Session Facet (C7, §3, §4.1, §6).
//!
//! Only constructed when a receiver is created in session mode. Carries the session id (may be
//! unset until the link opens and the remote source echoes the session filter), the broker's
//! lock expiration, and whether this is a non-consuming (browsable/peek) receiver.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::filters::unknown_lock_expiry;

/// Session-scoped state for a session receiver (§3).
#[derive(Debug, Clone)]
pub struct SessionFacet {
    session_id: Option<String>,
    session_locked_until: DateTime<Utc>,
    browsable: bool,
}

impl SessionFacet {
    /// Creates a facet for a session receiver about to be opened. `requested_session_id` is
    /// `None` for a "next available session" receiver, in which case the id is learned only
    /// once the remote source echoes it back.
    pub fn new(requested_session_id: Option<String>, browsable: bool) -> Self {
        Self {
            session_id: requested_session_id,
            session_locked_until: unknown_lock_expiry(),
            browsable,
        }
    }

    /// The session id, once known. `None` before the link has finished opening for a
    /// next-available-session receiver.
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Records the session id echoed back by the remote source on open, or by a subsequent
    /// management renewal.
    pub fn set_session_id(&mut self, session_id: String) {
        self.session_id = Some(session_id);
    }

    /// Current known lock expiration; `epoch 0` means unknown (§3).
    pub fn session_locked_until(&self) -> DateTime<Utc> {
        self.session_locked_until
    }

    /// Updates the lock expiration, e.g. after the link opens or a management lock renewal.
    pub fn set_session_locked_until(&mut self, locked_until: DateTime<Utc>) {
        self.session_locked_until = locked_until;
    }

    /// Whether this is a non-consuming (no credit, peek-only) session receiver (I4).
    pub fn is_browsable(&self) -> bool {
        self.browsable
    }
}

/// Thread-safe handle to a [`SessionFacet`], read by [`crate::handle::ReceiverHandle`] from any
/// thread and written by the reactor task, mirroring [`crate::context::ErrorContextHandle`]'s
/// shape (the facet is the other piece of reactor-owned state a caller needs synchronous,
/// cross-thread read access to).
#[derive(Debug, Clone)]
pub struct SessionFacetHandle {
    inner: Arc<Mutex<SessionFacet>>,
}

impl SessionFacetHandle {
    /// Wraps `facet` for sharing between the reactor task and the handle.
    pub fn new(facet: SessionFacet) -> Self {
        Self {
            inner: Arc::new(Mutex::new(facet)),
        }
    }

    /// The session id, once known.
    pub fn session_id(&self) -> Option<String> {
        self.inner.lock().session_id().map(str::to_string)
    }

    /// Records the session id echoed back by the remote source.
    pub fn set_session_id(&self, session_id: String) {
        self.inner.lock().set_session_id(session_id);
    }

    /// Current known lock expiration.
    pub fn session_locked_until(&self) -> DateTime<Utc> {
        self.inner.lock().session_locked_until()
    }

    /// Updates the lock expiration.
    pub fn set_session_locked_until(&self, locked_until: DateTime<Utc>) {
        self.inner.lock().set_session_locked_until(locked_until);
    }

    /// Whether this is a non-consuming (browsable) session receiver.
    pub fn is_browsable(&self) -> bool {
        self.inner.lock().is_browsable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_reads_reflect_writes() {
        let handle = SessionFacetHandle::new(SessionFacet::new(None, false));
        assert_eq!(handle.session_id(), None);
        handle.set_session_id("s1".to_string());
        assert_eq!(handle.session_id().as_deref(), Some("s1"));
    }

    #[test]
    fn starts_with_unknown_lock_expiry() {
        let facet = SessionFacet::new(Some("s1".to_string()), false);
        assert_eq!(facet.session_locked_until(), unknown_lock_expiry());
        assert_eq!(facet.session_id(), Some("s1"));
    }

    #[test]
    fn next_available_session_starts_without_an_id() {
        let facet = SessionFacet::new(None, false);
        assert_eq!(facet.session_id(), None);
    }
}
