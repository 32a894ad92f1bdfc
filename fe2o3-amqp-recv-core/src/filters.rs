//! `com.microsoft:session-filter` source filter and `com.microsoft:locked-until-utc` property
//! decoding (§6).
//!
//! These are broker-specific extensions, not part of the AMQP 1.0 core spec, so they live
//! alongside the receiver core rather than in `fe2o3-amqp-ext` (which only carries the
//! Apache-filters registry). The pattern mirrors `fe2o3-amqp-ext::filters`: a thin described-type
//! wrapper plus a `FilterSet` entry.

use chrono::{DateTime, TimeZone, Utc};
use fe2o3_amqp_types::{
    messaging::FilterSet,
    primitives::{Symbol, Value},
};
use serde_amqp::{described::Described, descriptor::Descriptor};

/// Key of the session-scoping source filter.
pub const SESSION_FILTER_NAME: &str = "com.microsoft:session-filter";

/// Property key carrying the broker-assigned lock expiration for a session receiver.
pub const LOCKED_UNTIL_UTC_PROPERTY: &str = "com.microsoft:locked-until-utc";

/// Server-side operation timeout link property, in milliseconds.
pub const SERVER_TIMEOUT_PROPERTY: &str = "com.microsoft:timeout";

/// Peek-mode (browsable) link property for session receivers.
pub const PEEK_MODE_PROPERTY: &str = "com.microsoft:peek-mode";

/// Dead-letter rejection condition (§6, §4.5).
pub const DEAD_LETTER_NAME: &str = "com.microsoft:dead-letter";

/// .NET `DateTime.Ticks` epoch: 0001-01-01T00:00:00Z, in 100ns units. The broker encodes
/// `locked-until-utc` relative to this epoch rather than the Unix epoch.
const DOTNET_TICKS_EPOCH_OFFSET_SECONDS: i64 = 62_135_596_800;
const TICKS_PER_SECOND: i64 = 10_000_000;

/// Builds the `FilterSet` entry that scopes a receive link to a single session id.
pub fn session_filter_set(session_id: &str) -> FilterSet {
    let mut filters = FilterSet::new();
    filters.insert(
        Symbol::from(SESSION_FILTER_NAME),
        Some(Described {
            descriptor: Descriptor::Name(Symbol::from(SESSION_FILTER_NAME)),
            value: Value::String(session_id.to_string()),
        }),
    );
    filters
}

/// Reads the session id echoed back by the remote source's filter set, if any.
pub fn echoed_session_id(filters: &FilterSet) -> Option<String> {
    filters
        .get(&Symbol::from(SESSION_FILTER_NAME))
        .and_then(|described| described.as_ref())
        .and_then(|described| match &described.value {
            Value::String(s) => Some(s.clone()),
            _ => None,
        })
}

/// Converts a .NET `DateTime.Ticks` value (as carried in the `locked-until-utc` remote property)
/// into a UTC instant. Absence of the property is represented by the caller as `epoch 0` (§3),
/// not by this function.
pub fn ticks_to_utc(ticks: i64) -> DateTime<Utc> {
    let total_seconds = ticks / TICKS_PER_SECOND - DOTNET_TICKS_EPOCH_OFFSET_SECONDS;
    let subsecond_ticks = (ticks % TICKS_PER_SECOND).unsigned_abs() as u32;
    let nanos = subsecond_ticks * 100;
    Utc.timestamp_opt(total_seconds, nanos)
        .single()
        .unwrap_or_else(|| DateTime::<Utc>::from_timestamp(0, 0).expect("epoch is valid"))
}

/// The "unknown" sentinel for `session_locked_until` per §3 ("epoch 0 means unknown").
pub fn unknown_lock_expiry() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(0, 0).expect("epoch is valid")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_filter_round_trips_through_echo() {
        let filters = session_filter_set("session-1");
        assert_eq!(echoed_session_id(&filters).as_deref(), Some("session-1"));
    }

    #[test]
    fn missing_filter_echoes_nothing() {
        let filters = FilterSet::new();
        assert_eq!(echoed_session_id(&filters), None);
    }

    #[test]
    fn ticks_epoch_maps_to_dotnet_epoch() {
        // Tick value 0 corresponds to 0001-01-01T00:00:00Z, which predates the Unix epoch.
        let instant = ticks_to_utc(0);
        assert_eq!(instant.timestamp(), -DOTNET_TICKS_EPOCH_OFFSET_SECONDS);
    }

    #[test]
    fn unknown_lock_expiry_is_epoch_zero() {
        assert_eq!(unknown_lock_expiry().timestamp(), 0);
    }
}
