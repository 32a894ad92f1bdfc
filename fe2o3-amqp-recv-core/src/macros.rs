//! Small helpers pairing the `tracing`/`log` optional-dependency convention `fe2o3-amqp` itself
//! uses at call sites (see e.g. `fe2o3_amqp::session::engine`): every log statement is emitted
//! through both backends behind their own `cfg(feature = ...)`, so downstream users can pick
//! either (or neither) without pulling in both logging ecosystems.

macro_rules! log_debug {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        tracing::debug!($($arg)*);
        #[cfg(feature = "log")]
        log::debug!($($arg)*);
    };
}

macro_rules! log_warn {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        tracing::warn!($($arg)*);
        #[cfg(feature = "log")]
        log::warn!($($arg)*);
    };
}

macro_rules! log_error {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        tracing::error!($($arg)*);
        #[cfg(feature = "log")]
        log::error!($($arg)*);
    };
}

pub(crate) use log_debug;
pub(crate) use log_error;
pub(crate) use log_warn;
