//! Core error type
//!
//! Error types for GOP cache and fan-out operations. Grounded on the
//! registry's manual `Display`/`Error` style rather than a derive macro,
//! since there are exactly three variants and two of them are routine
//! control-flow signals, not failures (see `CacheError` docs).

use std::fmt;

/// Error type for cache and fan-out operations
///
/// `Backpressure` and `Declined` are first-class signals, not error
/// conditions: `Backpressure` means the outbound queue is full and the
/// caller should retry once the sender drains it; `Declined` means
/// caching is disabled for this app and the caller should fall through to
/// its default forwarding path. Neither should be logged at error
/// severity by callers. Only `Internal` represents an actual failure
/// (e.g. a context allocation failure) that the caller will typically
/// respond to by tearing down the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Outbound queue (or publisher cache ring) is full; retry later
    Backpressure,
    /// Allocation or invariant failure; caller should tear down the session
    Internal(String),
    /// Caching is disabled for this app (`cache_time == 0`)
    Declined,
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::Backpressure => write!(f, "backpressure: outbound queue full"),
            CacheError::Internal(msg) => write!(f, "internal error: {msg}"),
            CacheError::Declined => write!(f, "declined: caching disabled for this app"),
        }
    }
}

impl std::error::Error for CacheError {}
