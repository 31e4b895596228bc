//! Error types for rs2-duplex
//!
//! Streams themselves have no error channel: a delivery is either a value or the
//! termination signal. These errors only surface at the Rust-side edges of the API,
//! i.e. terminal futures and configuration.

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Main error type for rs2-duplex operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    /// Every handle to a consumer was dropped before the termination signal arrived
    #[error("stream was abandoned before delivering the termination signal")]
    Abandoned,
    /// A configuration value was rejected by validation
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<futures::channel::oneshot::Canceled> for StreamError {
    fn from(_: futures::channel::oneshot::Canceled) -> Self {
        StreamError::Abandoned
    }
}

/// Result type for rs2-duplex operations
pub type StreamResult<T> = Result<T, StreamError>;

/// Locks per-instance combinator state, recovering it if a callback panicked while it was held.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
