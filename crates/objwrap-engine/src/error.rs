//! Bridge error types

use std::time::Duration;

use objwrap_sdk::NativeError;
use thiserror::Error;

/// Result type for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Errors surfaced by the bridge to its embedder
#[derive(Debug, Error)]
pub enum BridgeError {
    /// A proxy method received an argument of the wrong shape
    #[error("{method}: expected {expected}, got {got}")]
    InvalidArgument {
        method: &'static str,
        expected: &'static str,
        got: &'static str,
    },

    /// The method is not installed on this proxy
    #[error("{class} has no method '{method}'")]
    NoSuchMethod { class: String, method: String },

    /// Blocking work panicked on a worker thread
    #[error("blocking work panicked: {0}")]
    WorkerPanicked(String),

    /// A worker thread could not be started
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// The worker pool has been shut down
    #[error("runtime is shut down")]
    RuntimeShutdown,

    /// Pending tasks did not complete in time
    #[error("timed out after {elapsed:?} with {pending} task(s) pending")]
    Timeout { elapsed: Duration, pending: usize },

    /// Failure reported by the native object
    #[error(transparent)]
    Native(#[from] NativeError),
}

impl BridgeError {
    pub(crate) fn invalid_argument(
        method: &'static str,
        expected: &'static str,
        got: &'static str,
    ) -> Self {
        BridgeError::InvalidArgument {
            method,
            expected,
            got,
        }
    }
}
