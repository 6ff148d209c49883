use thiserror::Error;

/// Errors returned by the dispatcher and the UI loop.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A thread-sensitive operation ran outside the UI loop while thread
    /// verification is enabled.
    #[error("{operation} must run on the UI loop thread (called from '{thread}')")]
    ThreadAffinity {
        operation: &'static str,
        thread: String,
    },

    /// `dispatch` was called while another dispatch was in flight on the same
    /// dispatcher: either nested inside a reducer or interceptor, or from a
    /// second thread when thread verification is disabled.
    #[error("cannot dispatch while another dispatch is in progress (nested or concurrent)")]
    Reentrant,

    /// A blocking hand-off to the UI loop was requested from the loop itself.
    #[error("{operation} called from the UI loop thread would deadlock")]
    SyncOnUiThread { operation: &'static str },

    /// The UI loop has shut down and no longer accepts work.
    #[error("UI loop is closed")]
    LoopClosed,

    /// Error raised by a reducer or interceptor, passed through unchanged.
    #[error(transparent)]
    Handler(#[from] anyhow::Error),
}

impl DispatchError {
    /// Whether this error reports misuse of the dispatcher itself rather
    /// than a failure inside a reducer or interceptor.
    pub fn is_usage_error(&self) -> bool {
        !matches!(self, DispatchError::Handler(_))
    }
}
