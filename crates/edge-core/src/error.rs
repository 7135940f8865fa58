//! Platform error types.

/// Error type for streaming and section operations.
#[derive(Debug, thiserror::Error)]
pub enum WorkloadError {
    #[error("Shell not sent before sections")]
    ShellNotSent,

    #[error("Shell already sent")]
    ShellAlreadySent,

    #[error("Response already completed")]
    Completed,

    #[error("Streaming error: {0}")]
    StreamError(String),

    #[error("Section '{0}' failed: {1}")]
    SectionFailed(String, String),
}

impl WorkloadError {
    /// Check if the error means the client went away mid-stream.
    pub fn is_disconnect(&self) -> bool {
        matches!(self, Self::StreamError(_))
    }
}
