use std::fmt;
use std::io;

use thiserror::Error;

/// Why a summarization call stopped before the stream completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The call's deadline elapsed.
    DeadlineExceeded,
    /// Someone called [`CancelHandle::cancel`](crate::CancelHandle::cancel).
    Requested,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::DeadlineExceeded => f.write_str("deadline exceeded"),
            CancelReason::Requested => f.write_str("cancellation requested"),
        }
    }
}

/// Everything that can go wrong between building a [`Summarizer`](crate::Summarizer)
/// and receiving a finished summary.
#[derive(Debug, Error)]
pub enum SummarizeError {
    /// The endpoint or transport could not be built from the configuration
    /// or the environment.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The inference server failed or the stream broke off before it was done.
    #[error("stream error: {0}")]
    Stream(String),

    /// The caller's deadline or cancellation fired first.
    #[error("summarization cancelled: {0}")]
    Cancelled(CancelReason),
}

impl From<io::Error> for SummarizeError {
    fn from(err: io::Error) -> Self {
        SummarizeError::Stream(format!("failed to read response stream: {err}"))
    }
}

impl SummarizeError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SummarizeError::Cancelled(_))
    }

    pub fn is_stream(&self) -> bool {
        matches!(self, SummarizeError::Stream(_))
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, SummarizeError::Configuration(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_kind() {
        let err = SummarizeError::Stream("model 'x' not found".into());
        assert_eq!(err.to_string(), "stream error: model 'x' not found");

        let err = SummarizeError::Cancelled(CancelReason::DeadlineExceeded);
        assert_eq!(err.to_string(), "summarization cancelled: deadline exceeded");
        assert!(err.is_cancelled());
        assert!(!err.is_stream());
    }

    #[test]
    fn read_errors_are_stream_errors() {
        let err: SummarizeError = io::Error::new(io::ErrorKind::ConnectionReset, "gone").into();
        assert!(err.is_stream());
        assert!(err.to_string().contains("gone"));
    }
}
