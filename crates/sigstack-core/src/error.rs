//! Error types for the sigstack core.

/// Core error type for sigstack infrastructure.
#[derive(Debug, thiserror::Error)]
pub enum SigstackError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Convenience result type for sigstack operations.
pub type SigstackResult<T> = Result<T, SigstackError>;
