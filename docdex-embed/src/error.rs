//! Error types for the embedding system

use std::time::Duration;

/// Result type for embedding operations.
///
/// This is a convenience type alias that uses [`EmbedError`] as the error type.
/// Used throughout the crate for operations that can fail.
pub type Result<T> = std::result::Result<T, EmbedError>;

/// Comprehensive error type for all embedding operations.
///
/// This enum covers all possible error conditions that can occur when working
/// with embedding providers, from configuration errors to runtime failures
/// during embedding generation. Each variant provides specific context about
/// the failure.
///
/// The error type integrates with the [`thiserror`] crate for automatic
/// [`std::error::Error`] implementation and supports error chaining for
/// detailed error context.
///
/// Consumers treat [`EmbedError::ProviderUnavailable`] and
/// [`EmbedError::Timeout`] as recoverable: both signal that the provider
/// cannot answer right now and the caller should degrade to a non-semantic
/// search path.
#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    /// The provider could not be reached or initialized
    #[error("Embedding provider unavailable: {message}")]
    ProviderUnavailable { message: String },

    /// An embedding call exceeded its configured time bound
    #[error("Embedding call timed out after {elapsed:?}")]
    Timeout { elapsed: Duration },

    /// Error when provider configuration is invalid
    #[error("Invalid provider configuration: {message}")]
    InvalidConfig { message: String },

    /// IO errors when loading model files
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Async task join errors
    #[error("Async task failed: {source}")]
    AsyncTask {
        #[from]
        source: tokio::task::JoinError,
    },

    /// Generic errors from other libraries
    #[error("External error: {source}")]
    External {
        #[from]
        source: anyhow::Error,
    },
}

impl EmbedError {
    /// Create a provider-unavailable error with a custom message.
    ///
    /// # Arguments
    /// * `message` - A descriptive message explaining why the provider cannot be used
    ///
    /// # Returns
    /// A new [`EmbedError::ProviderUnavailable`] variant
    pub fn provider_unavailable<S: Into<String>>(message: S) -> Self {
        Self::ProviderUnavailable {
            message: message.into(),
        }
    }

    /// Create a timeout error for a call bounded by `elapsed`.
    ///
    /// # Arguments
    /// * `elapsed` - The time bound that was exceeded
    ///
    /// # Returns
    /// A new [`EmbedError::Timeout`] variant
    pub fn timeout(elapsed: Duration) -> Self {
        Self::Timeout { elapsed }
    }

    /// Create an invalid configuration error with a custom message.
    ///
    /// # Arguments
    /// * `message` - A descriptive error message explaining what's wrong with the configuration
    ///
    /// # Returns
    /// A new [`EmbedError::InvalidConfig`] variant
    pub fn invalid_config<S: Into<String>>(message: S) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Whether this failure is expected to clear on its own.
    ///
    /// Unavailable providers and timed-out calls are transient from the
    /// caller's point of view; configuration and IO problems are not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ProviderUnavailable { .. } | Self::Timeout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EmbedError::provider_unavailable("model not loaded");
        assert_eq!(
            err.to_string(),
            "Embedding provider unavailable: model not loaded"
        );

        let err = EmbedError::timeout(Duration::from_millis(250));
        assert!(err.to_string().contains("250ms"));
    }

    #[test]
    fn test_transient_classification() {
        assert!(EmbedError::provider_unavailable("down").is_transient());
        assert!(EmbedError::timeout(Duration::from_secs(1)).is_transient());
        assert!(!EmbedError::invalid_config("bad model name").is_transient());
    }
}
