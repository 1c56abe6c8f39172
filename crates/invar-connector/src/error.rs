//! Source adapter error types
//!
//! Error definitions with transient/permanent classification, so callers
//! can tell a flaky network from a misconfigured adapter.

use thiserror::Error;

/// Error that can occur during adapter operations.
#[derive(Debug, Error)]
pub enum ConnectorError {
    // Connection errors (usually transient)
    /// Failed to establish connection to the source system.
    #[error("connection failed: {message}")]
    ConnectionFailed {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Connection or probe timed out.
    #[error("connection timeout after {timeout_secs} seconds")]
    ConnectionTimeout { timeout_secs: u64 },

    /// Source system is temporarily unavailable.
    #[error("source unavailable: {message}")]
    Unavailable { message: String },

    // Authentication errors (usually permanent)
    /// Invalid credentials provided.
    #[error("authentication failed: invalid credentials")]
    AuthenticationFailed,

    // Configuration errors (permanent)
    /// Adapter configuration is invalid.
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },
}

impl ConnectorError {
    /// Shorthand for a temporary availability failure.
    pub fn unavailable(message: impl Into<String>) -> Self {
        ConnectorError::Unavailable {
            message: message.into(),
        }
    }

    /// Whether retrying later could succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ConnectorError::ConnectionFailed { .. }
                | ConnectorError::ConnectionTimeout { .. }
                | ConnectorError::Unavailable { .. }
        )
    }
}

/// Result type for adapter operations.
pub type ConnectorResult<T> = Result<T, ConnectorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(ConnectorError::unavailable("503").is_transient());
        assert!(ConnectorError::ConnectionTimeout { timeout_secs: 30 }.is_transient());
        assert!(!ConnectorError::AuthenticationFailed.is_transient());
        assert!(!ConnectorError::InvalidConfiguration {
            message: "missing endpoint".to_string()
        }
        .is_transient());
    }
}
