//! Error types for the tool layer.

use homebase_mcp::McpError;

use crate::payload::PayloadError;

/// Result type for tool operations.
pub type Result<T> = std::result::Result<T, ToolsError>;

/// Error type for tool operations.
#[derive(Debug, thiserror::Error)]
pub enum ToolsError {
    /// The service session failed (not connected, timeout, channel lost).
    #[error(transparent)]
    Session(#[from] McpError),

    /// The service answered but its payload was unusable.
    #[error(transparent)]
    Payload(#[from] PayloadError),

    /// A caller-supplied value was rejected before anything was sent.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No service with this name is managed by the adapter.
    #[error("unknown service '{0}'")]
    UnknownService(String),
}

impl ToolsError {
    /// Create an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// The raw response excerpt, for payload errors.
    pub fn raw_excerpt(&self) -> Option<&str> {
        match self {
            Self::Payload(e) if !e.raw_excerpt.is_empty() => Some(&e.raw_excerpt),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_transparent_for_wrapped_errors() {
        let err: ToolsError = McpError::not_connected("finance").into();
        assert!(err.to_string().contains("finance"));
        assert!(err.raw_excerpt().is_none());

        let err: ToolsError = PayloadError::new("No data found in response", "hello").into();
        assert_eq!(err.to_string(), "No data found in response");
        assert_eq!(err.raw_excerpt(), Some("hello"));
    }

    #[test]
    fn test_empty_excerpt_is_omitted() {
        let err: ToolsError = PayloadError::new("No data", "").into();
        assert!(err.raw_excerpt().is_none());
    }

    #[test]
    fn test_input_and_service_errors() {
        assert_eq!(
            ToolsError::invalid_input("income must be finite").to_string(),
            "invalid input: income must be finite"
        );
        assert_eq!(
            ToolsError::UnknownService("weather".into()).to_string(),
            "unknown service 'weather'"
        );
    }
}
