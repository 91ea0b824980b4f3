//! Session-level failures.

use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, McpError>;

/// Everything that can go wrong between spawning a service and reading
/// a tool result back.
#[derive(Debug, Error)]
pub enum McpError {
    /// The process could not be started or its pipes were not captured.
    #[error("cannot start service: {0}")]
    SpawnFailed(String),

    /// Writing to the process failed.
    #[error("stdio channel broken: {0}")]
    Transport(String),

    /// The service sent something that is not the expected MCP shape.
    #[error("unexpected reply: {0}")]
    Protocol(String),

    #[error("bad JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON-RPC error object returned for one of our requests.
    #[error("service returned error {code}: {message}")]
    ServerError {
        code: i64,
        message: String,
        data: Option<serde_json::Value>,
    },

    #[error("service '{0}' is not connected")]
    NotConnected(String),

    /// End of stream on the process's stdout.
    #[error("service closed its output")]
    ConnectionClosed,

    #[error("timed out after {}ms waiting for {operation}", .after.as_millis())]
    Timeout {
        /// `initialize`, `tools/list` or `tools/call`.
        operation: String,
        after: Duration,
    },
}

impl McpError {
    pub fn spawn_failed(msg: impl Into<String>) -> Self {
        Self::SpawnFailed(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    pub fn server_error(
        code: i64,
        message: impl Into<String>,
        data: Option<serde_json::Value>,
    ) -> Self {
        Self::ServerError {
            code,
            message: message.into(),
            data,
        }
    }

    pub fn not_connected(service: impl Into<String>) -> Self {
        Self::NotConnected(service.into())
    }

    pub fn timeout(operation: impl Into<String>, after: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            after,
        }
    }

    /// Whether the channel to the process is gone.
    ///
    /// A session that sees one of these tears itself down.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ConnectionClosed | Self::Io(_) | Self::Transport(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_details() {
        let err = McpError::spawn_failed("command not found");
        assert_eq!(err.to_string(), "cannot start service: command not found");

        let err = McpError::server_error(-32603, "Internal error", None);
        assert!(err.to_string().contains("-32603"));
        assert!(err.to_string().contains("Internal error"));

        let err = McpError::not_connected("finance");
        assert_eq!(err.to_string(), "service 'finance' is not connected");
    }

    #[test]
    fn test_timeout_display() {
        let err = McpError::timeout("initialize", Duration::from_millis(1500));
        assert_eq!(
            err.to_string(),
            "timed out after 1500ms waiting for initialize"
        );
    }

    #[test]
    fn test_fatal_classification() {
        assert!(McpError::ConnectionClosed.is_fatal());
        assert!(McpError::transport("stdin closed").is_fatal());
        assert!(!McpError::timeout("tools/call", Duration::from_secs(1)).is_fatal());
        assert!(!McpError::server_error(-32601, "nope", None).is_fatal());
        assert!(!McpError::not_connected("x").is_fatal());
    }

    #[test]
    fn test_conversions() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(matches!(McpError::from(json_err), McpError::Json(_)));

        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err = McpError::from(io_err);
        assert!(matches!(err, McpError::Io(_)));
        assert!(err.is_fatal());
    }
}
