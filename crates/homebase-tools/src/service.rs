//! Helpers shared by the typed service clients.

use homebase_mcp::ToolSession;
use serde_json::Value;

use crate::error::Result;
use crate::payload::{PayloadError, excerpt};

/// A shared, type-erased session.
pub type SharedSession = std::sync::Arc<dyn ToolSession>;

/// Call `tool` and return the first text block of a successful result.
///
/// An `isError` result or a result without text becomes a [`PayloadError`].
pub(crate) async fn call_text(session: &dyn ToolSession, tool: &str, arguments: Value) -> Result<String> {
    let result = session.call_tool(tool, arguments).await?;
    let text = result.first_text().map(str::to_string);

    if result.is_error() {
        let text = text.unwrap_or_default();
        tracing::warn!(
            service = %session.name(),
            tool,
            excerpt = %excerpt(&text),
            "tool reported an error"
        );
        let reason = if text.trim().is_empty() {
            format!("tool '{}' reported an error", tool)
        } else {
            text.trim().to_string()
        };
        return Err(PayloadError::new(reason, &text).into());
    }

    text.ok_or_else(|| PayloadError::new("No results found", "").into())
}

/// Log a payload failure with its excerpt and pass it on.
pub(crate) fn log_payload<T>(
    service: &str,
    tool: &str,
    result: std::result::Result<T, PayloadError>,
) -> Result<T> {
    result.map_err(|e| {
        tracing::warn!(
            service,
            tool,
            reason = %e.reason,
            excerpt = %e.raw_excerpt,
            "failed to parse service response"
        );
        e.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolsError;
    use crate::mock::{MockResponse, MockSession};
    use serde_json::json;

    #[tokio::test]
    async fn test_call_text_success() {
        let session = MockSession::new("finance").respond_text("42").connected();
        let text = call_text(&session, "t", json!({})).await.unwrap();
        assert_eq!(text, "42");
    }

    #[tokio::test]
    async fn test_call_text_tool_error() {
        let session = MockSession::new("finance")
            .respond(MockResponse::ToolError("income must be positive".into()))
            .connected();
        let err = call_text(&session, "t", json!({})).await.unwrap_err();
        match err {
            ToolsError::Payload(p) => assert_eq!(p.reason, "income must be positive"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_call_text_empty_content() {
        let session = MockSession::new("finance")
            .respond(MockResponse::Empty)
            .connected();
        let err = call_text(&session, "t", json!({})).await.unwrap_err();
        assert_eq!(err.to_string(), "No results found");
    }

    #[tokio::test]
    async fn test_call_text_session_error() {
        let session = MockSession::new("finance");
        let err = call_text(&session, "t", json!({})).await.unwrap_err();
        assert!(matches!(err, ToolsError::Session(_)));
    }
}
