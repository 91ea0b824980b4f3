//! A scripted in-process session for tests.

use std::collections::VecDeque;

use async_trait::async_trait;
use homebase_mcp::{CallToolResult, McpError, SessionState, ToolInfo, ToolSession};
use parking_lot::Mutex;
use serde_json::Value;

/// One scripted reply from a [`MockSession`].
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// A successful result with one text block.
    Text(String),
    /// A result flagged `isError` with one text block.
    ToolError(String),
    /// A successful result with no content blocks.
    Empty,
    /// The call times out; the session stays connected.
    Timeout,
    /// The channel closes; the session drops to disconnected.
    Closed,
}

/// A [`ToolSession`] that replays scripted responses in order.
///
/// Records every call so tests can assert on the arguments sent.
#[derive(Debug)]
pub struct MockSession {
    name: String,
    tools: Vec<ToolInfo>,
    connect_error: Option<String>,
    state: Mutex<SessionState>,
    responses: Mutex<VecDeque<MockResponse>>,
    calls: Mutex<Vec<(String, Value)>>,
    connects: Mutex<usize>,
}

impl MockSession {
    /// Create a disconnected mock with no scripted responses.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tools: Vec::new(),
            connect_error: None,
            state: Mutex::new(SessionState::Disconnected),
            responses: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            connects: Mutex::new(0),
        }
    }

    /// Advertise tools with these names.
    pub fn with_tools(mut self, names: &[&str]) -> Self {
        self.tools = names
            .iter()
            .map(|name| ToolInfo {
                name: name.to_string(),
                description: None,
                input_schema: None,
            })
            .collect();
        self
    }

    /// Make every `connect` fail with a spawn error carrying `message`.
    pub fn failing_connect(mut self, message: impl Into<String>) -> Self {
        self.connect_error = Some(message.into());
        self
    }

    /// Queue a response.
    pub fn respond(self, response: MockResponse) -> Self {
        self.responses.lock().push_back(response);
        self
    }

    /// Queue a successful text response.
    pub fn respond_text(self, text: impl Into<String>) -> Self {
        self.respond(MockResponse::Text(text.into()))
    }

    /// Start in the connected state.
    pub fn connected(self) -> Self {
        *self.state.lock() = SessionState::Connected;
        self
    }

    /// Calls made so far, as `(tool, arguments)`.
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().clone()
    }

    /// Number of `connect` attempts.
    pub fn connect_count(&self) -> usize {
        *self.connects.lock()
    }
}

#[async_trait]
impl ToolSession for MockSession {
    fn name(&self) -> &str {
        &self.name
    }

    fn state(&self) -> SessionState {
        *self.state.lock()
    }

    async fn connect(&self) -> homebase_mcp::Result<()> {
        *self.connects.lock() += 1;
        if let Some(ref message) = self.connect_error {
            *self.state.lock() = SessionState::Disconnected;
            return Err(McpError::spawn_failed(message.clone()));
        }
        *self.state.lock() = SessionState::Connected;
        Ok(())
    }

    async fn disconnect(&self) {
        *self.state.lock() = SessionState::Disconnected;
    }

    async fn list_tools(&self) -> homebase_mcp::Result<Vec<ToolInfo>> {
        if !self.is_connected() {
            return Err(McpError::not_connected(self.name.clone()));
        }
        Ok(self.tools.clone())
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> homebase_mcp::Result<CallToolResult> {
        if !self.is_connected() {
            return Err(McpError::not_connected(self.name.clone()));
        }
        self.calls.lock().push((name.to_string(), arguments));

        let next = self.responses.lock().pop_front();
        match next {
            Some(MockResponse::Text(text)) => Ok(CallToolResult::text_result(text)),
            Some(MockResponse::ToolError(text)) => Ok(CallToolResult {
                is_error: Some(true),
                ..CallToolResult::text_result(text)
            }),
            Some(MockResponse::Empty) => Ok(CallToolResult {
                content: Vec::new(),
                is_error: None,
            }),
            Some(MockResponse::Timeout) => Err(McpError::timeout(
                "tools/call",
                std::time::Duration::from_secs(60),
            )),
            Some(MockResponse::Closed) => {
                *self.state.lock() = SessionState::Disconnected;
                Err(McpError::ConnectionClosed)
            }
            None => Err(McpError::protocol(format!(
                "MockSession '{}': no more responses available",
                self.name
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_scripted_responses_in_order() {
        let session = MockSession::new("finance")
            .respond_text("1")
            .respond(MockResponse::ToolError("bad".into()))
            .connected();

        let first = session.call_tool("a", json!({"x": 1})).await.unwrap();
        assert_eq!(first.first_text(), Some("1"));

        let second = session.call_tool("b", json!({})).await.unwrap();
        assert!(second.is_error());

        assert!(session.call_tool("c", json!({})).await.is_err());
        assert_eq!(session.calls().len(), 3);
        assert_eq!(session.calls()[0], ("a".to_string(), json!({"x": 1})));
    }

    #[tokio::test]
    async fn test_disconnected_mock_rejects_calls() {
        let session = MockSession::new("finance").respond_text("1");
        let err = session.call_tool("a", json!({})).await.unwrap_err();
        assert!(matches!(err, McpError::NotConnected(_)));
        assert!(session.calls().is_empty());
    }

    #[tokio::test]
    async fn test_closed_response_disconnects() {
        let session = MockSession::new("finance")
            .respond(MockResponse::Closed)
            .connected();
        let err = session.call_tool("a", json!({})).await.unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(session.state(), SessionState::Disconnected);
    }
}
