//! JSON-RPC client over a stdio transport.

use std::time::Duration;

use serde_json::Value;

use crate::error::{McpError, Result};
use crate::protocol::{
    CallToolParams, CallToolResult, InitializeParams, InitializeResult, JsonRpcNotification,
    JsonRpcRequest, ListToolsResult, ServerInfo, ToolInfo, methods,
};
use crate::transport::StdioTransport;

/// An MCP client bound to one spawned service.
///
/// Requests are strictly sequential: each call writes one request and reads
/// until the matching response arrives. Anything else on the wire
/// (notifications, server requests, stale responses from a timed-out call)
/// is skipped.
pub struct RpcClient {
    service: String,
    transport: StdioTransport,
    next_id: u64,
    server_info: Option<ServerInfo>,
}

impl RpcClient {
    /// Wrap a freshly spawned transport.
    pub fn new(service: impl Into<String>, transport: StdioTransport) -> Self {
        Self {
            service: service.into(),
            transport,
            next_id: 1,
            server_info: None,
        }
    }

    /// Service name.
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Server info, once the handshake has completed.
    pub fn server_info(&self) -> Option<&ServerInfo> {
        self.server_info.as_ref()
    }

    /// Check if the handshake has completed.
    pub fn is_initialized(&self) -> bool {
        self.server_info.is_some()
    }

    /// Whether a request was cut off mid-write, leaving the wire unframed.
    pub fn write_interrupted(&self) -> bool {
        self.transport.write_interrupted()
    }

    fn next_request_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Send a request and wait for its response.
    async fn request(&mut self, method: &str, params: Option<Value>) -> Result<Value> {
        let id = self.next_request_id();
        self.transport
            .send(&JsonRpcRequest::new(id, method, params))
            .await?;

        loop {
            let message = self.transport.recv().await?;
            match message.response_id() {
                Some(rid) if rid == id => {
                    return message
                        .into_result()
                        .map_err(|e| McpError::server_error(e.code, e.message, e.data));
                }
                Some(rid) => {
                    tracing::debug!(
                        service = %self.service,
                        expected = id,
                        received = rid,
                        "discarding stale response"
                    );
                }
                None => {
                    tracing::trace!(
                        service = %self.service,
                        method = ?message.method,
                        "skipping non-response message"
                    );
                }
            }
        }
    }

    /// Send a notification (no response expected).
    async fn notify(&mut self, method: &str, params: Option<Value>) -> Result<()> {
        self.transport
            .send(&JsonRpcNotification::new(method, params))
            .await
    }

    /// Perform the `initialize` handshake and send `notifications/initialized`.
    pub async fn initialize(&mut self) -> Result<ServerInfo> {
        if let Some(ref info) = self.server_info {
            return Ok(info.clone());
        }

        let params = serde_json::to_value(InitializeParams::default())?;
        let result = self.request(methods::INITIALIZE, Some(params)).await?;
        let init: InitializeResult = serde_json::from_value(result)?;

        tracing::debug!(
            service = %self.service,
            server = %init.server_info.name,
            version = %init.server_info.version,
            protocol = %init.protocol_version,
            "handshake complete"
        );

        self.notify(methods::INITIALIZED, None).await?;
        self.server_info = Some(init.server_info.clone());
        Ok(init.server_info)
    }

    /// List the service's tools.
    pub async fn list_tools(&mut self) -> Result<Vec<ToolInfo>> {
        if !self.is_initialized() {
            return Err(McpError::not_connected(self.service.clone()));
        }

        let result = self.request(methods::TOOLS_LIST, None).await?;
        let list: ListToolsResult = serde_json::from_value(result)?;

        tracing::debug!(
            service = %self.service,
            tool_count = list.tools.len(),
            "listed tools"
        );
        Ok(list.tools)
    }

    /// Call a tool.
    pub async fn call_tool(&mut self, name: &str, arguments: Value) -> Result<CallToolResult> {
        if !self.is_initialized() {
            return Err(McpError::not_connected(self.service.clone()));
        }

        let params = CallToolParams {
            name: name.to_string(),
            arguments,
        };
        let result = self
            .request(methods::TOOLS_CALL, Some(serde_json::to_value(&params)?))
            .await?;
        let call_result: CallToolResult = serde_json::from_value(result)?;

        tracing::debug!(
            service = %self.service,
            tool = %name,
            is_error = call_result.is_error(),
            "called tool"
        );
        Ok(call_result)
    }

    /// Close the session: end input so the service can exit on its own.
    pub async fn close(&mut self) {
        self.transport.close_input().await;
        self.server_info = None;
    }

    /// Tear down the underlying process.
    pub async fn shutdown(&mut self, grace: Duration) {
        self.transport.shutdown(grace).await;
    }
}
