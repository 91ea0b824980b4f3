//! MCP sessions with subprocess-hosted tool services.
//!
//! This crate owns the leaf of the Homebase tool stack: spawning a service
//! process, running the MCP handshake over its stdio, and exchanging
//! `tools/list` / `tools/call` requests with it.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  ServiceSession (ToolSession)                               │
//! │  - connect / disconnect lifecycle, state reporting          │
//! │  - one call in flight, handshake and call timeouts          │
//! └─────────────────────────────────────────────────────────────┘
//!                           │
//!                           ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  RpcClient                                                  │
//! │  - initialize, tools/list, tools/call                       │
//! │  - request id matching                                      │
//! └─────────────────────────────────────────────────────────────┘
//!                           │
//!                           ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  StdioTransport                                             │
//! │  - newline-delimited JSON-RPC 2.0 over child stdio          │
//! │  - stderr drained into tracing                              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use homebase_mcp::{ServiceDescriptor, ServiceSession, ToolSession};
//!
//! let descriptor = ServiceDescriptor::new("finance", "docker")
//!     .with_args(["exec", "-i", "finance-mcp-server", "python", "server.py"]);
//!
//! let session = ServiceSession::new(descriptor);
//! session.connect().await?;
//!
//! for tool in session.list_tools().await? {
//!     println!("Tool: {} - {:?}", tool.name, tool.description);
//! }
//!
//! let result = session
//!     .call_tool("calculate_budget", json!({"income": 75000.0}))
//!     .await?;
//! println!("Result: {:?}", result.first_text());
//!
//! session.disconnect().await;
//! ```
//!
//! # Protocol
//!
//! One JSON-RPC 2.0 message per line:
//!
//! ```text
//! {"jsonrpc":"2.0","id":1,"method":"initialize","params":{...}}
//! ```
//!
//! The flow is:
//! 1. Client sends `initialize` with capabilities
//! 2. Service responds with its capabilities
//! 3. Client sends `notifications/initialized`
//! 4. Client can now call `tools/list` and `tools/call`

pub mod client;
pub mod descriptor;
pub mod error;
pub mod protocol;
pub mod session;
pub mod transport;

// Re-export main types
pub use client::RpcClient;
pub use descriptor::{
    DEFAULT_CALL_TIMEOUT, DEFAULT_HANDSHAKE_TIMEOUT, DEFAULT_SHUTDOWN_TIMEOUT, ServiceDescriptor,
};
pub use error::{McpError, Result};
pub use protocol::{
    CallToolParams, CallToolResult, InitializeParams, InitializeResult, JsonRpcError,
    JsonRpcMessage, JsonRpcNotification, JsonRpcRequest, ListToolsResult, ResourceContents,
    ServerCapabilities, ServerInfo, ToolContent, ToolInfo,
};
pub use session::{ServiceSession, SessionState, ToolSession};
pub use transport::StdioTransport;
