//! Lifecycle-managed session with one tool service.
//!
//! A [`ServiceSession`] is either fully connected (process alive, handshake
//! done) or fully disconnected (nothing held). Connect failures, crashes and
//! disconnects all return it to the empty state so it can be connected again.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::{Mutex, MutexGuard};
use tokio::time::error::Elapsed;

use crate::client::RpcClient;
use crate::descriptor::ServiceDescriptor;
use crate::error::{McpError, Result};
use crate::protocol::{CallToolResult, ServerInfo, ToolInfo, methods};
use crate::transport::StdioTransport;

/// Observable lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Nothing held.
    Disconnected,
    /// Spawning the process or running the handshake.
    Connecting,
    /// Ready for calls.
    Connected,
    /// Closing the RPC session and the process.
    Disconnecting,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Disconnecting => "disconnecting",
        };
        f.write_str(s)
    }
}

/// The operations a typed client needs from a service connection.
///
/// Implemented by [`ServiceSession`] for real subprocesses; tests substitute
/// scripted fakes.
#[async_trait]
pub trait ToolSession: Send + Sync {
    /// Service name.
    fn name(&self) -> &str;

    /// Current lifecycle state.
    fn state(&self) -> SessionState;

    /// Whether the session is ready for calls.
    fn is_connected(&self) -> bool {
        self.state() == SessionState::Connected
    }

    /// Connect if not already connected.
    async fn connect(&self) -> Result<()>;

    /// Disconnect if connected. Never fails.
    async fn disconnect(&self);

    /// List the tools the service advertises.
    async fn list_tools(&self) -> Result<Vec<ToolInfo>>;

    /// Invoke one tool and wait for its result envelope.
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult>;
}

struct Connection {
    client: RpcClient,
    server_info: ServerInfo,
}

/// A session with one subprocess-backed tool service.
pub struct ServiceSession {
    descriptor: ServiceDescriptor,
    /// Held across each exchange so at most one request is in flight.
    connection: Mutex<Option<Connection>>,
    state: RwLock<SessionState>,
}

impl ServiceSession {
    /// Create a disconnected session.
    pub fn new(descriptor: ServiceDescriptor) -> Self {
        Self {
            descriptor,
            connection: Mutex::new(None),
            state: RwLock::new(SessionState::Disconnected),
        }
    }

    /// The launch descriptor.
    pub fn descriptor(&self) -> &ServiceDescriptor {
        &self.descriptor
    }

    /// Server info from the handshake, if connected.
    pub async fn server_info(&self) -> Option<ServerInfo> {
        self.connection
            .lock()
            .await
            .as_ref()
            .map(|c| c.server_info.clone())
    }

    fn set_state(&self, state: SessionState) {
        *self.state.write() = state;
    }

    async fn handshake(&self) -> Result<Connection> {
        let transport = StdioTransport::spawn(&self.descriptor)?;
        let mut client = RpcClient::new(self.descriptor.name.clone(), transport);

        let timeout = self.descriptor.handshake_timeout;
        let outcome = match tokio::time::timeout(timeout, client.initialize()).await {
            Ok(result) => result,
            Err(_) => Err(McpError::timeout(methods::INITIALIZE, timeout)),
        };

        match outcome {
            Ok(server_info) => Ok(Connection {
                client,
                server_info,
            }),
            Err(e) => {
                client.shutdown(Duration::ZERO).await;
                Err(e)
            }
        }
    }

    /// Close the RPC session, then the process. Logs and swallows failures.
    async fn teardown(&self, mut connection: Connection) {
        connection.client.close().await;
        connection
            .client
            .shutdown(self.descriptor.shutdown_timeout)
            .await;
    }

    /// Resolve the outcome of one bounded exchange.
    ///
    /// A fatal channel error tears the session down. A timeout does too when
    /// it interrupted the write of the request; otherwise the session stays
    /// connected and the late response is skipped by id.
    async fn settle<T>(
        &self,
        guard: &mut MutexGuard<'_, Option<Connection>>,
        operation: &str,
        outcome: std::result::Result<Result<T>, Elapsed>,
    ) -> Result<T> {
        let timeout = self.descriptor.call_timeout;
        let result = outcome.unwrap_or_else(|_| {
            tracing::warn!(
                service = %self.descriptor.name,
                operation,
                timeout_ms = timeout.as_millis() as u64,
                "service call timed out"
            );
            Err(McpError::timeout(operation, timeout))
        });

        let torn = match &result {
            Err(e) if e.is_fatal() => true,
            // A request cut off mid-write leaves a partial line on stdin.
            Err(McpError::Timeout { .. }) => match &**guard {
                Some(connection) => connection.client.write_interrupted(),
                None => false,
            },
            _ => false,
        };

        if let Err(ref e) = result
            && torn
        {
            tracing::warn!(
                service = %self.descriptor.name,
                operation,
                error = %e,
                "service channel lost, tearing down session"
            );
            self.set_state(SessionState::Disconnecting);
            if let Some(connection) = guard.take() {
                self.teardown(connection).await;
            }
            self.set_state(SessionState::Disconnected);
        }
        result
    }
}

#[async_trait]
impl ToolSession for ServiceSession {
    fn name(&self) -> &str {
        &self.descriptor.name
    }

    fn state(&self) -> SessionState {
        *self.state.read()
    }

    async fn connect(&self) -> Result<()> {
        let mut guard = self.connection.lock().await;
        if guard.is_some() {
            return Ok(());
        }

        self.set_state(SessionState::Connecting);
        match self.handshake().await {
            Ok(connection) => {
                tracing::info!(
                    service = %self.descriptor.name,
                    server = %connection.server_info.name,
                    version = %connection.server_info.version,
                    "connected to service"
                );
                *guard = Some(connection);
                self.set_state(SessionState::Connected);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(
                    service = %self.descriptor.name,
                    error = %e,
                    "failed to connect to service"
                );
                self.set_state(SessionState::Disconnected);
                Err(e)
            }
        }
    }

    async fn disconnect(&self) {
        let mut guard = self.connection.lock().await;
        let Some(connection) = guard.take() else {
            return;
        };

        self.set_state(SessionState::Disconnecting);
        self.teardown(connection).await;
        self.set_state(SessionState::Disconnected);
        tracing::info!(service = %self.descriptor.name, "disconnected from service");
    }

    async fn list_tools(&self) -> Result<Vec<ToolInfo>> {
        let mut guard = self.connection.lock().await;
        let connection = guard
            .as_mut()
            .ok_or_else(|| McpError::not_connected(self.descriptor.name.clone()))?;

        let outcome =
            tokio::time::timeout(self.descriptor.call_timeout, connection.client.list_tools())
                .await;
        self.settle(&mut guard, methods::TOOLS_LIST, outcome).await
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult> {
        let mut guard = self.connection.lock().await;
        let connection = guard
            .as_mut()
            .ok_or_else(|| McpError::not_connected(self.descriptor.name.clone()))?;

        tracing::debug!(service = %self.descriptor.name, tool = %name, "calling tool");
        let outcome = tokio::time::timeout(
            self.descriptor.call_timeout,
            connection.client.call_tool(name, arguments),
        )
        .await;
        self.settle(&mut guard, methods::TOOLS_CALL, outcome).await
    }
}
