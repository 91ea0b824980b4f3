//! Stdio transport for tool services.
//!
//! Each message is one line of JSON on the child's stdin/stdout. The child's
//! stderr is drained into `tracing` so a chatty service cannot fill the pipe
//! and stall.

use std::process::Stdio;
use std::time::Duration;

use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::task::JoinHandle;

use crate::descriptor::ServiceDescriptor;
use crate::error::{McpError, Result};
use crate::protocol::JsonRpcMessage;

/// A spawned service process and its stdio pipes.
pub struct StdioTransport {
    service: String,
    child: Child,
    /// `None` once input has been closed.
    stdin: Option<BufWriter<ChildStdin>>,
    stdout: Lines<BufReader<ChildStdout>>,
    stderr_task: Option<JoinHandle<()>>,
    /// Set while a line is being written; still set if that write was cancelled.
    write_pending: bool,
}

impl StdioTransport {
    /// Spawn the process described by `descriptor`.
    ///
    /// The child is killed if the transport is dropped without a shutdown.
    pub fn spawn(descriptor: &ServiceDescriptor) -> Result<Self> {
        let mut cmd = Command::new(&descriptor.command);
        cmd.args(&descriptor.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        for (key, value) in &descriptor.env {
            cmd.env(key, value);
        }
        if let Some(ref dir) = descriptor.working_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|e| {
            McpError::spawn_failed(format!(
                "failed to spawn '{}': {}",
                descriptor.command, e
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| McpError::spawn_failed("failed to capture stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| McpError::spawn_failed("failed to capture stdout"))?;

        let stderr_task = child.stderr.take().map(|stderr| {
            let service = descriptor.name.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    tracing::debug!(service = %service, stderr = %line, "service stderr");
                }
            })
        });

        tracing::debug!(
            service = %descriptor.name,
            command = %descriptor.command,
            pid = ?child.id(),
            "spawned service process"
        );

        Ok(Self {
            service: descriptor.name.clone(),
            child,
            stdin: Some(BufWriter::new(stdin)),
            stdout: BufReader::new(stdout).lines(),
            stderr_task,
            write_pending: false,
        })
    }

    /// OS process id, if the child has not been reaped yet.
    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    /// Write one message as a single line.
    ///
    /// Not cancel-safe: dropping the future mid-write leaves a partial line on
    /// the child's stdin, after which [`write_interrupted`](Self::write_interrupted)
    /// is true and every further send fails.
    pub async fn send<T: Serialize>(&mut self, message: &T) -> Result<()> {
        if self.write_pending {
            return Err(McpError::transport("previous write was interrupted"));
        }
        let json = serde_json::to_string(message)?;
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| McpError::transport("stdin already closed"))?;

        self.write_pending = true;
        stdin.write_all(json.as_bytes()).await?;
        stdin.write_all(b"\n").await?;
        stdin.flush().await?;
        self.write_pending = false;

        tracing::trace!(service = %self.service, json = %json, "sent message");
        Ok(())
    }

    /// Whether a send was cancelled before its line was complete.
    pub fn write_interrupted(&self) -> bool {
        self.write_pending
    }

    /// Read the next JSON-RPC message.
    ///
    /// Blank lines and lines that are not JSON-RPC objects are logged and
    /// skipped. Returns [`McpError::ConnectionClosed`] at end of stream.
    pub async fn recv(&mut self) -> Result<JsonRpcMessage> {
        loop {
            let Some(line) = self.stdout.next_line().await? else {
                return Err(McpError::ConnectionClosed);
            };
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            match serde_json::from_str::<JsonRpcMessage>(trimmed) {
                Ok(message) => {
                    tracing::trace!(service = %self.service, json = %trimmed, "received message");
                    return Ok(message);
                }
                Err(e) => {
                    tracing::debug!(
                        service = %self.service,
                        error = %e,
                        line = %trimmed,
                        "skipping non JSON-RPC output"
                    );
                }
            }
        }
    }

    /// Close the child's stdin, signalling it to exit.
    ///
    /// After an interrupted write the pipe is dropped without flushing, since
    /// the child is not reading.
    pub async fn close_input(&mut self) {
        let Some(mut stdin) = self.stdin.take() else {
            return;
        };
        if self.write_pending {
            drop(stdin);
            return;
        }
        if let Err(e) = stdin.shutdown().await {
            tracing::debug!(service = %self.service, error = %e, "error closing stdin");
        }
    }

    /// Close stdin, wait up to `grace` for the child to exit, then kill it.
    ///
    /// Best effort: failures are logged and never returned.
    pub async fn shutdown(&mut self, grace: Duration) {
        self.close_input().await;

        let exited = if grace.is_zero() {
            false
        } else {
            match tokio::time::timeout(grace, self.child.wait()).await {
                Ok(Ok(status)) => {
                    tracing::debug!(service = %self.service, %status, "service exited");
                    true
                }
                Ok(Err(e)) => {
                    tracing::warn!(service = %self.service, error = %e, "failed waiting for service");
                    false
                }
                Err(_) => {
                    tracing::warn!(
                        service = %self.service,
                        grace_ms = grace.as_millis() as u64,
                        "service did not exit in time, killing"
                    );
                    false
                }
            }
        };

        if !exited {
            if let Err(e) = self.child.kill().await {
                tracing::warn!(service = %self.service, error = %e, "failed to kill service");
            }
        }

        if let Some(task) = self.stderr_task.take() {
            task.abort();
        }
    }
}

impl Drop for StdioTransport {
    fn drop(&mut self) {
        if let Some(task) = self.stderr_task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::JsonRpcRequest;

    #[tokio::test]
    async fn test_spawn_nonexistent_command() {
        let desc = ServiceDescriptor::new("ghost", "nonexistent-homebase-service-12345");
        match StdioTransport::spawn(&desc) {
            Ok(_) => panic!("Expected spawn to fail"),
            Err(err) => assert!(matches!(err, McpError::SpawnFailed(_))),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cat_echoes_lines() {
        let desc = ServiceDescriptor::new("echo", "cat");
        let mut transport = StdioTransport::spawn(&desc).unwrap();
        assert!(transport.pid().is_some());

        let request = JsonRpcRequest::new(3, "tools/list", None);
        transport.send(&request).await.unwrap();

        // cat echoes the request back; it has a method so it is not a response.
        let message = transport.recv().await.unwrap();
        assert_eq!(message.method.as_deref(), Some("tools/list"));
        assert!(!message.is_response());

        transport.shutdown(Duration::from_secs(2)).await;
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_recv_skips_garbage_and_reports_eof() {
        let desc = ServiceDescriptor::new("noisy", "sh").with_args([
            "-c",
            r#"echo 'starting up'; echo ''; echo '{"jsonrpc":"2.0","id":1,"result":{}}'"#,
        ]);
        let mut transport = StdioTransport::spawn(&desc).unwrap();

        let message = transport.recv().await.unwrap();
        assert_eq!(message.response_id(), Some(1));

        let err = transport.recv().await.unwrap_err();
        assert!(matches!(err, McpError::ConnectionClosed));

        transport.shutdown(Duration::from_secs(1)).await;
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_send_after_close_fails() {
        let desc = ServiceDescriptor::new("echo", "cat");
        let mut transport = StdioTransport::spawn(&desc).unwrap();
        transport.close_input().await;

        let err = transport
            .send(&JsonRpcRequest::new(1, "ping", None))
            .await
            .unwrap_err();
        assert!(matches!(err, McpError::Transport(_)));

        transport.shutdown(Duration::from_secs(1)).await;
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cancelled_send_blocks_further_writes() {
        // Never reads stdin, so a large line fills the pipe and stalls.
        let desc = ServiceDescriptor::new("wedged", "sh").with_args(["-c", "sleep 5"]);
        let mut transport = StdioTransport::spawn(&desc).unwrap();

        let big = JsonRpcRequest::new(1, "tools/call", Some(serde_json::json!({"q": "x".repeat(300_000)})));
        let outcome = tokio::time::timeout(Duration::from_millis(200), transport.send(&big)).await;
        assert!(outcome.is_err(), "send should stall on a full pipe");
        assert!(transport.write_interrupted());

        let err = transport
            .send(&JsonRpcRequest::new(2, "ping", None))
            .await
            .unwrap_err();
        assert!(matches!(err, McpError::Transport(_)));

        transport.shutdown(Duration::from_millis(100)).await;
    }
}
