//! Launch descriptors for tool services.

use std::path::PathBuf;
use std::time::Duration;

/// Default bound on the `initialize` handshake.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(30);

/// Default bound on a single `tools/list` or `tools/call` exchange.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(60);

/// Default time a service gets to exit after its stdin closes.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// How to launch and talk to one tool service.
///
/// Built once and handed to a session; the session never mutates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    /// Service name used in logs and status maps.
    pub name: String,
    /// Executable to spawn.
    pub command: String,
    /// Ordered arguments. May carry credentials, so never log them.
    pub args: Vec<String>,
    /// Environment overlay applied on top of the inherited environment.
    pub env: Vec<(String, String)>,
    /// Working directory for the child, if not the current one.
    pub working_dir: Option<PathBuf>,
    /// Bound on spawn plus handshake.
    pub handshake_timeout: Duration,
    /// Bound on each request/response exchange after the handshake.
    pub call_timeout: Duration,
    /// Grace period between closing stdin and killing the child.
    pub shutdown_timeout: Duration,
}

impl ServiceDescriptor {
    /// Create a descriptor with no arguments and default timeouts.
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            args: Vec::new(),
            env: Vec::new(),
            working_dir: None,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }

    /// Replace the argument list.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Append one argument.
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add an environment variable.
    pub fn with_env_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Set the working directory.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Set the handshake timeout.
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Set the per-call timeout.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Set the shutdown grace period.
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }
}
