//! The adapter: one owner for every service session.
//!
//! The [`Adapter`] is built explicitly from configuration, descriptors or
//! ready-made sessions and shared as `Arc<Adapter>`. It tracks a status per
//! service, connects and disconnects them concurrently and hands out typed
//! clients.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use futures::future::join_all;
use homebase_config::{HomebaseConfig, ResolvedService};
use homebase_mcp::{CallToolResult, ServiceDescriptor, ServiceSession, ToolInfo, ToolSession};
use parking_lot::Mutex;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::catalog::CatalogClient;
use crate::error::{Result, ToolsError};
use crate::finance::FinanceClient;
use crate::location::LocationClient;
use crate::service::SharedSession;

// ─────────────────────────────────────────────────────────────────────────────
// Service kinds
// ─────────────────────────────────────────────────────────────────────────────

/// The three services the typed clients know about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    Finance,
    Catalog,
    Location,
}

impl ServiceKind {
    /// All kinds, in display order.
    pub const ALL: [ServiceKind; 3] = [Self::Finance, Self::Catalog, Self::Location];

    /// The configuration name of this service.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Finance => homebase_config::FINANCE,
            Self::Catalog => homebase_config::CATALOG,
            Self::Location => homebase_config::LOCATION,
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceKind {
    type Err = ToolsError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ToolsError::UnknownService(s.to_string()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Status
// ─────────────────────────────────────────────────────────────────────────────

/// Connection status of one service as seen by the adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceStatus {
    /// `connect_all` has not run for this service.
    NotAttempted,
    /// The last connect succeeded.
    Connected,
    /// The last connect failed with this reason.
    Failed(String),
    /// `disconnect_all` ran after an attempt.
    Disconnected,
}

impl ServiceStatus {
    /// Whether this is [`ServiceStatus::Connected`].
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAttempted => write!(f, "not-attempted"),
            Self::Connected => write!(f, "connected"),
            Self::Failed(reason) => write!(f, "failed: {}", reason),
            Self::Disconnected => write!(f, "disconnected"),
        }
    }
}

impl Serialize for ServiceStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Status of every managed service, keyed by name.
pub type StatusMap = BTreeMap<String, ServiceStatus>;

// ─────────────────────────────────────────────────────────────────────────────
// Adapter
// ─────────────────────────────────────────────────────────────────────────────

/// Build a session descriptor from a resolved configuration entry.
pub fn descriptor_for(service: &ResolvedService) -> ServiceDescriptor {
    let mut descriptor = ServiceDescriptor::new(&service.name, &service.command)
        .with_args(service.args.iter().cloned())
        .with_handshake_timeout(service.handshake_timeout)
        .with_call_timeout(service.call_timeout)
        .with_shutdown_timeout(service.shutdown_timeout);
    for (key, value) in &service.env {
        descriptor = descriptor.with_env_var(key, value);
    }
    if let Some(ref dir) = service.working_dir {
        descriptor = descriptor.with_working_dir(dir.clone());
    }
    descriptor
}

/// Owns the sessions for all configured services.
pub struct Adapter {
    sessions: BTreeMap<String, SharedSession>,
    status: Mutex<StatusMap>,
    lifecycle: tokio::sync::Mutex<()>,
}

impl Adapter {
    /// Manage these sessions. A later session with the same name replaces an earlier one.
    pub fn from_sessions(sessions: impl IntoIterator<Item = SharedSession>) -> Self {
        let sessions: BTreeMap<String, SharedSession> = sessions
            .into_iter()
            .map(|session| (session.name().to_string(), session))
            .collect();
        let status = sessions
            .keys()
            .map(|name| (name.clone(), ServiceStatus::NotAttempted))
            .collect();

        Self {
            sessions,
            status: Mutex::new(status),
            lifecycle: tokio::sync::Mutex::new(()),
        }
    }

    /// One subprocess-backed session per descriptor.
    pub fn from_descriptors(descriptors: impl IntoIterator<Item = ServiceDescriptor>) -> Self {
        Self::from_sessions(
            descriptors
                .into_iter()
                .map(|d| Arc::new(ServiceSession::new(d)) as SharedSession),
        )
    }

    /// Sessions for every enabled service in `config`, expanding `${VAR}`
    /// references from the process environment.
    pub fn from_config(config: &HomebaseConfig) -> homebase_config::Result<Self> {
        let resolved = config.resolve_services()?;
        Ok(Self::from_descriptors(resolved.iter().map(descriptor_for)))
    }

    /// Names of the managed services.
    pub fn service_names(&self) -> Vec<String> {
        self.sessions.keys().cloned().collect()
    }

    /// The session for `service`.
    pub fn session(&self, service: &str) -> Result<&SharedSession> {
        self.sessions
            .get(service)
            .ok_or_else(|| ToolsError::UnknownService(service.to_string()))
    }

    /// Connect every service concurrently.
    ///
    /// A failing service is recorded as `failed: <reason>` and never stops
    /// the others. Already connected sessions are left alone.
    pub async fn connect_all(&self) -> StatusMap {
        let _lifecycle = self.lifecycle.lock().await;

        let attempts = self.sessions.iter().map(|(name, session)| async move {
            let status = match session.connect().await {
                Ok(()) => {
                    tracing::info!(service = %name, "service connected");
                    ServiceStatus::Connected
                }
                Err(e) => {
                    tracing::warn!(service = %name, error = %e, "service failed to connect");
                    ServiceStatus::Failed(e.to_string())
                }
            };
            (name.clone(), status)
        });
        let outcomes = join_all(attempts).await;

        let mut status = self.status.lock();
        status.extend(outcomes);
        status.clone()
    }

    /// The current status map. Has no side effects.
    ///
    /// A service recorded as connected whose session has since dropped
    /// (process exit) is reported as disconnected.
    pub fn check_running(&self) -> StatusMap {
        let status = self.status.lock();
        status
            .iter()
            .map(|(name, recorded)| {
                let live = match (recorded, self.sessions.get(name)) {
                    (ServiceStatus::Connected, Some(session)) if !session.is_connected() => {
                        ServiceStatus::Disconnected
                    }
                    _ => recorded.clone(),
                };
                (name.clone(), live)
            })
            .collect()
    }

    /// Tools advertised by each connected service.
    ///
    /// Services that are not connected, or whose listing fails, are absent.
    pub async fn get_available_tools(&self) -> BTreeMap<String, Vec<ToolInfo>> {
        let connected: Vec<(&String, &SharedSession)> = {
            let status = self.status.lock();
            self.sessions
                .iter()
                .filter(|(name, _)| status.get(*name).is_some_and(ServiceStatus::is_connected))
                .collect()
        };

        let listings = connected.into_iter().map(|(name, session)| async move {
            match session.list_tools().await {
                Ok(tools) => {
                    tracing::debug!(service = %name, count = tools.len(), "listed tools");
                    Some((name.clone(), tools))
                }
                Err(e) => {
                    tracing::warn!(service = %name, error = %e, "failed to list tools");
                    None
                }
            }
        });

        join_all(listings).await.into_iter().flatten().collect()
    }

    /// Disconnect every service concurrently. Never fails.
    ///
    /// Every service that was attempted is marked `disconnected`.
    pub async fn disconnect_all(&self) -> StatusMap {
        let _lifecycle = self.lifecycle.lock().await;

        join_all(self.sessions.values().map(|session| session.disconnect())).await;

        let mut status = self.status.lock();
        for (name, entry) in status.iter_mut() {
            if *entry != ServiceStatus::NotAttempted {
                tracing::info!(service = %name, "service disconnected");
                *entry = ServiceStatus::Disconnected;
            }
        }
        status.clone()
    }

    /// Call `tool` on `service` and return the raw result envelope.
    pub async fn invoke(&self, service: &str, tool: &str, arguments: Value) -> Result<CallToolResult> {
        let session = self.session(service)?;
        tracing::debug!(service, tool, "invoking tool");
        Ok(session.call_tool(tool, arguments).await?)
    }

    /// Typed client for the finance service.
    pub fn finance(&self) -> Result<FinanceClient> {
        Ok(FinanceClient::new(self.kind(ServiceKind::Finance)?))
    }

    /// Typed client for the catalog service.
    pub fn catalog(&self) -> Result<CatalogClient> {
        Ok(CatalogClient::new(self.kind(ServiceKind::Catalog)?))
    }

    /// Typed client for the location service.
    pub fn location(&self) -> Result<LocationClient> {
        Ok(LocationClient::new(self.kind(ServiceKind::Location)?))
    }

    fn kind(&self, kind: ServiceKind) -> Result<SharedSession> {
        self.session(kind.as_str()).cloned()
    }
}

impl fmt::Debug for Adapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Adapter")
            .field("services", &self.service_names())
            .field("status", &*self.status.lock())
            .finish()
    }
}
