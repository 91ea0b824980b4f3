//! Configuration types mapping to the TOML schema.
//!
//! ```toml
//! [logging]
//! level = "info"
//!
//! [services.finance]
//! command = "docker"
//! args = ["exec", "-i", "finance-mcp-server", "python", "server.py"]
//!
//! [services.location]
//! enabled = false
//! ```
//!
//! Every field is optional so a project-local file can override a single
//! setting of a single service.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::expand::expand_with;
use crate::{ConfigError, Result};

/// Service names with built-in launch defaults.
pub const FINANCE: &str = "finance";
/// Database query service.
pub const CATALOG: &str = "catalog";
/// Location and transit service.
pub const LOCATION: &str = "location";

const DEFAULT_HANDSHAKE_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CALL_TIMEOUT_SECS: u64 = 60;
const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 5;

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HomebaseConfig {
    /// Tool service launch entries keyed by service name.
    pub services: BTreeMap<String, ServiceEntry>,

    /// Logging configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

impl HomebaseConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Config holding the built-in launch commands for the three services.
    ///
    /// Each service runs inside its docker container; credentials are read
    /// from the environment with placeholder defaults.
    pub fn builtin() -> Self {
        let mut services = BTreeMap::new();
        services.insert(
            FINANCE.to_string(),
            ServiceEntry::new("docker").with_args([
                "exec",
                "-i",
                "finance-mcp-server",
                "python",
                "server.py",
            ]),
        );
        services.insert(
            CATALOG.to_string(),
            ServiceEntry::new("docker").with_args([
                "exec",
                "-i",
                "supabase-mcp-server",
                "npx",
                "@supabase/mcp-server-supabase@latest",
                "--read-only",
                "--project-ref=${SUPABASE_PROJECT_REF:-YOUR_PROJECT_REF}",
                "--access-token=${SUPABASE_ACCESS_TOKEN:-your-token}",
            ]),
        );
        services.insert(
            LOCATION.to_string(),
            ServiceEntry::new("docker").with_args([
                "exec",
                "-e",
                "WALKSCORE_API_KEY=${WALKSCORE_API_KEY:-your-api-key}",
                "-i",
                "location-mcp-server",
                "python",
                "server.py",
            ]),
        );

        Self {
            services,
            logging: None,
        }
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority).
    ///
    /// Services merge field by field so an override file can change one
    /// setting without restating the launch command.
    pub fn merge(&mut self, other: HomebaseConfig) {
        for (name, entry) in other.services {
            match self.services.get_mut(&name) {
                Some(existing) => existing.merge(entry),
                None => {
                    self.services.insert(name, entry);
                }
            }
        }

        if let Some(logging) = other.logging {
            match self.logging {
                Some(ref mut existing) => existing.merge(logging),
                None => self.logging = Some(logging),
            }
        }
    }

    /// Look up a service entry.
    pub fn service(&self, name: &str) -> Option<&ServiceEntry> {
        self.services.get(name)
    }

    /// Resolve every enabled service, expanding variables from the environment.
    pub fn resolve_services(&self) -> Result<Vec<ResolvedService>> {
        self.resolve_services_with(&|name| std::env::var(name).ok())
    }

    /// Resolve every enabled service using `lookup` for variables.
    ///
    /// Disabled services are skipped without expanding their variables.
    pub fn resolve_services_with<F>(&self, lookup: &F) -> Result<Vec<ResolvedService>>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.services
            .iter()
            .filter(|(_, entry)| entry.is_enabled())
            .map(|(name, entry)| entry.resolve(name, lookup))
            .collect()
    }

    /// Logging section, or defaults when absent.
    pub fn logging(&self) -> LoggingConfig {
        self.logging.clone().unwrap_or_default()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Service Entries
// ─────────────────────────────────────────────────────────────────────────────

/// Launch settings for a single tool service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceEntry {
    /// Executable to spawn.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Arguments; supports `${VAR}` expansion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,
    /// Environment overlay; values support `${VAR}` expansion.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    /// Working directory; supports `${VAR}` expansion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,
    /// Whether the adapter should manage this service. Defaults to true.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Bound on spawn plus handshake.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handshake_timeout_secs: Option<u64>,
    /// Bound on each tool call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_timeout_secs: Option<u64>,
    /// Grace period before a stopping service is killed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shutdown_timeout_secs: Option<u64>,
}

impl ServiceEntry {
    /// Create an entry that runs `command` with no arguments.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: Some(command.into()),
            ..Default::default()
        }
    }

    /// Replace the arguments.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = Some(args.into_iter().map(Into::into).collect());
        self
    }

    /// Add an environment variable.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set enabled state.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    /// Whether this service is enabled (defaults to true).
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    /// Overlay `other` onto this entry; set fields in `other` win.
    pub fn merge(&mut self, other: ServiceEntry) {
        if other.command.is_some() {
            self.command = other.command;
        }
        if other.args.is_some() {
            self.args = other.args;
        }
        self.env.extend(other.env);
        if other.working_dir.is_some() {
            self.working_dir = other.working_dir;
        }
        if other.enabled.is_some() {
            self.enabled = other.enabled;
        }
        if other.handshake_timeout_secs.is_some() {
            self.handshake_timeout_secs = other.handshake_timeout_secs;
        }
        if other.call_timeout_secs.is_some() {
            self.call_timeout_secs = other.call_timeout_secs;
        }
        if other.shutdown_timeout_secs.is_some() {
            self.shutdown_timeout_secs = other.shutdown_timeout_secs;
        }
    }

    /// Expand variables and fill in defaults.
    pub fn resolve<F>(&self, name: &str, lookup: &F) -> Result<ResolvedService>
    where
        F: Fn(&str) -> Option<String>,
    {
        let context = format!("services.{}", name);
        let command = self
            .command
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingField {
                field: "command".to_string(),
                context: context.clone(),
            })?;

        let command = expand_with(command, &format!("{}.command", context), lookup)?;

        let args = self
            .args
            .iter()
            .flatten()
            .enumerate()
            .map(|(i, arg)| expand_with(arg, &format!("{}.args[{}]", context, i), lookup))
            .collect::<Result<Vec<_>>>()?;

        let env = self
            .env
            .iter()
            .map(|(key, value)| {
                expand_with(value, &format!("{}.env.{}", context, key), lookup)
                    .map(|v| (key.clone(), v))
            })
            .collect::<Result<Vec<_>>>()?;

        let working_dir = self
            .working_dir
            .as_deref()
            .map(|dir| expand_with(dir, &format!("{}.working_dir", context), lookup))
            .transpose()?
            .map(PathBuf::from);

        Ok(ResolvedService {
            name: name.to_string(),
            command,
            args,
            env,
            working_dir,
            handshake_timeout: Duration::from_secs(
                self.handshake_timeout_secs
                    .unwrap_or(DEFAULT_HANDSHAKE_TIMEOUT_SECS),
            ),
            call_timeout: Duration::from_secs(
                self.call_timeout_secs.unwrap_or(DEFAULT_CALL_TIMEOUT_SECS),
            ),
            shutdown_timeout: Duration::from_secs(
                self.shutdown_timeout_secs
                    .unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT_SECS),
            ),
        })
    }
}

/// A service entry with variables expanded and defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedService {
    /// Service name.
    pub name: String,
    /// Executable to spawn.
    pub command: String,
    /// Expanded arguments.
    pub args: Vec<String>,
    /// Expanded environment overlay.
    pub env: Vec<(String, String)>,
    /// Expanded working directory.
    pub working_dir: Option<PathBuf>,
    /// Handshake timeout.
    pub handshake_timeout: Duration,
    /// Per-call timeout.
    pub call_timeout: Duration,
    /// Shutdown grace period.
    pub shutdown_timeout: Duration,
}

// ─────────────────────────────────────────────────────────────────────────────
// Logging Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Logging configuration section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default console filter when `RUST_LOG` is unset (e.g. `"info"`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// Directory for the JSON log files. Defaults to `<config dir>/logs`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
    /// Whether to write the JSON log file. Defaults to true.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<bool>,
}

impl LoggingConfig {
    /// Overlay `other` onto this section.
    pub fn merge(&mut self, other: LoggingConfig) {
        if other.level.is_some() {
            self.level = other.level;
        }
        if other.directory.is_some() {
            self.directory = other.directory;
        }
        if other.file.is_some() {
            self.file = other.file;
        }
    }

    /// Whether file logging is enabled.
    pub fn file_enabled(&self) -> bool {
        self.file.unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_parse_full_config() {
        let config = HomebaseConfig::from_toml(
            r#"
[logging]
level = "debug"
file = false

[services.finance]
command = "python"
args = ["server.py"]
working_dir = "/srv/finance"
call_timeout_secs = 10

[services.finance.env]
PYTHONUNBUFFERED = "1"
"#,
        )
        .unwrap();

        let finance = config.service("finance").unwrap();
        assert_eq!(finance.command.as_deref(), Some("python"));
        assert_eq!(finance.args, Some(vec!["server.py".to_string()]));
        assert_eq!(finance.env.get("PYTHONUNBUFFERED").map(String::as_str), Some("1"));
        assert_eq!(finance.call_timeout_secs, Some(10));
        assert!(finance.is_enabled());

        let logging = config.logging();
        assert_eq!(logging.level.as_deref(), Some("debug"));
        assert!(!logging.file_enabled());
    }

    #[test]
    fn test_empty_config() {
        let config = HomebaseConfig::from_toml("").unwrap();
        assert!(config.services.is_empty());
        assert!(config.logging.is_none());
        assert!(config.logging().file_enabled());
    }

    #[test]
    fn test_unknown_field_in_service_is_ignored() {
        let config = HomebaseConfig::from_toml(
            r#"
[services.finance]
command = "python"
retries = 3
"#,
        )
        .unwrap();
        assert!(config.service("finance").is_some());
    }

    #[test]
    fn test_builtin_services() {
        let config = HomebaseConfig::builtin();
        let names: Vec<&str> = config.services.keys().map(String::as_str).collect();
        assert_eq!(names, vec![CATALOG, FINANCE, LOCATION]);

        let resolved = config.resolve_services_with(&no_env).unwrap();
        let catalog = resolved.iter().find(|s| s.name == CATALOG).unwrap();
        assert_eq!(catalog.command, "docker");
        assert!(catalog.args.contains(&"--read-only".to_string()));
        assert!(
            catalog
                .args
                .contains(&"--project-ref=YOUR_PROJECT_REF".to_string())
        );
        assert!(catalog.args.contains(&"--access-token=your-token".to_string()));

        let location = resolved.iter().find(|s| s.name == LOCATION).unwrap();
        assert_eq!(location.args[2], "WALKSCORE_API_KEY=your-api-key");
        assert_eq!(location.handshake_timeout, Duration::from_secs(30));
        assert_eq!(location.call_timeout, Duration::from_secs(60));
        assert_eq!(location.shutdown_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_builtin_expands_credentials() {
        let lookup = |name: &str| match name {
            "SUPABASE_ACCESS_TOKEN" => Some("sbp_123".to_string()),
            _ => None,
        };
        let resolved = HomebaseConfig::builtin()
            .resolve_services_with(&lookup)
            .unwrap();
        let catalog = resolved.iter().find(|s| s.name == CATALOG).unwrap();
        assert!(catalog.args.contains(&"--access-token=sbp_123".to_string()));
    }

    #[test]
    fn test_merge_overrides_per_field() {
        let mut config = HomebaseConfig::builtin();
        let layer = HomebaseConfig::from_toml(
            r#"
[services.location]
enabled = false

[services.finance]
call_timeout_secs = 5

[services.extra]
command = "extra-server"
"#,
        )
        .unwrap();
        config.merge(layer);

        let finance = config.service(FINANCE).unwrap();
        assert_eq!(finance.command.as_deref(), Some("docker"));
        assert_eq!(finance.call_timeout_secs, Some(5));
        assert!(!config.service(LOCATION).unwrap().is_enabled());
        assert!(config.service("extra").is_some());

        let resolved = config.resolve_services_with(&no_env).unwrap();
        let names: Vec<&str> = resolved.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec![CATALOG, "extra", FINANCE]);
    }

    #[test]
    fn test_merge_env_is_keywise() {
        let mut base = ServiceEntry::new("python").with_env("A", "1").with_env("B", "2");
        base.merge(ServiceEntry::default().with_env("B", "3").with_env("C", "4"));
        assert_eq!(base.env.len(), 3);
        assert_eq!(base.env["B"], "3");
        assert_eq!(base.command.as_deref(), Some("python"));
    }

    #[test]
    fn test_merge_logging() {
        let mut config = HomebaseConfig::from_toml("[logging]\nlevel = \"info\"\n").unwrap();
        config.merge(HomebaseConfig::from_toml("[logging]\nfile = false\n").unwrap());
        let logging = config.logging();
        assert_eq!(logging.level.as_deref(), Some("info"));
        assert_eq!(logging.file, Some(false));
    }

    #[test]
    fn test_resolve_missing_command() {
        let entry = ServiceEntry::default();
        let err = entry.resolve("finance", &no_env).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { ref field, .. } if field == "command"));
    }

    #[test]
    fn test_resolve_unresolved_var_names_field() {
        let entry = ServiceEntry::new("docker").with_args(["exec", "--token=${API_TOKEN}"]);
        match entry.resolve("catalog", &no_env).unwrap_err() {
            ConfigError::UnresolvedVar { var, context } => {
                assert_eq!(var, "API_TOKEN");
                assert_eq!(context, "services.catalog.args[1]");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_disabled_service_is_not_expanded() {
        let mut config = HomebaseConfig::new();
        config.services.insert(
            "finance".to_string(),
            ServiceEntry::new("docker")
                .with_args(["${NEVER_SET}"])
                .with_enabled(false),
        );
        assert!(config.resolve_services_with(&no_env).unwrap().is_empty());
    }

    #[test]
    fn test_resolve_env_and_working_dir() {
        let lookup = |name: &str| (name == "HOME_DIR").then(|| "/home/me".to_string());
        let entry = ServiceEntry {
            working_dir: Some("${HOME_DIR}/svc".to_string()),
            ..ServiceEntry::new("python").with_env("KEY", "${HOME_DIR:-x}")
        };
        let resolved = entry.resolve("finance", &lookup).unwrap();
        assert_eq!(resolved.working_dir, Some(PathBuf::from("/home/me/svc")));
        assert_eq!(
            resolved.env,
            vec![("KEY".to_string(), "/home/me".to_string())]
        );
    }

    #[test]
    fn test_toml_roundtrip_keeps_overrides_sparse() {
        let mut config = HomebaseConfig::new();
        config
            .services
            .insert("location".to_string(), ServiceEntry::default().with_enabled(false));
        let text = config.to_toml().unwrap();
        assert!(text.contains("[services.location]"));
        assert!(text.contains("enabled = false"));
        assert!(!text.contains("command"));

        let parsed = HomebaseConfig::from_toml(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
