//! CLI command handlers.

use std::sync::Arc;

use anyhow::Result;
use console::{Style, style};
use homebase_config::{HomebaseConfig, LoadedConfig};
use homebase_tools::{Adapter, ServiceKind, ToolFacade};
use serde_json::Value;

pub mod call;
pub mod catalog;
pub mod config;
pub mod finance;
pub mod location;
pub mod status;
pub mod tools;

/// Shared context for all commands.
#[derive(Debug)]
pub struct Context {
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
    /// Merged configuration and where it came from.
    pub loaded: LoadedConfig,
}

impl Context {
    pub fn config(&self) -> &HomebaseConfig {
        &self.loaded.config
    }

    /// Build an adapter for one service (or all enabled ones) and connect it.
    ///
    /// Connection failures are recorded in the adapter's status map, not returned.
    pub async fn connect(&self, only: Option<&str>) -> Result<Arc<Adapter>> {
        let mut config = self.config().clone();
        if let Some(name) = only {
            config.services.retain(|service, _| service == name);
        }
        let adapter = Arc::new(Adapter::from_config(&config)?);
        adapter.connect_all().await;
        Ok(adapter)
    }

    /// Connect one typed service and run `f` against the façade.
    pub async fn with_service<F, Fut>(&self, kind: ServiceKind, f: F) -> Result<Value>
    where
        F: FnOnce(ToolFacade) -> Fut,
        Fut: std::future::Future<Output = Value>,
    {
        let adapter = self.connect(Some(kind.as_str())).await?;
        let value = f(ToolFacade::new(adapter.clone())).await;
        adapter.disconnect_all().await;
        Ok(value)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Output helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Fail with the façade's error message if `value` is an error mapping.
///
/// In JSON mode the mapping is printed first so scripts still get it.
pub fn check_error(value: &Value, ctx: &Context) -> Result<()> {
    let Some(error) = value.get("error").and_then(Value::as_str) else {
        return Ok(());
    };

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else if ctx.verbose
        && let Some(excerpt) = value.get("raw_excerpt").and_then(Value::as_str)
    {
        let dim = Style::new().dim();
        eprintln!("{}", dim.apply_to("Response excerpt:"));
        eprintln!("  {}", dim.apply_to(excerpt));
    }
    anyhow::bail!("{}", error)
}

/// Print a successful flat record, as JSON or as a titled key/value list.
pub fn print_record(title: &str, value: &Value, ctx: &Context) -> Result<()> {
    check_error(value, ctx)?;

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(value)?);
        return Ok(());
    }

    let dim = Style::new().dim();
    println!();
    println!("{}", style(title).bold());
    println!("{}", dim.apply_to("─".repeat(40)));
    if let Some(map) = value.as_object() {
        let width = map.keys().map(String::len).max().unwrap_or(0) + 1;
        for (key, field) in map {
            println!(
                "  {:<width$} {}",
                dim.apply_to(format!("{}:", key)),
                display(field),
                width = width
            );
        }
    }
    println!();
    Ok(())
}

/// A JSON scalar without string quotes.
pub fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
