//! Homebase - home-buying tool services from the command line
//!
//! Main entry point for the Homebase CLI.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use homebase_config::{HomebaseConfig, LoadedConfig};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};

mod commands;

use commands::{call, catalog, config, finance, location, status, tools};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Homebase - home-buying tool services from the command line
#[derive(Parser)]
#[command(name = "homebase")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Use this config file instead of discovering one
    #[arg(long, global = true, env = "HOMEBASE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Connect to every service and report its status
    Status(status::StatusArgs),

    /// List the tools each connected service advertises
    Tools(tools::ToolsArgs),

    /// Housing budget for an annual income
    Budget(finance::BudgetArgs),

    /// Maximum loan for an income and credit score
    Loan(finance::LoanArgs),

    /// Look up one property sale by id
    Home(catalog::HomeArgs),

    /// Sale price statistics for a ZIP code and unit count
    Prices(catalog::PricesArgs),

    /// Transit score for a ZIP code
    Transit(location::TransitArgs),

    /// Assistance programs nearest to an embedding
    Programs(catalog::ProgramsArgs),

    /// List property sales
    Properties(catalog::PropertiesArgs),

    /// Call any tool on any service with raw JSON arguments
    Call(call::CallArgs),

    /// Configuration management
    Config(config::ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Logging
// ─────────────────────────────────────────────────────────────────────────────

const CRATES: [&str; 4] = ["homebase", "homebase_tools", "homebase_mcp", "homebase_config"];

fn directives(level: &str, rest: &str) -> String {
    let mut parts: Vec<String> = CRATES.iter().map(|c| format!("{}={}", c, level)).collect();
    parts.push(rest.to_string());
    parts.join(",")
}

/// Console (human-readable, stderr) plus daily rolling JSON file.
///
/// `RUST_LOG` overrides the console filter. The returned guard flushes the
/// file writer on drop.
fn init_logging(verbose: bool, config: &HomebaseConfig) -> Option<WorkerGuard> {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::prelude::*;

    let logging = config.logging();
    let console_filter = match std::env::var("RUST_LOG") {
        Ok(filter) if !filter.is_empty() => EnvFilter::new(filter),
        _ if verbose => EnvFilter::new(directives("debug", "info")),
        _ => match logging.level {
            Some(ref level) => EnvFilter::new(level),
            None => EnvFilter::new(directives("info", "warn")),
        },
    };

    let appender = if logging.file_enabled() {
        homebase_config::log_dir(config).and_then(|dir| {
            RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("homebase.log")
                .build(&dir)
                .ok()
        })
    } else {
        None
    };
    let (file_layer, guard) = match appender {
        Some(appender) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(EnvFilter::new(directives("trace", "info")));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(console_filter),
        )
        .with(file_layer)
        .init();

    guard
}

fn load(path: Option<&PathBuf>) -> Result<LoadedConfig> {
    Ok(match path {
        Some(path) => homebase_config::load_config_from(path)?,
        None => homebase_config::load_config(None)?,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // A missing .env is normal
    let _ = dotenvy::dotenv();

    let loaded = load(cli.config.as_ref())?;
    let _guard = init_logging(cli.verbose, &loaded.config);

    for warning in &loaded.warnings {
        tracing::warn!("{}", warning);
    }
    tracing::debug!(sources = ?loaded.loaded_from(), "configuration loaded");

    let ctx = commands::Context {
        json_output: cli.json,
        verbose: cli.verbose,
        loaded,
    };

    match cli.command {
        Commands::Status(args) => status::run(args, &ctx).await,
        Commands::Tools(args) => tools::run(args, &ctx).await,
        Commands::Budget(args) => finance::run_budget(args, &ctx).await,
        Commands::Loan(args) => finance::run_loan(args, &ctx).await,
        Commands::Home(args) => catalog::run_home(args, &ctx).await,
        Commands::Prices(args) => catalog::run_prices(args, &ctx).await,
        Commands::Transit(args) => location::run(args, &ctx).await,
        Commands::Programs(args) => catalog::run_programs(args, &ctx).await,
        Commands::Properties(args) => catalog::run_properties(args, &ctx).await,
        Commands::Call(args) => call::run(args, &ctx).await,
        Commands::Config(args) => config::run(args, &ctx).await,
    }
}
