//! Config command - configuration management.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};
use homebase_config::HomebaseConfig;

use super::Context;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the merged configuration (variables left unexpanded)
    Show,

    /// Show which config files are loaded and their precedence
    Which,

    /// Initialize a config file with the built-in service commands
    Init {
        /// Create project-local config (./homebase.toml) instead of user config
        #[arg(long)]
        local: bool,
    },

    /// Show configuration file path
    Path,
}

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => cmd_show(ctx),
        ConfigCommand::Which => cmd_which(ctx),
        ConfigCommand::Init { local } => cmd_init(local),
        ConfigCommand::Path => cmd_path(),
    }
}

fn cmd_show(ctx: &Context) -> Result<()> {
    let config = ctx.config();

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(config)?);
        return Ok(());
    }

    println!("# Homebase Configuration\n");

    let sources = ctx.loaded.loaded_from();
    if sources.is_empty() {
        println!("# No config files loaded (using built-in services)\n");
    } else {
        println!("# Config files:");
        for source in &sources {
            println!("#   {}", source.display());
        }
        println!();
    }

    print!("{}", config.to_toml()?);
    Ok(())
}

fn cmd_which(ctx: &Context) -> Result<()> {
    println!("Config file search order (later overrides earlier):\n");

    for source in &ctx.loaded.sources {
        let status = if source.loaded {
            "✓ loaded"
        } else {
            "· not found"
        };
        println!("  {} {}", status, source.path.display());
    }

    println!();
    let loaded_count = ctx.loaded.loaded_from().len();
    if loaded_count == 0 {
        println!("No config files found. Run 'homebase config init' to create one.");
    } else {
        println!("{} config file(s) loaded.", loaded_count);
    }

    Ok(())
}

fn cmd_init(local: bool) -> Result<()> {
    let path = if local {
        PathBuf::from("homebase.toml")
    } else {
        homebase_config::xdg_config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
    };

    if path.exists() {
        println!("Config file already exists: {}", path.display());
        return Ok(());
    }

    homebase_config::save_config(&HomebaseConfig::builtin(), &path)?;
    println!("✓ Created config file: {}", path.display());
    println!();
    println!("Next steps:");
    println!("  put credentials in .env or the environment, e.g. SUPABASE_ACCESS_TOKEN=...");
    println!("  homebase config show    # verify configuration");
    println!("  homebase status         # connect to every service");

    Ok(())
}

fn cmd_path() -> Result<()> {
    if let Some(path) = homebase_config::xdg_config_path() {
        println!("{}", path.display());
    } else {
        eprintln!("Could not determine config directory");
    }
    Ok(())
}
