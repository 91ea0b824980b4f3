//! Tools command - lists the tools each connected service advertises.

use anyhow::Result;
use clap::Args;
use console::{Style, style};
use serde_json::json;

use super::Context;

/// Arguments for the tools command.
#[derive(Args, Debug)]
pub struct ToolsArgs {
    /// Only list tools of this service
    pub service: Option<String>,

    /// Show full input schemas
    #[arg(long)]
    pub full: bool,
}

/// Run the tools command.
pub async fn run(args: ToolsArgs, ctx: &Context) -> Result<()> {
    let adapter = ctx.connect(args.service.as_deref()).await?;
    let status = adapter.check_running();
    let tools = adapter.get_available_tools().await;
    adapter.disconnect_all().await;

    if ctx.json_output {
        let output: serde_json::Map<String, serde_json::Value> = tools
            .iter()
            .map(|(service, tools)| {
                let list = tools
                    .iter()
                    .map(|t| {
                        let mut entry = json!({ "name": t.name, "description": t.description });
                        if args.full {
                            entry["inputSchema"] = json!(t.input_schema);
                        }
                        entry
                    })
                    .collect::<Vec<_>>();
                (service.clone(), json!(list))
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let dim = Style::new().dim();
    for (service, state) in &status {
        println!();
        println!("{} {}", style(service).bold(), dim.apply_to(format!("({})", state)));

        let Some(list) = tools.get(service) else {
            continue;
        };
        if list.is_empty() {
            println!("  {}", dim.apply_to("no tools advertised"));
        }
        for tool in list {
            match tool.description {
                Some(ref description) => {
                    println!("  {:<24} {}", tool.name, dim.apply_to(description))
                }
                None => println!("  {}", tool.name),
            }
            if args.full
                && let Some(ref schema) = tool.input_schema
            {
                for line in serde_json::to_string_pretty(schema)?.lines() {
                    println!("      {}", dim.apply_to(line));
                }
            }
        }
    }
    println!();

    Ok(())
}
