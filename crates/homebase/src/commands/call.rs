//! Call command - raw tool invocation on any configured service.

use anyhow::{Context as _, Result, bail};
use clap::Args;
use console::Style;
use homebase_mcp::ToolContent;
use serde_json::Value;

use super::Context;

/// Arguments for the call command.
#[derive(Args, Debug)]
pub struct CallArgs {
    /// Service name (e.g. finance, catalog, location)
    pub service: String,

    /// Tool name
    pub tool: String,

    /// Tool arguments as a JSON object
    #[arg(long, short, default_value = "{}")]
    pub args: String,
}

/// Run the call command.
pub async fn run(args: CallArgs, ctx: &Context) -> Result<()> {
    let arguments: Value =
        serde_json::from_str(&args.args).context("--args must be valid JSON")?;
    if !arguments.is_object() {
        bail!("--args must be a JSON object");
    }

    let adapter = ctx.connect(Some(&args.service)).await?;
    let result = adapter.invoke(&args.service, &args.tool, arguments).await;
    adapter.disconnect_all().await;
    let result = result?;

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        let dim = Style::new().dim();
        for block in &result.content {
            match block {
                ToolContent::Text { text } => println!("{}", text),
                ToolContent::Image { mime_type, .. } => {
                    println!("{}", dim.apply_to(format!("[image: {}]", mime_type)))
                }
                ToolContent::Resource { resource } => {
                    println!("{}", dim.apply_to(format!("[resource: {}]", resource.uri)))
                }
                ToolContent::Other => println!("{}", dim.apply_to("[unsupported content]")),
            }
        }
    }

    if result.is_error() {
        bail!("tool '{}' on '{}' reported an error", args.tool, args.service);
    }
    Ok(())
}
