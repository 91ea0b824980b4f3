//! Status command - connects to every service and reports the outcome.

use anyhow::Result;
use clap::Args;
use console::{Style, style};
use homebase_tools::ServiceStatus;

use super::Context;

/// Arguments for the status command.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Also show each service's launch command
    #[arg(short, long)]
    pub detailed: bool,
}

/// Run the status command.
pub async fn run(args: StatusArgs, ctx: &Context) -> Result<()> {
    let adapter = ctx.connect(None).await?;
    let status = adapter.check_running();
    adapter.disconnect_all().await;

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    let green = Style::new().green();
    let red = Style::new().red();
    let dim = Style::new().dim();

    println!();
    println!("{}", style("Homebase Service Status").bold());
    println!("{}", dim.apply_to("─".repeat(40)));
    println!();

    if status.is_empty() {
        println!("  {}", dim.apply_to("No services enabled."));
        println!();
        return Ok(());
    }

    for (name, service) in &status {
        let marker = match service {
            ServiceStatus::Connected => green.apply_to(format!("● {}", service)),
            ServiceStatus::Failed(_) => red.apply_to(format!("● {}", service)),
            _ => dim.apply_to(format!("○ {}", service)),
        };
        println!("  {:<10} {}", dim.apply_to(format!("{}:", name)), marker);

        if args.detailed
            && let Some(entry) = ctx.config().service(name)
        {
            let command = entry.command.as_deref().unwrap_or("");
            println!("  {:<10} {}", "", dim.apply_to(command));
        }
    }

    println!();
    Ok(())
}
