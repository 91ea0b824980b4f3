//! Catalog commands - property sales and assistance programs.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use clap::Args;
use console::{Style, style};
use homebase_tools::ServiceKind;

use super::{Context, check_error, display, print_record};

/// Arguments for the home command.
#[derive(Args, Debug)]
pub struct HomeArgs {
    /// Property id
    pub id: i64,
}

/// Arguments for the prices command.
#[derive(Args, Debug)]
pub struct PricesArgs {
    /// Five-digit ZIP code
    pub zip: String,

    /// Number of residential units
    pub units: i64,
}

/// Arguments for the programs command.
#[derive(Args, Debug)]
pub struct ProgramsArgs {
    /// File holding the query embedding as a JSON array of numbers
    #[arg(long, short)]
    pub embedding: PathBuf,

    /// Maximum number of programs
    #[arg(long, short, default_value = "5")]
    pub limit: u32,
}

/// Arguments for the properties command.
#[derive(Args, Debug)]
pub struct PropertiesArgs {
    /// Maximum number of properties
    #[arg(long, short, default_value = "10")]
    pub limit: u32,
}

pub async fn run_home(args: HomeArgs, ctx: &Context) -> Result<()> {
    let value = ctx
        .with_service(ServiceKind::Catalog, |tools| async move {
            tools.query_home_by_id(args.id).await
        })
        .await?;
    print_record("Property", &value, ctx)
}

pub async fn run_prices(args: PricesArgs, ctx: &Context) -> Result<()> {
    let value = ctx
        .with_service(ServiceKind::Catalog, |tools| async move {
            tools
                .query_price_data_by_zip_and_units(&args.zip, args.units)
                .await
        })
        .await?;
    print_record("Sale Prices", &value, ctx)
}

/// Read an embedding file: a JSON array of numbers.
fn read_embedding(path: &Path) -> Result<Vec<f64>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read embedding file {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| {
        format!(
            "embedding file {} must hold a JSON array of numbers",
            path.display()
        )
    })
}

pub async fn run_programs(args: ProgramsArgs, ctx: &Context) -> Result<()> {
    let embedding = read_embedding(&args.embedding)?;
    let limit = args.limit;
    let value = ctx
        .with_service(ServiceKind::Catalog, |tools| async move {
            tools.search_programs(&embedding, limit).await
        })
        .await?;
    check_error(&value, ctx)?;

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let dim = Style::new().dim();
    let programs = value["programs"].as_array().cloned().unwrap_or_default();

    println!();
    println!(
        "{} {}",
        style("Assistance Programs").bold(),
        dim.apply_to(format!("({} found)", display(&value["total_found"])))
    );
    println!("{}", dim.apply_to("─".repeat(40)));
    for program in &programs {
        let score = program["similarity_score"].as_f64().unwrap_or(0.0);
        println!();
        println!(
            "  {}. {} {}",
            display(&program["rank"]),
            style(display(&program["program_name"])).bold(),
            dim.apply_to(format!("(similarity {:.3})", score))
        );
        let facts: Vec<String> = ["jurisdiction", "assistance_type", "max_benefit"]
            .iter()
            .map(|key| display(&program[*key]))
            .filter(|s| !s.is_empty())
            .collect();
        if !facts.is_empty() {
            println!("     {}", dim.apply_to(facts.join(" · ")));
        }
        for key in ["eligibility", "formatted_text"] {
            let text = display(&program[key]);
            if !text.is_empty() {
                println!("     {}", text);
            }
        }
    }
    println!();

    Ok(())
}

pub async fn run_properties(args: PropertiesArgs, ctx: &Context) -> Result<()> {
    let limit = args.limit;
    let value = ctx
        .with_service(ServiceKind::Catalog, |tools| async move {
            tools.query_properties(limit).await
        })
        .await?;
    check_error(&value, ctx)?;

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let rows = value.as_array().cloned().unwrap_or_default();
    if rows.is_empty() {
        println!("No properties found.");
        return Ok(());
    }

    println!(
        "{:<8} {:<28} {:<20} {:<6} {:>14} {:>6}",
        "ID", "ADDRESS", "NEIGHBORHOOD", "ZIP", "SALE PRICE", "BUILT"
    );
    println!("{}", "-".repeat(87));
    for row in &rows {
        println!(
            "{:<8} {:<28} {:<20} {:<6} {:>14} {:>6}",
            display(&row["home_id"]),
            truncate(&display(&row["address"]), 28),
            truncate(&display(&row["neighborhood"]), 20),
            display(&row["zip_code"]),
            format!("{:.2}", row["sale_price"].as_f64().unwrap_or(0.0)),
            display(&row["year_built"]),
        );
    }

    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", head)
    }
}
