mod commands;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "amzn-txn")]
#[command(about = "Scrape purchase transactions and their items from Amazon's payments history")]
struct Cli {
    /// Output format: json or table
    #[arg(long, default_value = "json", global = true)]
    output: String,

    /// Write output to this file instead of stdout
    #[arg(long, global = true)]
    out: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape transactions and order details
    Scrape(commands::scrape::ScrapeArgs),
    /// Show what the parser extracts from a saved page
    Inspect(commands::inspect::InspectArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    // Must run before parsing so .env values reach clap's env fallbacks.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("amzn_txn=info".parse()?),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let format = match cli.output.as_str() {
        "table" => OutputFormat::Table,
        _ => OutputFormat::Json,
    };
    let out = cli.out.as_deref();

    match &cli.command {
        Commands::Scrape(args) => commands::scrape::run(args, &format, out).await?,
        Commands::Inspect(args) => commands::inspect::run(args, &format, out)?,
    }

    Ok(())
}
