//! The `scrape` subcommand: walks the payments history and fetches every
//! order's details.

use std::path::{Path, PathBuf};
use std::time::Duration;

use amzn_txn_lib::scrape::{DEFAULT_MAX_PAGES, ScrapeReport};
use amzn_txn_lib::{
    Client, ScrapeConfig, SessionNavigator, StaticPages, TokioSleeper, TransactionScraper,
    DEFAULT_BASE_URL,
};
use anyhow::{Context, Result};
use clap::Args;

use crate::output::{emit, orders_table, print_summary, render_json, OutputFormat};

pub const DEFAULT_START_URL: &str = "https://www.amazon.com/cpe/yourpayments/transactions";

/// Arguments for the `scrape` subcommand.
///
/// Every network setting can also come from the environment or a `.env`
/// file. The session cookie is never validated; requests simply replay it.
#[derive(Args)]
pub struct ScrapeArgs {
    /// Keep paging back until transactions dated before this day (e.g. "January 25, 2024").
    /// Without it only the first page is scraped.
    #[arg(long, env = "AMZN_TXN_END_DATE")]
    pub end_date: Option<String>,

    /// Cookie header copied from a signed-in browser session
    #[arg(long, env = "AMZN_TXN_COOKIE", hide_env_values = true)]
    pub cookie: Option<String>,

    /// Transactions page to start from
    #[arg(long, env = "AMZN_TXN_START_URL", default_value = DEFAULT_START_URL)]
    pub start_url: String,

    /// Origin that relative links are resolved against
    #[arg(long, env = "AMZN_TXN_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Delay between order requests, in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub delay_ms: u64,

    /// Delay after turning a page, in milliseconds
    #[arg(long, default_value_t = 3000)]
    pub page_delay_ms: u64,

    /// Maximum number of transaction pages to read
    #[arg(long, default_value_t = DEFAULT_MAX_PAGES)]
    pub max_pages: u32,

    /// Read transaction pages from saved HTML files, in order, instead of
    /// loading the start URL. Order details are still fetched live.
    #[arg(long, num_args = 1..)]
    pub html: Vec<PathBuf>,
}

impl ScrapeArgs {
    fn config(&self) -> ScrapeConfig {
        ScrapeConfig {
            end_date: self.end_date.clone(),
            request_delay: Duration::from_millis(self.delay_ms),
            page_load_delay: Duration::from_millis(self.page_delay_ms),
            max_pages: self.max_pages,
        }
    }
}

pub async fn run(args: &ScrapeArgs, format: &OutputFormat, out: Option<&Path>) -> Result<()> {
    if args.cookie.as_deref().map_or(true, |c| c.trim().is_empty()) {
        tracing::warn!("No session cookie set; order pages will likely redirect to sign-in");
    }

    let client = Client::with_base_url(&args.base_url, args.cookie.as_deref())?;
    // Rejects a bad end date before anything is requested.
    let scraper = TransactionScraper::new(client.clone(), TokioSleeper, args.config())?;

    let report = if args.html.is_empty() {
        let mut navigator = SessionNavigator::open(client, &args.start_url).await?;
        scraper.run(&mut navigator).await
    } else {
        let pages = read_pages(&args.html)?;
        let base = client.resolve(&args.start_url)?.to_string();
        let mut navigator = StaticPages::new(pages, Some(base));
        scraper.run(&mut navigator).await
    };

    write_report(&report, format, out)
}

fn read_pages(paths: &[PathBuf]) -> Result<Vec<String>> {
    paths
        .iter()
        .map(|path| {
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))
        })
        .collect()
}

fn write_report(report: &ScrapeReport, format: &OutputFormat, out: Option<&Path>) -> Result<()> {
    print_summary(report);
    let text = match format {
        OutputFormat::Json => render_json(&report.orders)?,
        OutputFormat::Table => orders_table(&report.orders),
    };
    emit(&text, out)
}
