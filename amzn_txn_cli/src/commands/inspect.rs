//! The `inspect` subcommand: runs the parser over a saved page, for checking
//! selectors against fresh markup.

use std::path::{Path, PathBuf};

use amzn_txn_lib::dom::HtmlDocument;
use amzn_txn_lib::parser::{
    extract_items_page_url, extract_order_links, next_page_control, parse_items_page,
    parse_order_details_page,
};
use amzn_txn_lib::types::{OrderDetails, OrderLink};
use amzn_txn_lib::NextPageControl;
use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use serde::Serialize;

use crate::output::{details_table, emit, links_table, render_json, OutputFormat};

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum PageKind {
    /// A transactions list page
    Transactions,
    /// An order details page
    Details,
    /// A grocery "all items" page
    Items,
}

#[derive(Args)]
pub struct InspectArgs {
    /// Saved HTML page
    pub file: PathBuf,

    /// Which kind of page FILE is
    #[arg(long, value_enum, default_value = "transactions")]
    pub kind: PageKind,

    /// Address the page was saved from; relative links resolve against it
    #[arg(long)]
    pub url: Option<String>,

    /// Order id to attach to parsed details
    #[arg(long, default_value = "")]
    pub order_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TransactionsInspection {
    next_page: NextPageControl,
    links: Vec<OrderLink>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DetailsInspection {
    items_page_url: Option<String>,
    details: OrderDetails,
}

pub fn run(args: &InspectArgs, format: &OutputFormat, out: Option<&Path>) -> Result<()> {
    let html = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let doc = HtmlDocument::parse_with_base(&html, args.url.as_deref());

    let text = match args.kind {
        PageKind::Transactions => {
            let inspection = TransactionsInspection {
                next_page: next_page_control(&doc),
                links: extract_order_links(&doc),
            };
            eprintln!(
                "{} order link(s), next page control: {:?}",
                inspection.links.len(),
                inspection.next_page
            );
            match format {
                OutputFormat::Json => render_json(&inspection)?,
                OutputFormat::Table => links_table(&inspection.links),
            }
        }
        PageKind::Details => {
            let inspection = DetailsInspection {
                items_page_url: extract_items_page_url(&doc),
                details: parse_order_details_page(&doc, &args.order_id),
            };
            if let Some(url) = &inspection.items_page_url {
                eprintln!("Items page link: {}", url);
            }
            match format {
                OutputFormat::Json => render_json(&inspection)?,
                OutputFormat::Table => details_table(&inspection.details),
            }
        }
        PageKind::Items => {
            let details = parse_items_page(&doc, &args.order_id);
            match format {
                OutputFormat::Json => render_json(&details)?,
                OutputFormat::Table => details_table(&details),
            }
        }
    };

    emit(&text, out)
}
