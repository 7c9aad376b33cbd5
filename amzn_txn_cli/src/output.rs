use std::path::Path;

use amzn_txn_lib::types::{OrderDetails, OrderLink, ScrapedOrder};
use amzn_txn_lib::ScrapeReport;
use anyhow::{Context, Result};
use serde::Serialize;
use tabled::{Table, Tabled};

#[derive(Clone, Debug)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Tabled)]
struct OrderRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Order")]
    order_id: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Merchant")]
    merchant: String,
    #[tabled(rename = "Payment")]
    payment: String,
    #[tabled(rename = "Items")]
    items: usize,
    #[tabled(rename = "First Item")]
    first_item: String,
    #[tabled(rename = "Error")]
    error: String,
}

#[derive(Tabled)]
struct LinkRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Order")]
    order_id: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Merchant")]
    merchant: String,
    #[tabled(rename = "Payment")]
    payment: String,
}

#[derive(Tabled)]
struct ItemRow {
    #[tabled(rename = "Item")]
    name: String,
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "ASIN")]
    asin: String,
}

// -- Row builders --

fn build_order_rows(orders: &[ScrapedOrder]) -> Vec<OrderRow> {
    orders
        .iter()
        .map(|o| OrderRow {
            date: o.transaction_date.clone(),
            order_id: o.order_id.clone(),
            amount: o.transaction_amount.clone(),
            merchant: o.merchant_type.clone(),
            payment: o.payment_method.clone(),
            items: o.items.len(),
            first_item: o
                .items
                .first()
                .map(|i| truncate(&i.item_name, 40))
                .unwrap_or_default(),
            error: o.error.clone().unwrap_or_default(),
        })
        .collect()
}

fn build_link_rows(links: &[OrderLink]) -> Vec<LinkRow> {
    links
        .iter()
        .map(|l| LinkRow {
            date: l.transaction_date.clone(),
            order_id: l.order_id.clone(),
            amount: l.transaction_amount.clone(),
            merchant: l.merchant_type.clone(),
            payment: l.payment_method.clone(),
        })
        .collect()
}

fn build_item_rows(details: &OrderDetails) -> Vec<ItemRow> {
    details
        .items
        .iter()
        .map(|i| ItemRow {
            name: truncate(&i.item_name, 60),
            price: i.item_price.clone(),
            asin: i.asin.clone(),
        })
        .collect()
}

// -- Rendering --

pub fn orders_table(orders: &[ScrapedOrder]) -> String {
    Table::new(build_order_rows(orders)).to_string()
}

pub fn links_table(links: &[OrderLink]) -> String {
    Table::new(build_link_rows(links)).to_string()
}

pub fn details_table(details: &OrderDetails) -> String {
    format!(
        "Order placed: {}\nOrder total: {}\n{}",
        details.order_placed_date,
        details.order_total,
        Table::new(build_item_rows(details))
    )
}

/// Pretty JSON with 2-space indentation.
pub fn render_json<T: Serialize>(data: &T) -> Result<String> {
    serde_json::to_string_pretty(data).context("Failed to serialize to JSON")
}

/// Prints `text` to stdout, or writes it to `out` when given.
pub fn emit(text: &str, out: Option<&Path>) -> Result<()> {
    match out {
        Some(path) => {
            std::fs::write(path, format!("{}\n", text))
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Wrote {}", path.display());
        }
        None => println!("{}", text),
    }
    Ok(())
}

/// One-line run summary on stderr, keeping stdout for the data.
pub fn print_summary(report: &ScrapeReport) {
    let failed = report.orders.iter().filter(|o| o.error.is_some()).count();
    eprintln!(
        "Scraped {} order(s) from {} page(s), {} failed ({})",
        report.orders.len(),
        report.pages_visited,
        failed,
        report.stop_reason
    );
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max).collect();
        format!("{}...", head.trim_end())
    }
}
