//! The scrape loop: routes every order link to a fetch strategy and pages
//! back through the transaction history until the end date.

use std::fmt;
use std::time::Duration;

use amzn_txn_api::types::{OrderDetails, OrderLink, ScrapedOrder};
use chrono::NaiveDate;
use serde::Serialize;

use crate::client::{PageFetcher, Sleeper};
use crate::dates::{is_before_date, oldest_transaction_date, parse_date, validate_end_date};
use crate::dom::HtmlDocument;
use crate::error::TransactionsError;
use crate::merchant::{transaction_type_config, ItemSource};
use crate::navigation::PageNavigator;
use crate::parser::{self, NextPageControl};

pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(1000);
pub const DEFAULT_PAGE_LOAD_DELAY: Duration = Duration::from_millis(3000);
pub const DEFAULT_MAX_PAGES: u32 = 50;

pub const ORDER_DETAILS_FAILED: &str = "Failed to fetch order details";
pub const ITEMS_PAGE_FAILED: &str = "Failed to fetch items page";

/// Settings for one scrape run.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Oldest day to include, as free text like `"January 25, 2024"`. With
    /// no end date only the first page is read.
    pub end_date: Option<String>,
    /// Pause between consecutive order fetches.
    pub request_delay: Duration,
    /// Pause after turning a page, before reading it.
    pub page_load_delay: Duration,
    /// Hard limit on list pages read in one run.
    pub max_pages: u32,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            end_date: None,
            request_delay: DEFAULT_REQUEST_DELAY,
            page_load_delay: DEFAULT_PAGE_LOAD_DELAY,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

/// Why a run stopped reading list pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StopReason {
    /// A list page had no order links.
    NoTransactions,
    /// No end date was set, so only the first page was read.
    SinglePage,
    /// A transaction older than the end date was reached.
    ReachedEndDate,
    /// The next-page control was missing, disabled or failed.
    NoNextPage,
    /// The page limit was reached.
    PageLimit,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::NoTransactions => "no transactions found",
            Self::SinglePage => "single page mode",
            Self::ReachedEndDate => "reached end date",
            Self::NoNextPage => "no next page",
            Self::PageLimit => "page limit reached",
        };
        f.write_str(text)
    }
}

/// Records produced from one list page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageOutcome {
    pub orders: Vec<ScrapedOrder>,
    /// False when the end date was crossed or no end date is set.
    pub should_continue: bool,
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeReport {
    pub orders: Vec<ScrapedOrder>,
    pub pages_visited: u32,
    pub stop_reason: StopReason,
}

/// Turns order links into [`ScrapedOrder`] records, one request at a time.
///
/// Every link yields exactly one record. A failed fetch is written into the
/// record's `error` field and the run moves on to the next order.
pub struct TransactionScraper<F, S> {
    fetcher: F,
    sleeper: S,
    config: ScrapeConfig,
    end_date: Option<NaiveDate>,
}

impl<F: PageFetcher, S: Sleeper> TransactionScraper<F, S> {
    /// Validates the configured end date. An unparseable end date is
    /// rejected here, before any page is requested.
    pub fn new(fetcher: F, sleeper: S, config: ScrapeConfig) -> Result<Self, TransactionsError> {
        let end_date = validate_end_date(config.end_date.as_deref())?;
        Ok(Self {
            fetcher,
            sleeper,
            config,
            end_date,
        })
    }

    /// The parsed end date, if one was configured.
    pub fn end_date(&self) -> Option<NaiveDate> {
        self.end_date
    }

    /// Reads list pages from `navigator` until a stop condition is met.
    pub async fn run<N: PageNavigator + ?Sized>(&self, navigator: &mut N) -> ScrapeReport {
        match self.end_date {
            Some(date) => tracing::info!(
                "Pagination enabled: will scrape until reaching {}",
                date.format("%a %b %d %Y")
            ),
            None => tracing::info!("No end_date set: will scrape current page only"),
        }

        let max_pages = self.config.max_pages.max(1);
        let mut orders = Vec::new();
        let mut page = 1u32;

        let stop_reason = loop {
            tracing::info!("=== Page {} ===", page);
            let links = parser::extract_order_links(&navigator.current_document());
            tracing::info!("Found {} transactions", links.len());

            if links.is_empty() {
                tracing::info!("No transactions found on this page");
                break StopReason::NoTransactions;
            }

            if let Some(oldest) = oldest_transaction_date(&links) {
                tracing::info!(
                    "Oldest transaction on this page: {}",
                    oldest.format("%a %b %d %Y")
                );
            }

            let outcome = self.process_page(&links, self.end_date).await;
            orders.extend(outcome.orders);

            if !outcome.should_continue {
                if self.end_date.is_some() {
                    tracing::info!("Reached end_date, stopping");
                    break StopReason::ReachedEndDate;
                }
                break StopReason::SinglePage;
            }

            if page >= max_pages {
                tracing::warn!("Reached maximum page limit ({}), stopping", max_pages);
                break StopReason::PageLimit;
            }

            tracing::info!("Need to fetch more transactions...");
            match navigator.next_page_control() {
                NextPageControl::Absent => {
                    tracing::info!("No Next Page button found");
                    break StopReason::NoNextPage;
                }
                NextPageControl::Disabled => {
                    tracing::info!("Next Page button is disabled");
                    break StopReason::NoNextPage;
                }
                NextPageControl::Enabled => {}
            }

            tracing::info!("Clicking Next Page...");
            if !navigator.advance().await {
                tracing::info!("Cannot navigate to next page");
                break StopReason::NoNextPage;
            }

            tracing::info!("Waiting for next page to load...");
            self.sleeper.sleep(self.config.page_load_delay).await;
            page += 1;
        };

        tracing::info!(
            "Scrape finished after {} page(s) with {} order(s): {}",
            page,
            orders.len(),
            stop_reason
        );

        ScrapeReport {
            orders,
            pages_visited: page,
            stop_reason,
        }
    }

    /// Processes the links of one list page in order.
    ///
    /// With an end date, the first link dated strictly before it stops the
    /// page and the run; records already made are kept. Links with no
    /// parseable date are always processed.
    pub async fn process_page(
        &self,
        links: &[OrderLink],
        end_date: Option<NaiveDate>,
    ) -> PageOutcome {
        let mut orders = Vec::with_capacity(links.len());

        for (i, link) in links.iter().enumerate() {
            if let Some(bound) = end_date {
                let before = parse_date(&link.transaction_date)
                    .is_some_and(|date| is_before_date(date, bound));
                if before {
                    tracing::info!(
                        "Transaction {} ({}) is before end_date, stopping",
                        link.order_id,
                        link.transaction_date
                    );
                    return PageOutcome {
                        orders,
                        should_continue: false,
                    };
                }
            }

            tracing::info!(
                "Processing {}/{}: Order {} ({})",
                i + 1,
                links.len(),
                link.order_id,
                if link.merchant_type.is_empty() {
                    "unknown"
                } else {
                    link.merchant_type.as_str()
                }
            );
            orders.push(self.process_order(link).await);

            if i + 1 < links.len() {
                self.sleeper.sleep(self.config.request_delay).await;
            }
        }

        PageOutcome {
            orders,
            should_continue: end_date.is_some(),
        }
    }

    /// Fetches and parses the details of one order according to its
    /// merchant label.
    pub async fn process_order(&self, link: &OrderLink) -> ScrapedOrder {
        let config = transaction_type_config(&link.merchant_type);
        match config.item_source {
            ItemSource::Skip => {
                tracing::info!("  Skipping: {}", config.description);
                ScrapedOrder::without_details(link.clone())
            }
            ItemSource::ItemsPage => {
                tracing::info!("  Fetching items page: {}", config.description);
                self.process_items_page_order(link).await
            }
            ItemSource::OrderDetails => self.process_details_order(link).await,
        }
    }

    async fn process_details_order(&self, link: &OrderLink) -> ScrapedOrder {
        let Some(html) = self.fetcher.fetch(&link.order_url).await else {
            return ScrapedOrder::failed(link.clone(), ORDER_DETAILS_FAILED);
        };

        let details = parse_details_html(&html, &link.order_url, &link.order_id);
        tracing::info!("  Found {} item(s)", details.items.len());
        log_items(&details);
        ScrapedOrder::from_parts(link.clone(), details)
    }

    async fn process_items_page_order(&self, link: &OrderLink) -> ScrapedOrder {
        let Some(details_html) = self.fetcher.fetch(&link.order_url).await else {
            return ScrapedOrder::failed(link.clone(), ORDER_DETAILS_FAILED);
        };

        let items_url = parser::extract_items_page_url(&HtmlDocument::parse_with_base(
            &details_html,
            Some(&link.order_url),
        ));

        let Some(items_url) = items_url else {
            let details = parse_details_html(&details_html, &link.order_url, &link.order_id);
            tracing::info!("  Found {} item(s) from details page", details.items.len());
            log_items(&details);
            return ScrapedOrder::from_parts(link.clone(), details);
        };

        self.sleeper.sleep(self.config.request_delay).await;
        let Some(items_html) = self.fetcher.fetch(&items_url).await else {
            return ScrapedOrder::failed(link.clone(), ITEMS_PAGE_FAILED);
        };

        let details = parser::parse_items_page(
            &HtmlDocument::parse_with_base(&items_html, Some(&items_url)),
            &link.order_id,
        );
        tracing::info!("  Found {} item(s) from items page", details.items.len());
        log_items(&details);
        ScrapedOrder::from_parts(link.clone(), details)
    }
}

fn parse_details_html(html: &str, page_url: &str, order_id: &str) -> OrderDetails {
    parser::parse_order_details_page(&HtmlDocument::parse_with_base(html, Some(page_url)), order_id)
}

fn log_items(details: &OrderDetails) {
    for (idx, item) in details.items.iter().enumerate() {
        let name: String = item.item_name.chars().take(50).collect();
        tracing::debug!("    {}. {} - {}", idx + 1, name, item.item_price);
    }
}
