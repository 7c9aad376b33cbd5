//! Library layer for the transactions scraper: page parsing, merchant
//! routing, date bounds and the paginated scrape loop.
//!
//! Builds on the `amzn_txn_api` session client and record types. Parsing is
//! written against the [`dom::DocumentLike`] traits, and network access and
//! delays go through [`client::PageFetcher`] and [`client::Sleeper`], so the
//! whole loop runs against saved pages in tests.

pub mod client;
pub mod dates;
pub mod dom;
pub mod error;
pub mod merchant;
pub mod navigation;
pub mod parser;
pub mod scrape;

pub use amzn_txn_api;
pub use amzn_txn_api::types;
pub use amzn_txn_api::{Client, FormMethod, DEFAULT_BASE_URL};

pub use client::{PageFetcher, Sleeper, TokioSleeper};
pub use dom::{DocumentLike, Element, HtmlDocument, HtmlElement};
pub use error::TransactionsError;
pub use merchant::{ItemSource, TransactionTypeConfig};
pub use navigation::{PageNavigator, SessionNavigator, StaticPages};
pub use parser::{NextPageControl, PageTurnForm};
pub use scrape::{PageOutcome, ScrapeConfig, ScrapeReport, StopReason, TransactionScraper};
