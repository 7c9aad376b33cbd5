//! The transactions list page currently being read, and how to turn it.

use amzn_txn_api::Client;
use async_trait::async_trait;

use crate::dom::HtmlDocument;
use crate::error::TransactionsError;
use crate::parser::{self, NextPageControl};

/// A list page plus the ability to move to the next one.
#[async_trait]
pub trait PageNavigator: Send {
    fn current_html(&self) -> &str;

    /// The URL the current page was loaded from, used to resolve its links.
    fn current_url(&self) -> Option<&str>;

    fn current_document(&self) -> HtmlDocument {
        HtmlDocument::parse_with_base(self.current_html(), self.current_url())
    }

    fn next_page_control(&self) -> NextPageControl {
        parser::next_page_control(&self.current_document())
    }

    /// Triggers the next-page control and replaces the current page with the
    /// result. Returns `false`, leaving the current page in place, when the
    /// control is unusable or the page turn failed.
    async fn advance(&mut self) -> bool;
}

/// Reads list pages over HTTP with the session client.
///
/// Turning a page submits the form the next-page button belongs to, the same
/// request a click in the browser would send.
pub struct SessionNavigator {
    client: Client,
    url: String,
    html: String,
}

impl SessionNavigator {
    /// Loads the first list page. Failing to load it ends the run, since
    /// there is nothing to scrape without it.
    pub async fn open(client: Client, start_url: &str) -> Result<Self, TransactionsError> {
        let url = client.resolve(start_url)?.to_string();
        tracing::info!("Loading transactions page {}", url);
        let html = client.get_html(&url).await?;
        Ok(Self { client, url, html })
    }
}

#[async_trait]
impl PageNavigator for SessionNavigator {
    fn current_html(&self) -> &str {
        &self.html
    }

    fn current_url(&self) -> Option<&str> {
        Some(&self.url)
    }

    async fn advance(&mut self) -> bool {
        let form = parser::page_turn_form(&self.current_document());
        let Some(form) = form else {
            tracing::warn!("Next Page button is not usable or not inside a form");
            return false;
        };

        let action = form.action.unwrap_or_else(|| self.url.clone());
        match self
            .client
            .submit_form(&action, form.method, &form.fields)
            .await
        {
            Ok(html) => {
                self.url = action;
                self.html = html;
                true
            }
            Err(e) => {
                tracing::error!("Failed to load next page: {}", e);
                false
            }
        }
    }
}

/// List pages that were saved ahead of time, read in order.
pub struct StaticPages {
    pages: Vec<String>,
    base_url: Option<String>,
    index: usize,
}

impl StaticPages {
    /// `base_url` stands in for the address the pages were saved from, so
    /// their relative links resolve to fetchable URLs.
    pub fn new(pages: Vec<String>, base_url: Option<String>) -> Self {
        Self {
            pages,
            base_url,
            index: 0,
        }
    }

    /// Zero-based index of the page currently shown.
    pub fn position(&self) -> usize {
        self.index
    }
}

#[async_trait]
impl PageNavigator for StaticPages {
    fn current_html(&self) -> &str {
        self.pages.get(self.index).map(String::as_str).unwrap_or_default()
    }

    fn current_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    async fn advance(&mut self) -> bool {
        if !self.next_page_control().can_advance() || self.index + 1 >= self.pages.len() {
            return false;
        }
        self.index += 1;
        true
    }
}
