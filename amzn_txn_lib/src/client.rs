//! Page fetching and request pacing used by the scraper.
//!
//! Both are traits so the scraper can run against in-memory pages and a
//! no-op clock in tests.

use std::time::Duration;

use async_trait::async_trait;

/// Fetches a page's HTML.
///
/// Failures never surface as errors: the implementation logs whatever went
/// wrong and returns `None`, and the caller records the order as failed.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Option<String>;
}

#[async_trait]
impl PageFetcher for amzn_txn_api::Client {
    async fn fetch(&self, url: &str) -> Option<String> {
        match self.get_html(url).await {
            Ok(html) => Some(html),
            Err(e) => {
                tracing::error!("Failed to fetch {}: {}", url, e);
                None
            }
        }
    }
}

/// Waits between requests.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}
