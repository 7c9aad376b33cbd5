//! Error types for the library layer.

use std::fmt;

/// Errors that abort a scrape run.
///
/// Per-order fetch failures are not errors at this level: they are recorded
/// on the affected [`ScrapedOrder`](crate::types::ScrapedOrder) and the run
/// carries on.
#[derive(Debug)]
pub enum TransactionsError {
    /// An error from the underlying HTTP client.
    Api(amzn_txn_api::Error),
    /// User-provided input failed validation.
    InvalidInput(String),
    /// JSON serialization or deserialization failed.
    Serialization(serde_json::Error),
}

impl fmt::Display for TransactionsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Api(e) => write!(f, "API error: {}", e),
            Self::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            Self::Serialization(e) => write!(f, "Serialization error: {}", e),
        }
    }
}

impl std::error::Error for TransactionsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Api(e) => Some(e),
            Self::Serialization(e) => Some(e),
            Self::InvalidInput(_) => None,
        }
    }
}

impl From<amzn_txn_api::Error> for TransactionsError {
    fn from(e: amzn_txn_api::Error) -> Self {
        Self::Api(e)
    }
}

impl From<serde_json::Error> for TransactionsError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e)
    }
}
