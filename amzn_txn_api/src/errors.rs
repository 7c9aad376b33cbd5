//! Error types for the session client.

/// Errors that can occur when requesting pages from the site.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// An HTTP request failed (network error, timeout, or client build failure).
    #[error("Request failed")]
    RequestFailed,
    /// The site returned a non-success status with a body snippet.
    #[error("Request failed with status {status}")]
    HttpStatus { status: u16, body: String },
    /// A page URL could not be parsed or resolved against the base URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}
