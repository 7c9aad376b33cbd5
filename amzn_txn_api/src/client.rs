//! HTTP client for the signed-in retail site.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use url::Url;

use crate::{user_agent::get_user_agent, Error};

/// Origin used to resolve relative links when no other base is configured.
pub const DEFAULT_BASE_URL: &str = "https://www.amazon.com";

/// HTTP method of a form submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMethod {
    Get,
    Post,
}

/// HTTP client that replays an existing browser session.
///
/// The client never signs in. It forwards the session cookie it was given
/// verbatim on every request, with browser-like headers, a randomized user
/// agent and a 30-second timeout.
#[derive(Clone)]
pub struct Client {
    /// Base URL that relative page links are resolved against.
    base_url: Url,
    http: reqwest::Client,
}

impl Client {
    /// Creates a client for the production site using the given session cookie.
    pub fn new(cookie: Option<&str>) -> Result<Self, Error> {
        Self::with_base_url(DEFAULT_BASE_URL, cookie)
    }

    /// Creates a client with a custom base URL. Used for testing with wiremock.
    pub fn with_base_url(base_url: &str, cookie: Option<&str>) -> Result<Self, Error> {
        let base_url = Url::parse(base_url).map_err(|e| {
            tracing::error!("Invalid base URL {}: {}", base_url, e);
            Error::InvalidUrl(base_url.to_string())
        })?;

        let mut headers = HeaderMap::new();
        if let Some(cookie) = cookie.map(str::trim).filter(|c| !c.is_empty()) {
            let value = HeaderValue::from_str(cookie).map_err(|e| {
                tracing::error!("Session cookie is not a valid header value: {}", e);
                Error::RequestFailed
            })?;
            headers.insert(COOKIE, value);
        }

        let http = reqwest::Client::builder()
            .user_agent(get_user_agent())
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build HTTP client: {}", e);
                Error::RequestFailed
            })?;

        Ok(Self { base_url, http })
    }

    /// The base URL relative links are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolves `url` against the base URL. Absolute URLs pass through unchanged.
    pub fn resolve(&self, url: &str) -> Result<Url, Error> {
        self.base_url.join(url.trim()).map_err(|e| {
            tracing::error!("Invalid URL constructed from {}: {}", url, e);
            Error::InvalidUrl(url.to_string())
        })
    }

    /// Fetches a page and returns its HTML body.
    pub async fn get_html(&self, url: &str) -> Result<String, Error> {
        let url = self.resolve(url)?;
        let resp = self
            .http
            .get(url)
            .header("accept", "text/html,application/xhtml+xml")
            .header("accept-language", "en-US,en;q=0.9")
            .header("upgrade-insecure-requests", "1")
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to get page: {}", e);
                Error::RequestFailed
            })?;

        read_html(resp).await
    }

    /// Submits a form and returns the HTML of the page the site answers with.
    ///
    /// GET submissions append `fields` to the action's query string, POST
    /// submissions send them url-encoded in the body.
    pub async fn submit_form(
        &self,
        action: &str,
        method: FormMethod,
        fields: &[(String, String)],
    ) -> Result<String, Error> {
        let url = self.resolve(action)?;
        let request = match method {
            FormMethod::Get => self.http.get(url).query(fields),
            FormMethod::Post => self.http.post(url).form(fields),
        };
        let resp = request
            .header("accept", "text/html,application/xhtml+xml")
            .header("accept-language", "en-US,en;q=0.9")
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to submit form: {}", e);
                Error::RequestFailed
            })?;

        read_html(resp).await
    }
}

async fn read_html(resp: reqwest::Response) -> Result<String, Error> {
    let status = resp.status();
    let body = resp.text().await.map_err(|e| {
        tracing::error!("Failed to read response body: {}", e);
        Error::RequestFailed
    })?;

    if !status.is_success() {
        let snippet = truncate_body(&body);
        tracing::error!("Request failed with status {}: {}", status, snippet);
        return Err(Error::HttpStatus {
            status: status.as_u16(),
            body: snippet,
        });
    }

    Ok(body)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 2000;
    if body.len() <= MAX {
        body.to_string()
    } else {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...[truncated]", &body[..end])
    }
}
