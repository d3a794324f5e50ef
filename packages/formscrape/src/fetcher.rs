//! Page fetching - one buffered GET per extraction.
//!
//! Google serves the score-view page to anything that looks like a
//! browser; non-browser user agents are sometimes rejected, so the
//! default client sends realistic headers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{FetchError, FetchResult};

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// A fetched results page, fully buffered.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL that was requested
    pub url: String,

    /// Raw markup text
    pub html: String,

    /// When the page was fetched
    pub fetched_at: DateTime<Utc>,
}

impl FetchedPage {
    /// Byte length of the markup, for diagnostics.
    pub fn content_length(&self) -> usize {
        self.html.len()
    }
}

/// Source of raw page markup.
///
/// The extraction engine is generic over this seam so tests can supply
/// canned markup without touching the network.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch the page at `url`. A failed fetch of a results page is not
    /// transient-recoverable, so implementations do not retry.
    async fn fetch(&self, url: &str) -> FetchResult<FetchedPage>;

    /// Short identifier for logging.
    fn name(&self) -> &str;
}

/// HTTP fetcher using reqwest with browser-like headers.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher with browser-like headers and a bounded timeout.
    pub fn new() -> FetchResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,\
                 image/avif,image/webp,image/apng,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(BROWSER_USER_AGENT)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self { client })
    }

    /// Use a preconfigured HTTP client instead of the default one.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> FetchResult<FetchedPage> {
        debug!(url = %url, "fetching form page");

        let response = self.client.get(url).send().await.map_err(|e| {
            warn!(url = %url, error = %e, "HTTP request failed");
            FetchError::Request(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = %status, "non-success response");
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let html = response.text().await?;
        info!(
            url = %url,
            content_length = html.len(),
            "successfully fetched the form page"
        );

        Ok(FetchedPage {
            url: url.to_string(),
            html,
            fetched_at: Utc::now(),
        })
    }

    fn name(&self) -> &str {
        "http"
    }
}
