//! Testing utilities - a mock fetcher for exercising the engine
//! without network access.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::{FetchError, FetchResult};
use crate::fetcher::{FetchedPage, PageFetcher};

/// A mock page fetcher serving canned markup.
///
/// Records every requested URL so tests can assert on fetch behavior.
#[derive(Default)]
pub struct MockFetcher {
    /// Canned markup by URL
    pages: HashMap<String, String>,

    /// When set, every fetch fails with this HTTP status
    failure_status: Option<u16>,

    /// URLs requested so far
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockFetcher {
    /// Create a mock with no pages; unknown URLs return HTTP 404.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `html` for `url`.
    pub fn with_page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.insert(url.into(), html.into());
        self
    }

    /// Fail every fetch with the given HTTP status.
    pub fn with_failure(mut self, status: u16) -> Self {
        self.failure_status = Some(status);
        self
    }

    /// URLs requested so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> FetchResult<FetchedPage> {
        self.calls.write().unwrap().push(url.to_string());

        if let Some(status) = self.failure_status {
            return Err(FetchError::Status {
                status,
                url: url.to_string(),
            });
        }

        match self.pages.get(url) {
            Some(html) => Ok(FetchedPage {
                url: url.to_string(),
                html: html.clone(),
                fetched_at: Utc::now(),
            }),
            None => Err(FetchError::Status {
                status: 404,
                url: url.to_string(),
            }),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_serves_pages_and_records_calls() {
        let fetcher = MockFetcher::new().with_page("https://x", "<html></html>");

        let page = fetcher.fetch("https://x").await.unwrap();
        assert_eq!(page.html, "<html></html>");

        let missing = fetcher.fetch("https://y").await;
        assert!(matches!(
            missing,
            Err(FetchError::Status { status: 404, .. })
        ));

        assert_eq!(fetcher.calls(), vec!["https://x", "https://y"]);
    }
}
