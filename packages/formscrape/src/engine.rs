//! Extraction engine - composes fetch, payload parse, and reconcile.
//!
//! One extraction is a single synchronous chain per call: one buffered
//! network fetch, then in-memory parsing. Invocations are independent
//! and stateless, so an `Extractor` can serve concurrent callers.

use scraper::Html;
use tracing::info;

use crate::error::Result;
use crate::fetcher::{HttpFetcher, PageFetcher};
use crate::payload;
use crate::reconcile::{self, Selectors};
use crate::types::{document, ExtractConfig, FormDocument};

/// Orchestrator turning a score-view URL into a [`FormDocument`].
///
/// Generic over the fetcher so tests can supply canned markup; see
/// [`crate::testing::MockFetcher`].
pub struct Extractor<F: PageFetcher> {
    fetcher: F,
    config: ExtractConfig,
}

impl Extractor<HttpFetcher> {
    /// Create an extractor backed by the default HTTP fetcher.
    pub fn new() -> Result<Self> {
        Ok(Self::with_fetcher(HttpFetcher::new()?))
    }
}

impl<F: PageFetcher> Extractor<F> {
    /// Create an extractor with an injected fetcher.
    pub fn with_fetcher(fetcher: F) -> Self {
        Self {
            fetcher,
            config: ExtractConfig::default(),
        }
    }

    /// Replace the reconciliation config.
    pub fn with_config(mut self, config: ExtractConfig) -> Self {
        self.config = config;
        self
    }

    /// Fetch the score-view page and extract a unified document.
    ///
    /// A failed fetch or a missing/malformed payload aborts the call;
    /// everything else degrades to defaults recorded in the document's
    /// diagnostics.
    pub async fn extract(&self, form_url: &str) -> Result<FormDocument> {
        let page = self.fetcher.fetch(form_url).await?;
        let document = parse_document(&page.html, &self.config)?;
        info!(
            url = %form_url,
            fetcher = self.fetcher.name(),
            questions = document.questions.len(),
            diagnostics = document.diagnostics.len(),
            "extraction complete"
        );
        Ok(document)
    }
}

/// Parse already-fetched markup into a unified document.
///
/// Exposed for callers that hold the page text themselves. The payload
/// parser runs first and produces preliminary records; the reconciler
/// then mutates them in place with markup-side facts. The resulting
/// question count is the maximum of the two sources' counts.
pub fn parse_document(html: &str, config: &ExtractConfig) -> Result<FormDocument> {
    let selectors = Selectors::new()?;
    let dom = Html::parse_document(html);
    let mut diagnostics = Vec::new();

    let title =
        reconcile::extract_title(&dom, &selectors).unwrap_or_else(document::default_title);
    let mut questions = payload::parse_questions(&dom, &mut diagnostics)?;
    reconcile::reconcile(&dom, &selectors, config, &mut questions, &mut diagnostics);

    Ok(FormDocument {
        title,
        questions,
        diagnostics,
    })
}
