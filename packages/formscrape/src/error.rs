//! Typed errors for the extraction library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.

use thiserror::Error;

/// Errors that can occur while extracting a form document.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Fetching the results page failed
    #[error("failed to access the form: {0}")]
    Fetch(#[from] FetchError),

    /// The embedded form-data script was not found in the page
    #[error("could not find form data in the page")]
    PayloadMissing,

    /// The embedded form-data script did not parse as JSON
    #[error("error parsing form data: {0}")]
    PayloadParse(#[source] serde_json::Error),

    /// A CSS selector failed to compile
    #[error("invalid selector: {0}")]
    Selector(String),
}

/// Errors that can occur while fetching the results page.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Underlying HTTP request failed (network, timeout, redirect loop)
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server responded with a non-success status
    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },
}

/// Errors that can occur while serializing a document to CSV.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Input was not a valid form document (e.g. missing `questions`)
    #[error("invalid form document: {0}")]
    InvalidDocument(#[source] serde_json::Error),

    /// CSV writing failed
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    /// Flushing the CSV buffer failed
    #[error("CSV buffer error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractError>;

/// Result type alias for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for export operations.
pub type ExportResult<T> = std::result::Result<T, ExportError>;
