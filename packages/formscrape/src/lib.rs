//! Google Forms Score-View Extraction Library
//!
//! Scrapes a Google Form "view score" results page and produces one
//! unified record per quiz item by reconciling two sources describing
//! the same page:
//!
//! - the **structured payload**: a JSON array embedded in a script
//!   block holding the form's authoring data (questions, options,
//!   correct answers, point values), and
//! - the **rendered markup**: the HTML tree showing what actually
//!   happened (submitted answers, awarded points, localized correctness
//!   labels, feedback).
//!
//! The payload is authoritative for what a question is; the markup is
//! authoritative for what the respondent did. The reconciled
//! [`FormDocument`] can then be serialized to a fixed-column CSV.
//!
//! # Usage
//!
//! ```rust,ignore
//! use formscrape::{Extractor, write_csv};
//!
//! let extractor = Extractor::new()?;
//! let document = extractor.extract("https://docs.google.com/forms/d/e/.../viewscore").await?;
//! let csv_bytes = write_csv(&document)?;
//! ```
//!
//! # Modules
//!
//! - [`fetcher`] - page fetching behind the [`PageFetcher`] seam
//! - [`payload`] - embedded structured payload parsing
//! - [`reconcile`] - rendered markup reconciliation
//! - [`engine`] - orchestration ([`Extractor`], [`parse_document`])
//! - [`export`] - fixed-column CSV serialization
//! - [`testing`] - mock fetcher for tests

pub mod engine;
pub mod error;
pub mod export;
pub mod fetcher;
pub mod payload;
pub mod reconcile;
pub mod testing;
pub mod types;

// Re-export core types at crate root
pub use engine::{parse_document, Extractor};
pub use error::{ExportError, ExtractError, FetchError, Result};
pub use export::{attachment_filename, csv_from_json, write_csv, CSV_HEADERS};
pub use fetcher::{FetchedPage, HttpFetcher, PageFetcher};
pub use types::{
    Diagnostic, DiagnosticLevel, ExtractConfig, FormDocument, QuestionRecord, NO_RESPONSE,
};

// Re-export testing utilities
pub use testing::MockFetcher;
