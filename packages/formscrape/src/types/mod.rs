//! Data types exchanged between the parsers and the serializer.

pub mod config;
pub mod diagnostics;
pub mod document;

pub use config::ExtractConfig;
pub use diagnostics::{Diagnostic, DiagnosticLevel};
pub use document::{FormDocument, QuestionRecord, NO_RESPONSE};
