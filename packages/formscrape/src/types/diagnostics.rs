//! Structured diagnostics attached to an extracted document.
//!
//! Soft parse anomalies never abort an extraction; they are recorded here
//! (and logged via `tracing`) so callers can inspect what was defaulted
//! or overridden.

use serde::{Deserialize, Serialize};

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    Info,
    Warning,
}

/// A single anomaly observed while parsing or reconciling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity
    pub level: DiagnosticLevel,

    /// Zero-based question index, when the anomaly is per-question
    pub question_index: Option<usize>,

    /// Human-readable description
    pub message: String,
}

impl Diagnostic {
    /// Record a warning scoped to one question.
    pub fn warning(question_index: usize, message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Warning,
            question_index: Some(question_index),
            message: message.into(),
        }
    }

    /// Record a document-level warning.
    pub fn document_warning(message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Warning,
            question_index: None,
            message: message.into(),
        }
    }
}
