//! Document types - the unified record produced by both parse sources.

use serde::{Deserialize, Serialize};

use super::diagnostics::Diagnostic;

/// Sentinel recorded when the user submitted nothing for a question.
pub const NO_RESPONSE: &str = "No Response";

/// A fully reconciled form results page.
///
/// This is the sole artifact exchanged between components: the payload
/// parser creates it, the markup reconciler mutates its records in place,
/// and the CSV serializer consumes it read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormDocument {
    /// Form title from the page markup, decorative asterisks stripped
    #[serde(default = "default_title")]
    pub title: String,

    /// One record per quiz item, in presentation order
    pub questions: Vec<QuestionRecord>,

    /// Structured warnings collected during parsing and reconciliation
    #[serde(default)]
    pub diagnostics: Vec<Diagnostic>,
}

pub(crate) fn default_title() -> String {
    "Google Form Responses".to_string()
}

impl FormDocument {
    /// Create an empty document with the default title.
    pub fn new() -> Self {
        Self {
            title: default_title(),
            questions: Vec::new(),
            diagnostics: Vec::new(),
        }
    }
}

impl Default for FormDocument {
    fn default() -> Self {
        Self::new()
    }
}

/// One quiz item: a question, a section header, or an embedded video.
///
/// Created empty during payload parsing (or as a backfill placeholder),
/// then mutated in place by the reconciler. Fields with no meaning for
/// section/video items are kept `None` rather than omitted, so every
/// record has the same shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRecord {
    /// Display text of the item
    pub question: String,

    /// Section headers and videos carry no scoring semantics
    #[serde(default)]
    pub is_section_or_video: bool,

    /// Maximum points as a numeric string; None for section/video
    #[serde(default)]
    pub points_possible: Option<String>,

    /// Option labels in authored order; empty for free-response questions
    #[serde(default)]
    pub options: Vec<String>,

    /// Correct answer when discoverable; None for section/video
    #[serde(default)]
    pub correct_answer: Option<String>,

    /// What the user submitted; [`NO_RESPONSE`] when nothing was
    #[serde(default)]
    pub user_answer: Option<String>,

    /// Points awarded as a numeric string, "0" once reconciled
    #[serde(default)]
    pub points_received: Option<String>,

    /// Tri-state correctness: true/false/unknown
    #[serde(default)]
    pub is_correct: Option<bool>,

    /// Image URLs in encounter order; duplicates are not removed
    #[serde(default)]
    pub image_urls: Vec<String>,

    /// Grader feedback; populated for any item type
    #[serde(default)]
    pub feedback: Option<String>,
}

impl QuestionRecord {
    /// Create an empty record for a question discovered in the payload.
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            is_section_or_video: false,
            points_possible: None,
            options: Vec::new(),
            correct_answer: None,
            user_answer: None,
            points_received: None,
            is_correct: None,
            image_urls: Vec::new(),
            feedback: None,
        }
    }

    /// Backfill placeholder for a markup container with no payload item.
    ///
    /// `index` is zero-based; the display text uses one-based numbering.
    pub fn placeholder(index: usize) -> Self {
        let mut record = Self::new(format!("Unknown Question {}", index + 1));
        record.points_possible = Some("0".to_string());
        record
    }

    /// Whether the user actually submitted something for this item.
    pub fn has_response(&self) -> bool {
        matches!(&self.user_answer, Some(answer) if answer != NO_RESPONSE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_numbering() {
        let record = QuestionRecord::placeholder(2);
        assert_eq!(record.question, "Unknown Question 3");
        assert_eq!(record.points_possible.as_deref(), Some("0"));
        assert!(!record.is_section_or_video);
    }

    #[test]
    fn test_has_response() {
        let mut record = QuestionRecord::new("Q");
        assert!(!record.has_response());

        record.user_answer = Some(NO_RESPONSE.to_string());
        assert!(!record.has_response());

        record.user_answer = Some("42".to_string());
        assert!(record.has_response());
    }

    #[test]
    fn test_deserialize_defaults_optional_fields() {
        let doc: FormDocument = serde_json::from_str(
            r#"{"questions": [{"question": "Only text"}]}"#,
        )
        .unwrap();

        assert_eq!(doc.title, "Google Form Responses");
        assert_eq!(doc.questions.len(), 1);
        assert_eq!(doc.questions[0].question, "Only text");
        assert!(doc.questions[0].user_answer.is_none());
        assert!(doc.diagnostics.is_empty());
    }

    #[test]
    fn test_deserialize_requires_questions() {
        let result = serde_json::from_str::<FormDocument>(r#"{"title": "T"}"#);
        assert!(result.is_err());
    }
}
