//! Tabular export - fixed-column CSV for a form document.
//!
//! The schema is deliberately fixed-width: four option columns, padded
//! or silently truncated. Section/video rows keep their cells but leave
//! the scoring columns empty.

use chrono::{DateTime, Utc};

use crate::error::{ExportError, ExportResult};
use crate::types::{FormDocument, QuestionRecord};

/// Column order of the exported file.
pub const CSV_HEADERS: [&str; 10] = [
    "Question",
    "Option 1",
    "Option 2",
    "Option 3",
    "Option 4",
    "Points",
    "Correct Answer",
    "Is Correct",
    "Feedback",
    "Image URLs",
];

/// Options beyond this count are dropped; fewer are padded with blanks.
const FIXED_OPTION_COUNT: usize = 4;

/// Serialize a document to CSV bytes.
///
/// Serialization is pure: the same document always yields the same
/// bytes.
pub fn write_csv(document: &FormDocument) -> ExportResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADERS)?;

    for question in &document.questions {
        writer.write_record(&row_for(question))?;
    }

    writer
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))
}

/// Serialize a document-shaped JSON value to CSV bytes.
///
/// This is the inbound shape the surrounding service accepts; a body
/// missing `questions` (or otherwise malformed) is rejected whole - no
/// partial file is produced.
pub fn csv_from_json(value: serde_json::Value) -> ExportResult<Vec<u8>> {
    let document: FormDocument =
        serde_json::from_value(value).map_err(ExportError::InvalidDocument)?;
    write_csv(&document)
}

/// Attachment filename for a serialized document:
/// `<sanitized-title>_responses_<YYYYMMDD_HHMMSS>.csv`, with every
/// non-alphanumeric title character replaced by an underscore. An
/// untitled document falls back to `Google_Form`.
pub fn attachment_filename(title: &str, at: DateTime<Utc>) -> String {
    let safe: String = title
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    let safe = if safe.is_empty() {
        "Google_Form".to_string()
    } else {
        safe
    };
    format!("{}_responses_{}.csv", safe, at.format("%Y%m%d_%H%M%S"))
}

fn row_for(question: &QuestionRecord) -> Vec<String> {
    let mut row = Vec::with_capacity(CSV_HEADERS.len());
    row.push(question.question.clone());

    for slot in 0..FIXED_OPTION_COUNT {
        row.push(question.options.get(slot).cloned().unwrap_or_default());
    }

    if question.is_section_or_video {
        // Scoring cells are meaningless for sections and videos.
        row.extend(std::iter::repeat(String::new()).take(3));
    } else {
        row.push(
            question
                .points_possible
                .clone()
                .unwrap_or_else(|| "0".to_string()),
        );
        row.push(
            question
                .correct_answer
                .clone()
                .unwrap_or_else(|| "Unknown".to_string()),
        );
        row.push(
            match question.is_correct {
                Some(true) => "Yes",
                Some(false) => "No",
                None => "Unknown",
            }
            .to_string(),
        );
    }

    row.push(question.feedback.clone().unwrap_or_default());
    row.push(question.image_urls.join("; "));
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn as_lines(bytes: &[u8]) -> Vec<String> {
        String::from_utf8(bytes.to_vec())
            .unwrap()
            .lines()
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_header_and_free_response_row() {
        let mut question = QuestionRecord::new("What is the answer to everything?");
        question.points_possible = Some("5".to_string());
        question.points_received = Some("5".to_string());
        question.correct_answer = Some("42".to_string());
        question.user_answer = Some("42".to_string());
        question.is_correct = Some(true);

        let mut document = FormDocument::new();
        document.questions.push(question);

        let lines = as_lines(&write_csv(&document).unwrap());
        assert_eq!(
            lines[0],
            "Question,Option 1,Option 2,Option 3,Option 4,Points,Correct Answer,\
             Is Correct,Feedback,Image URLs"
        );
        assert_eq!(lines[1], "What is the answer to everything?,,,,,5,42,Yes,,");
    }

    #[test]
    fn test_section_row_has_empty_scoring_cells() {
        let mut section = QuestionRecord::new("PART ONE");
        section.is_section_or_video = true;
        section.points_received = Some("0".to_string());
        section.feedback = Some("intro".to_string());

        let mut document = FormDocument::new();
        document.questions.push(section);

        let lines = as_lines(&write_csv(&document).unwrap());
        assert_eq!(lines[1], "PART ONE,,,,,,,,intro,");
    }

    #[test]
    fn test_options_truncated_and_padded() {
        let mut many = QuestionRecord::new("Pick one");
        many.options = (1..=6).map(|n| format!("opt{n}")).collect();
        let mut few = QuestionRecord::new("Pick another");
        few.options = vec!["a".to_string(), "b".to_string()];

        let mut document = FormDocument::new();
        document.questions.push(many);
        document.questions.push(few);

        let lines = as_lines(&write_csv(&document).unwrap());
        assert!(lines[1].starts_with("Pick one,opt1,opt2,opt3,opt4,"));
        assert!(!lines[1].contains("opt5"));
        assert!(lines[2].starts_with("Pick another,a,b,,,"));
    }

    #[test]
    fn test_missing_fields_render_as_defaults() {
        let question = QuestionRecord::new("Blank");
        let mut document = FormDocument::new();
        document.questions.push(question);

        let lines = as_lines(&write_csv(&document).unwrap());
        assert_eq!(lines[1], "Blank,,,,,0,Unknown,Unknown,,");
    }

    #[test]
    fn test_image_urls_joined() {
        let mut question = QuestionRecord::new("Look");
        question.image_urls = vec!["https://a/1.png".to_string(), "https://a/2.png".to_string()];
        let mut document = FormDocument::new();
        document.questions.push(question);

        let lines = as_lines(&write_csv(&document).unwrap());
        assert!(lines[1].ends_with(",https://a/1.png; https://a/2.png"));
    }

    #[test]
    fn test_serialization_is_idempotent() {
        let mut question = QuestionRecord::new("Q");
        question.options = vec!["x".to_string()];
        let mut document = FormDocument::new();
        document.questions.push(question);

        let first = write_csv(&document).unwrap();
        let second = write_csv(&document).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_json_document_round_trip() {
        let bytes = csv_from_json(json!({
            "title": "T",
            "questions": [{"question": "From JSON", "points_possible": "2"}]
        }))
        .unwrap();

        let lines = as_lines(&bytes);
        assert_eq!(lines[1], "From JSON,,,,,2,Unknown,Unknown,,");
    }

    #[test]
    fn test_json_without_questions_is_rejected() {
        let result = csv_from_json(json!({"title": "no questions here"}));
        assert!(matches!(result, Err(ExportError::InvalidDocument(_))));
    }

    #[test]
    fn test_attachment_filename() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 30, 5).unwrap();
        assert_eq!(
            attachment_filename("My Quiz: Part 1", at),
            "My_Quiz__Part_1_responses_20240309_143005.csv"
        );
    }

    #[test]
    fn test_attachment_filename_untitled_fallback() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 30, 5).unwrap();
        assert_eq!(
            attachment_filename("", at),
            "Google_Form_responses_20240309_143005.csv"
        );
    }
}
