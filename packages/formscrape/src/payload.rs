//! Structured payload parsing.
//!
//! The score-view page embeds the form's authoring data as a JSON array
//! assigned to a global inside a script block. It is the richest source
//! of question semantics - the rendered markup alone omits machine-
//! readable option and points structure - so a missing or malformed
//! payload is fatal to the whole extraction.
//!
//! The payload schema is positional (fixed array slots per item), which
//! is inherently fragile; all positional reads go through [`ItemFields`]
//! so schema drift surfaces as a skipped item with a diagnostic instead
//! of an out-of-bounds failure.

use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use std::sync::OnceLock;
use tracing::{debug, warn};

use crate::error::{ExtractError, Result};
use crate::types::{Diagnostic, QuestionRecord};

/// Marker identifying the script block that carries the payload.
const PAYLOAD_MARKER: &str = "var FB_PUBLIC_LOAD_DATA_";

/// Item type code used for section breaks and embedded videos.
const SECTION_TYPE_CODE: i64 = 8;

/// Option-group flag marking the correct answer group.
const CORRECT_GROUP_FLAG: i64 = 1;

/// Positional slots holding nested media descriptors.
const MEDIA_SLOTS: std::ops::RangeInclusive<usize> = 5..=7;

/// Minimum positional elements needed to classify an item at all.
const MIN_ITEM_FIELDS: usize = 4;

/// Parse the embedded payload into preliminary question records.
///
/// Records come back in presentation order with markup-only fields
/// (`user_answer`, `points_received`, ...) still unset; the reconciler
/// fills those in afterwards.
pub fn parse_questions(
    dom: &Html,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<Vec<QuestionRecord>> {
    let payload = find_payload(dom)?;
    let mut questions = Vec::new();

    // Item table lives at payload[1][1].
    let Some(items) = payload
        .get(1)
        .and_then(|form| form.get(1))
        .and_then(Value::as_array)
    else {
        warn!("form data payload has no item table");
        diagnostics.push(Diagnostic::document_warning(
            "form data payload has no item table",
        ));
        return Ok(questions);
    };

    for (index, item) in items.iter().enumerate() {
        let Some(fields) = ItemFields::try_new(item) else {
            debug!(item = index, "payload item too short to classify; skipped");
            diagnostics.push(Diagnostic::warning(
                index,
                "payload item too short to classify; skipped",
            ));
            continue;
        };
        questions.push(build_record(&fields));
    }

    debug!(questions = questions.len(), "parsed payload items");
    Ok(questions)
}

/// Capture everything between the payload assignment and the trailing
/// semicolon. Compiled once; the assignment sits on a single line.
fn payload_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(&format!("{} = (.*);", regex::escape(PAYLOAD_MARKER))).unwrap()
    })
}

/// Locate and parse the embedded JSON payload.
fn find_payload(dom: &Html) -> Result<Value> {
    let selector =
        Selector::parse("script").map_err(|e| ExtractError::Selector(e.to_string()))?;
    let pattern = payload_pattern();

    for script in dom.select(&selector) {
        let text: String = script.text().collect();
        if !text.contains(PAYLOAD_MARKER) {
            continue;
        }
        let Some(captures) = pattern.captures(&text) else {
            continue;
        };
        return serde_json::from_str(&captures[1]).map_err(ExtractError::PayloadParse);
    }

    Err(ExtractError::PayloadMissing)
}

/// Typed accessor over one positional payload item.
///
/// Validates length once at construction; every slot read after that is
/// an `Option`, so absent trailing slots degrade to defaults.
struct ItemFields<'a> {
    values: &'a [Value],
}

impl<'a> ItemFields<'a> {
    fn try_new(item: &'a Value) -> Option<Self> {
        let values = item.as_array()?;
        if values.len() < MIN_ITEM_FIELDS {
            return None;
        }
        Some(Self { values })
    }

    fn get(&self, slot: usize) -> Option<&'a Value> {
        self.values.get(slot)
    }

    /// Slot 1: question display text.
    fn question_text(&self) -> &'a str {
        self.get(1)
            .and_then(Value::as_str)
            .unwrap_or("Unknown Question")
    }

    /// Slot 3: type code. Doubles as the authoring-time point value.
    fn type_code(&self) -> Option<i64> {
        self.get(3).and_then(Value::as_i64)
    }

    /// Slot 4: option groups, when present and list-shaped.
    fn option_groups(&self) -> Option<&'a [Value]> {
        self.get(4).and_then(Value::as_array).map(|v| v.as_slice())
    }
}

fn build_record(fields: &ItemFields<'_>) -> QuestionRecord {
    let text = fields.question_text();
    let type_code = fields.type_code();
    let is_section_or_video = classify_section_or_video(text, type_code);

    let mut record = QuestionRecord::new(text);
    record.is_section_or_video = is_section_or_video;

    if let Some(groups) = fields.option_groups() {
        record.options = collect_options(groups);
        if !is_section_or_video {
            record.correct_answer = find_correct_answer(groups);
        }
    }

    record.points_possible = if is_section_or_video {
        None
    } else {
        Some(points_from_type_field(fields.get(3)))
    };

    for slot in MEDIA_SLOTS {
        if let Some(media) = fields.get(slot) {
            if media.is_array() {
                collect_image_urls(media, &mut record.image_urls);
            }
        }
    }

    record
}

/// Payload-side section/video classification.
///
/// The explicit type code wins; "video" items and all-caps untyped text
/// (section headers authored in capitals) are heuristics.
fn classify_section_or_video(text: &str, type_code: Option<i64>) -> bool {
    type_code == Some(SECTION_TYPE_CODE)
        || text.trim().to_lowercase() == "video"
        || (type_code.unwrap_or(0) == 0 && text.to_uppercase() == text)
}

/// Stringify the authoring-time point value; falsy values become "0".
fn points_from_type_field(value: Option<&Value>) -> String {
    match value {
        Some(Value::Number(n)) if n.as_i64() != Some(0) => n.to_string(),
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        _ => "0".to_string(),
    }
}

/// Enumerate option labels across all option groups.
fn collect_options(groups: &[Value]) -> Vec<String> {
    let mut options = Vec::new();
    for group in groups {
        let Some(group) = group.as_array() else {
            continue;
        };
        match group.get(1) {
            Some(Value::Array(entries)) => {
                for entry in entries {
                    if let Some(entry) = entry.as_array() {
                        if let Some(label) = entry.first() {
                            options.push(value_to_label(label));
                        }
                    }
                }
            }
            Some(Value::String(label)) => options.push(label.clone()),
            _ => {}
        }
    }
    options
}

/// First option of the group flagged correct, if any group is flagged.
fn find_correct_answer(groups: &[Value]) -> Option<String> {
    for group in groups {
        let Some(group) = group.as_array() else {
            continue;
        };
        if group.get(3).and_then(Value::as_i64) != Some(CORRECT_GROUP_FLAG) {
            continue;
        }
        // Only the first flagged group counts.
        return match group.get(1) {
            Some(Value::Array(entries)) => entries.first().map(|entry| match entry {
                Value::Array(inner) => inner.first().map(value_to_label).unwrap_or_default(),
                other => value_to_label(other),
            }),
            Some(Value::String(label)) => Some(label.clone()),
            _ => None,
        };
    }
    None
}

fn value_to_label(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Collect image URLs from a nested media descriptor, at any depth,
/// in encounter order and without deduplication.
fn collect_image_urls(value: &Value, urls: &mut Vec<String>) {
    match value {
        Value::String(s) if is_image_url(s) => urls.push(s.clone()),
        Value::Array(items) => {
            for item in items {
                collect_image_urls(item, urls);
            }
        }
        _ => {}
    }
}

fn is_image_url(candidate: &str) -> bool {
    candidate.contains("googleusercontent")
        || candidate.ends_with(".jpg")
        || candidate.ends_with(".png")
        || candidate.ends_with(".jpeg")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_with_payload(payload: &str) -> Html {
        // The assignment sits on one line in real pages; the capture
        // regex does not span newlines.
        let payload = payload.replace('\n', " ");
        Html::parse_document(&format!(
            "<html><head><script>var FB_PUBLIC_LOAD_DATA_ = {payload};</script></head>\
             <body></body></html>"
        ))
    }

    fn parse(payload: &str) -> (Vec<QuestionRecord>, Vec<Diagnostic>) {
        let dom = page_with_payload(payload);
        let mut diagnostics = Vec::new();
        let questions = parse_questions(&dom, &mut diagnostics).unwrap();
        (questions, diagnostics)
    }

    #[test]
    fn test_missing_payload_is_fatal() {
        let dom = Html::parse_document("<html><script>var other = 1;</script></html>");
        let mut diagnostics = Vec::new();
        let result = parse_questions(&dom, &mut diagnostics);
        assert!(matches!(result, Err(ExtractError::PayloadMissing)));
    }

    #[test]
    fn test_malformed_payload_is_fatal() {
        let dom = page_with_payload("[1, 2,");
        let mut diagnostics = Vec::new();
        let result = parse_questions(&dom, &mut diagnostics);
        assert!(matches!(result, Err(ExtractError::PayloadParse(_))));
    }

    #[test]
    fn test_missing_item_table_yields_empty() {
        let (questions, diagnostics) = parse("[null]");
        assert!(questions.is_empty());
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_basic_multiple_choice_question() {
        let (questions, _) = parse(
            r#"[null, [null, [
                [0, "What is 2+2?", null, 1,
                    [[0, [["3"], ["4"]], null, 0]]]
            ]]]"#,
        );

        assert_eq!(questions.len(), 1);
        let q = &questions[0];
        assert_eq!(q.question, "What is 2+2?");
        assert!(!q.is_section_or_video);
        assert_eq!(q.options, vec!["3", "4"]);
        assert_eq!(q.correct_answer, None);
        assert_eq!(q.points_possible.as_deref(), Some("1"));
    }

    #[test]
    fn test_correct_answer_from_flagged_group() {
        let (questions, _) = parse(
            r#"[null, [null, [
                [0, "Capital of France?", null, 2,
                    [[0, [["Paris"], ["Rome"]], null, 1]]]
            ]]]"#,
        );

        assert_eq!(questions[0].correct_answer.as_deref(), Some("Paris"));
        assert_eq!(questions[0].options, vec!["Paris", "Rome"]);
    }

    #[test]
    fn test_string_option_group() {
        let (questions, _) = parse(
            r#"[null, [null, [
                [0, "Short answer", null, 1, [[0, "the answer", null, 1]]]
            ]]]"#,
        );

        assert_eq!(questions[0].options, vec!["the answer"]);
        assert_eq!(questions[0].correct_answer.as_deref(), Some("the answer"));
    }

    #[test]
    fn test_section_by_type_code() {
        let (questions, _) = parse(r#"[null, [null, [[0, "Intro text", null, 8]]]]"#);

        let q = &questions[0];
        assert!(q.is_section_or_video);
        assert_eq!(q.points_possible, None);
        assert_eq!(q.correct_answer, None);
    }

    #[test]
    fn test_section_by_uppercase_heuristic() {
        let (questions, _) = parse(r#"[null, [null, [[0, "PART ONE", null, 0]]]]"#);
        assert!(questions[0].is_section_or_video);
    }

    #[test]
    fn test_video_by_text() {
        let (questions, _) = parse(r#"[null, [null, [[0, "Video", null, 0]]]]"#);
        assert!(questions[0].is_section_or_video);
    }

    #[test]
    fn test_lowercase_typed_question_is_not_section() {
        let (questions, _) = parse(r#"[null, [null, [[0, "Explain gravity", null, 5]]]]"#);
        assert!(!questions[0].is_section_or_video);
        assert_eq!(questions[0].points_possible.as_deref(), Some("5"));
    }

    #[test]
    fn test_short_item_skipped_with_diagnostic() {
        let (questions, diagnostics) = parse(
            r#"[null, [null, [
                [0, "too short"],
                [0, "Real question", null, 1]
            ]]]"#,
        );

        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].question, "Real question");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].question_index, Some(0));
    }

    #[test]
    fn test_absent_options_is_free_response() {
        let (questions, _) = parse(r#"[null, [null, [[0, "Your thoughts?", null, 3]]]]"#);
        assert!(questions[0].options.is_empty());
    }

    #[test]
    fn test_image_urls_collected_in_order_without_dedup() {
        let (questions, _) = parse(
            r#"[null, [null, [
                [0, "Look at this", null, 1, null,
                    [[["https://lh3.googleusercontent.com/img1"]]],
                    [[["https://example.com/photo.png",
                       "https://lh3.googleusercontent.com/img1"]]],
                    [[["not-an-image", "https://example.com/plain.txt"]]]]
            ]]]"#,
        );

        assert_eq!(
            questions[0].image_urls,
            vec![
                "https://lh3.googleusercontent.com/img1",
                "https://example.com/photo.png",
                "https://lh3.googleusercontent.com/img1",
            ]
        );
    }

    #[test]
    fn test_default_question_text() {
        let (questions, _) = parse(r#"[null, [null, [[0, null, null, 1]]]]"#);
        assert_eq!(questions[0].question, "Unknown Question");
    }

    #[test]
    fn test_is_image_url() {
        assert!(is_image_url("https://lh3.googleusercontent.com/d/abc"));
        assert!(is_image_url("https://x.com/a.jpeg"));
        assert!(!is_image_url("https://x.com/a.gif"));
    }
}
