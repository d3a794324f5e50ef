//! Rendered markup reconciliation.
//!
//! The payload is authoritative for what each question *is* (text,
//! options, authored correct answer); the rendered markup is
//! authoritative for what actually *happened* (the submitted answer,
//! the awarded points, the localized correctness label). This module
//! walks the per-question containers in document order and merges the
//! markup-side facts into the payload-derived records, growing the
//! record list with placeholders when the markup has more containers
//! than the payload had items.
//!
//! Precedence rules are order-dependent: section/video classification
//! only ever upgrades, and markup points override payload points on
//! mismatch. Each rule lives in its own named function so it can be
//! tested in isolation.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

use crate::error::{ExtractError, Result};
use crate::types::{Diagnostic, ExtractConfig, QuestionRecord, NO_RESPONSE};

/// Class list of the answer-label span used for both the selected
/// choice and the displayed correct answer.
const ANSWER_LABEL_CLASSES: [&str; 4] = ["aDTYNe", "snByac", "kTYmRb", "OIC90c"];

/// Compiled selectors for the score-view layout.
///
/// The class names are Google's generated ones; they are stable across
/// the two observed layouts but are the first thing to check when a
/// page stops parsing.
pub struct Selectors {
    /// Per-question container
    pub container: Selector,
    title: Selector,
    question_text: Selector,
    answer_input: Selector,
    selected_choice: Selector,
    answer_label: Selector,
    points: Selector,
    correctness: Selector,
    correct_answer: Selector,
    feedback_panel: Selector,
    feedback_text: Selector,
}

impl Selectors {
    /// Compile the fixed selector set.
    pub fn new() -> Result<Self> {
        Ok(Self {
            container: parse_selector("div.Qr7Oae")?,
            title: parse_selector("div.cTDvob")?,
            question_text: parse_selector("span.M7eMe")?,
            answer_input: parse_selector(r#"input[jsname="L9xHkb"]"#)?,
            selected_choice: parse_selector(
                r#"div.Od2TWd.hYsg7c.N2RpBe.RDPZE[aria-checked="true"]"#,
            )?,
            answer_label: parse_selector("span.aDTYNe.snByac.kTYmRb.OIC90c")?,
            points: parse_selector("div.RGoode")?,
            correctness: parse_selector("div.zS667")?,
            correct_answer: parse_selector("div.D42QGf")?,
            feedback_panel: parse_selector("div.PcXV5e")?,
            feedback_text: parse_selector("div.sIQxvc")?,
        })
    }
}

fn parse_selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| ExtractError::Selector(format!("{css}: {e}")))
}

/// Decorative asterisk markers around the form title. Compiled once.
fn title_markers() -> &'static Regex {
    static MARKERS: OnceLock<Regex> = OnceLock::new();
    MARKERS.get_or_init(|| Regex::new(r"\s*\*+\s*").unwrap())
}

/// Form title from the page header, decorative asterisks stripped.
pub fn extract_title(dom: &Html, selectors: &Selectors) -> Option<String> {
    let element = dom.select(&selectors.title).next()?;
    let raw = element_text(&element);
    let title = title_markers().replace_all(&raw, "").trim().to_string();
    debug!(title = %title, "extracted form title");
    Some(title)
}

/// Merge markup-side facts into the payload-derived records, in place.
pub fn reconcile(
    dom: &Html,
    selectors: &Selectors,
    config: &ExtractConfig,
    questions: &mut Vec<QuestionRecord>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let containers: Vec<ElementRef<'_>> = dom.select(&selectors.container).collect();
    info!(containers = containers.len(), "found question containers in markup");

    for (index, container) in containers.into_iter().enumerate() {
        while index >= questions.len() {
            questions.push(QuestionRecord::placeholder(questions.len()));
        }
        let record = &mut questions[index];

        reconcile_question_text(&container, selectors, record);

        // Scoring fields carry no meaning for section/video items.
        if !record.is_section_or_video {
            reconcile_user_answer(&container, selectors, record, index);
            let points_text = container
                .select(&selectors.points)
                .next()
                .map(|el| element_text(&el));
            reconcile_points(record, points_text.as_deref(), index, diagnostics);
            reconcile_correctness(&container, selectors, config, record, index);
            reconcile_correct_answer(&container, selectors, record, index);
        }

        reconcile_feedback(&container, selectors, record);
    }
}

/// Replace the record's text with the rendered title, upgrading the
/// section/video classification when the rendered text says so.
fn reconcile_question_text(
    container: &ElementRef<'_>,
    selectors: &Selectors,
    record: &mut QuestionRecord,
) {
    let Some(element) = container.select(&selectors.question_text).next() else {
        return;
    };
    let text = element_text(&element);
    // Upgrade only; a payload classification is never revoked.
    if reclassify_section(&text) {
        record.is_section_or_video = true;
    }
    record.question = text;
}

/// Markup-side section/video heuristic: a short all-caps title, or the
/// literal "video".
pub fn reclassify_section(text: &str) -> bool {
    (text.to_uppercase() == text && text.split_whitespace().count() <= 3)
        || text.to_lowercase() == "video"
}

/// Resolve the submitted answer: direct input value, else the label of
/// the checked choice, else the no-response sentinel. Empty extracted
/// text also normalizes to the sentinel.
fn reconcile_user_answer(
    container: &ElementRef<'_>,
    selectors: &Selectors,
    record: &mut QuestionRecord,
    index: usize,
) {
    let answer = match find_user_answer(container, selectors) {
        Some(answer) if !answer.is_empty() => answer,
        _ => NO_RESPONSE.to_string(),
    };
    debug!(question = index + 1, answer = %answer, "resolved user answer");
    record.user_answer = Some(answer);
}

fn find_user_answer(container: &ElementRef<'_>, selectors: &Selectors) -> Option<String> {
    if let Some(input) = container.select(&selectors.answer_input).next() {
        if let Some(value) = input.value().attr("value") {
            return Some(value.trim().to_string());
        }
    }

    let selected = container.select(&selectors.selected_choice).next()?;
    label_after(container, &selected)
}

/// First answer-label span after `target` in document order within the
/// container. The checked choice element itself carries no text; its
/// label is rendered in a separate span further along.
fn label_after(container: &ElementRef<'_>, target: &ElementRef<'_>) -> Option<String> {
    let mut past_target = false;
    for node in container.descendants() {
        if node.id() == target.id() {
            past_target = true;
            continue;
        }
        if !past_target {
            continue;
        }
        if let Some(element) = ElementRef::wrap(node) {
            if is_answer_label(&element) {
                return Some(element_text(&element));
            }
        }
    }
    None
}

fn is_answer_label(element: &ElementRef<'_>) -> bool {
    if element.value().name() != "span" {
        return false;
    }
    let Some(class_attr) = element.value().attr("class") else {
        return false;
    };
    let classes: Vec<&str> = class_attr.split_whitespace().collect();
    ANSWER_LABEL_CLASSES.iter().all(|c| classes.contains(c))
}

/// Apply the rendered score display to the record.
///
/// An `a / b` display splits into received/possible; a possible value
/// that disagrees with the payload overwrites it, because the markup
/// reflects actual grading while the payload reflects authoring-time
/// defaults. A display without `/` is the received score alone. An
/// absent display defaults the received score to "0".
pub fn reconcile_points(
    record: &mut QuestionRecord,
    points_text: Option<&str>,
    index: usize,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let Some(text) = points_text else {
        record.points_received = Some("0".to_string());
        return;
    };

    if let Some((received, possible)) = text.split_once('/') {
        record.points_received = Some(digits_or_zero(received));
        let possible = possible.trim().to_string();
        if record.points_possible.as_deref() != Some(possible.as_str()) {
            warn!(
                question = index + 1,
                markup = %possible,
                payload = ?record.points_possible,
                "points possible mismatch; using markup value"
            );
            diagnostics.push(Diagnostic::warning(
                index,
                format!(
                    "points possible mismatch: markup \"{possible}\" vs payload {:?}; \
                     using markup value",
                    record.points_possible
                ),
            ));
            record.points_possible = Some(possible);
        }
    } else {
        record.points_received = Some(digits_or_zero(text));
    }

    debug!(
        question = index + 1,
        received = ?record.points_received,
        possible = ?record.points_possible,
        "parsed points"
    );
}

fn digits_or_zero(text: &str) -> String {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        "0".to_string()
    } else {
        digits
    }
}

/// Resolve correctness: an explicit localized label wins; otherwise it
/// is inferred by comparing answers; otherwise unknown.
fn reconcile_correctness(
    container: &ElementRef<'_>,
    selectors: &Selectors,
    config: &ExtractConfig,
    record: &mut QuestionRecord,
    index: usize,
) {
    if let Some(element) = container.select(&selectors.correctness).next() {
        if let Some(label) = element.value().attr("aria-label") {
            record.is_correct = Some(config.is_correct_label(label));
            debug!(
                question = index + 1,
                label = %label.trim(),
                is_correct = ?record.is_correct,
                "correctness from markup label"
            );
            return;
        }
    }
    record.is_correct = infer_correctness(record);
}

/// Infer correctness by trimmed, case-insensitive answer equality,
/// only when a correct answer is known and the user actually responded.
pub fn infer_correctness(record: &QuestionRecord) -> Option<bool> {
    let correct = record
        .correct_answer
        .as_deref()
        .filter(|s| !s.is_empty())?;
    if !record.has_response() {
        return None;
    }
    let user = record.user_answer.as_deref()?;
    Some(answers_match(correct, user))
}

fn answers_match(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Backfill the correct answer from the markup when the payload had
/// none or the answer was graded wrong; when correctness was inferred
/// true with no known correct answer, the user's answer closes the loop.
fn reconcile_correct_answer(
    container: &ElementRef<'_>,
    selectors: &Selectors,
    record: &mut QuestionRecord,
    index: usize,
) {
    let missing = record.correct_answer.as_deref().map_or(true, str::is_empty);
    if missing || record.is_correct == Some(false) {
        if let Some(panel) = container.select(&selectors.correct_answer).next() {
            if let Some(span) = panel.select(&selectors.answer_label).next() {
                let answer = element_text(&span);
                debug!(question = index + 1, answer = %answer, "correct answer from markup");
                record.correct_answer = Some(answer);
            }
        }
    }

    if record.is_correct == Some(true)
        && record.correct_answer.as_deref().map_or(true, str::is_empty)
        && record.has_response()
    {
        record.correct_answer = record.user_answer.clone();
        debug!(
            question = index + 1,
            "correct answer set from user answer"
        );
    }
}

/// Feedback applies to every item type, section/video included.
fn reconcile_feedback(
    container: &ElementRef<'_>,
    selectors: &Selectors,
    record: &mut QuestionRecord,
) {
    if let Some(panel) = container.select(&selectors.feedback_panel).next() {
        if let Some(text_element) = panel.select(&selectors.feedback_text).next() {
            record.feedback = Some(element_text(&text_element));
        }
    }
}

fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
