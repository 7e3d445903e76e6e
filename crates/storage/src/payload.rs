//! Wire shapes for assigned-question payloads.
//!
//! Three top-level layouts are accepted:
//! - `{"assigned_questions": [record, ...]}`
//! - `[{"title": ..., "speed": ..., "questions": [record, ...]}, ...]`
//! - `[record, ...]`

use std::collections::BTreeMap;

use drill_core::model::{OperandKey, OperandSlots, QuestionDraft, QuestionId};
use drill_core::supplier::QuestionSet;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::repository::SourceError;

//
// ─── RECORDS ───────────────────────────────────────────────────────────────────
//

/// One question as delivered by the backend. Operands sit under single
/// letter keys `a`..`t` in either case; anything else is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestionRecord {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub answer: Option<Value>,
    #[serde(default)]
    pub speed: Option<Value>,
    #[serde(default, alias = "label")]
    pub title: Option<String>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl QuestionRecord {
    /// Normalizes the record into an unvalidated draft.
    ///
    /// Empty, null and non-numeric operand values are skipped. When both
    /// cases of a key are present the lowercase one wins.
    #[must_use]
    pub fn into_draft(self) -> QuestionDraft {
        let mut slots = OperandSlots::new();
        for (key, value) in &self.fields {
            let Some(slot) = OperandKey::parse(key) else {
                continue;
            };
            match numeric(value) {
                Some(number) => slots.set(slot, number),
                None => debug!(key = %key, "operand value skipped"),
            }
        }

        QuestionDraft {
            id: self.id.as_ref().and_then(identifier).map(QuestionId::new),
            slots,
            answer: self.answer.as_ref().and_then(numeric),
            speed_secs: self.speed.as_ref().and_then(numeric),
            label: self.title,
        }
    }
}

/// A titled group of assignments with an optional shared speed.
#[derive(Debug, Clone, Deserialize)]
pub struct AssignmentGroup {
    pub title: String,
    #[serde(default)]
    pub speed: Option<Value>,
    pub questions: Vec<QuestionRecord>,
}

impl AssignmentGroup {
    /// Route-style slug of the title, e.g. `"Level 2: Sums"` → `"level-2-sums"`.
    #[must_use]
    pub fn slug(&self) -> String {
        slugify(&self.title)
    }

    fn matches(&self, selector: &str) -> bool {
        let selector = selector.trim();
        self.title.trim().eq_ignore_ascii_case(selector) || self.slug() == slugify(selector)
    }

    #[must_use]
    pub fn into_set(self) -> QuestionSet {
        QuestionSet {
            speed_secs: self.speed.as_ref().and_then(numeric),
            title: Some(self.title),
            drafts: self
                .questions
                .into_iter()
                .map(QuestionRecord::into_draft)
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Payload {
    Assigned {
        assigned_questions: Vec<QuestionRecord>,
    },
    Groups(Vec<AssignmentGroup>),
    Records(Vec<QuestionRecord>),
}

//
// ─── DECODING ──────────────────────────────────────────────────────────────────
//

/// Decodes a JSON payload into a question set.
///
/// `group` selects an assignment group by title or slug; without it the
/// first group is used.
///
/// # Errors
///
/// Returns `SourceError::Decode` for malformed JSON and
/// `SourceError::UnknownGroup` when the selector matches no group.
pub fn decode_question_set(bytes: &[u8], group: Option<&str>) -> Result<QuestionSet, SourceError> {
    let payload: Payload = serde_json::from_slice(bytes)?;
    match payload {
        Payload::Assigned { assigned_questions } => Ok(records_to_set(assigned_questions)),
        Payload::Records(records) => Ok(records_to_set(records)),
        Payload::Groups(groups) => select_group(groups, group),
    }
}

fn records_to_set(records: Vec<QuestionRecord>) -> QuestionSet {
    QuestionSet::new(records.into_iter().map(QuestionRecord::into_draft).collect())
}

fn select_group(groups: Vec<AssignmentGroup>, selector: Option<&str>) -> Result<QuestionSet, SourceError> {
    let Some(selector) = selector else {
        if groups.len() > 1 {
            warn!(groups = groups.len(), "no group selected, using the first one");
        }
        return Ok(groups
            .into_iter()
            .next()
            .map_or_else(QuestionSet::empty, AssignmentGroup::into_set));
    };

    groups
        .into_iter()
        .find(|group| group.matches(selector))
        .map(AssignmentGroup::into_set)
        .ok_or_else(|| SourceError::UnknownGroup(selector.to_owned()))
}

fn numeric(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => {
            let text = text.trim();
            if text.is_empty() {
                return None;
            }
            text.parse::<f64>().ok()?
        }
        _ => return None,
    };
    number.is_finite().then_some(number)
}

fn identifier(value: &Value) -> Option<u64> {
    match value {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn slugify(title: &str) -> String {
    let lowered = title.trim().to_lowercase();
    let mut slug = String::with_capacity(lowered.len());
    for word in lowered.split_whitespace() {
        if !slug.is_empty() {
            slug.push('-');
        }
        slug.extend(
            word.chars()
                .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-'),
        );
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> QuestionRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn uppercase_and_string_operands_normalize() {
        let draft = record(json!({ "A": 3, "b": "5", "C": " 2.5 " })).into_draft();
        assert_eq!(draft.slots.values(), vec![3.0, 5.0, 2.5]);
        assert_eq!(draft.answer, None);
    }

    #[test]
    fn null_empty_and_garbage_operands_are_skipped() {
        let draft = record(json!({
            "a": 1,
            "b": null,
            "c": "",
            "d": "seven",
            "e": 4,
            "question_type": "flash",
        }))
        .into_draft();
        assert_eq!(draft.slots.values(), vec![1.0, 4.0]);
    }

    #[test]
    fn metadata_fields_are_lifted() {
        let draft = record(json!({
            "id": "17",
            "a": 1,
            "b": 2,
            "answer": "4",
            "speed": 1.5,
            "label": "warm up",
        }))
        .into_draft();
        assert_eq!(draft.id, Some(QuestionId::new(17)));
        assert_eq!(draft.answer, Some(4.0));
        assert_eq!(draft.speed_secs, Some(1.5));
        assert_eq!(draft.label.as_deref(), Some("warm up"));
    }

    #[test]
    fn non_numeric_answer_falls_back_to_sum() {
        let question = record(json!({ "a": 2, "b": 3, "answer": "n/a" }))
            .into_draft()
            .validate()
            .unwrap();
        assert!((question.answer() - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn decodes_assigned_questions_wrapper() {
        let bytes = br#"{"assigned_questions":[{"a":1,"b":2},{"a":3}]}"#;
        let set = decode_question_set(bytes, None).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.title, None);
    }

    #[test]
    fn decodes_bare_record_list() {
        let set = decode_question_set(br#"[{"a":1,"b":2}]"#, None).unwrap();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn selects_group_by_title_or_slug() {
        let bytes = br#"[
            {"title": "Warm Up", "questions": [{"a": 1}]},
            {"title": "Level 2: Sums", "speed": "0.6", "questions": [{"a": 1}, {"a": 2}]}
        ]"#;

        let by_slug = decode_question_set(bytes, Some("level-2-sums")).unwrap();
        assert_eq!(by_slug.len(), 2);
        assert_eq!(by_slug.speed_secs, Some(0.6));
        assert_eq!(by_slug.title.as_deref(), Some("Level 2: Sums"));

        let by_title = decode_question_set(bytes, Some("warm up")).unwrap();
        assert_eq!(by_title.len(), 1);

        let first = decode_question_set(bytes, None).unwrap();
        assert_eq!(first.title.as_deref(), Some("Warm Up"));
    }

    #[test]
    fn unknown_group_is_an_error() {
        let bytes = br#"[{"title": "Warm Up", "questions": []}]"#;
        let err = decode_question_set(bytes, Some("finals")).unwrap_err();
        assert!(matches!(err, SourceError::UnknownGroup(name) if name == "finals"));
    }

    #[test]
    fn malformed_json_is_a_decode_error() {
        let err = decode_question_set(b"{not json", None).unwrap_err();
        assert!(matches!(err, SourceError::Decode(_)));
    }

    #[test]
    fn slug_drops_punctuation() {
        let group = AssignmentGroup {
            title: "  Level 2: Sums & More ".into(),
            speed: None,
            questions: Vec::new(),
        };
        assert_eq!(group.slug(), "level-2-sums--more");
    }
}
