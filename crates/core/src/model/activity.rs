use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::ActivityId;
use crate::scoring::AnswerRule;
use crate::supplier::QuestionGenerator;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ActivityError {
    #[error("activity title cannot be empty")]
    EmptyTitle,

    #[error("time limit must be > 0 ms")]
    InvalidTimeLimit,

    #[error("max score must be > 0")]
    InvalidMaxScore,
}

//
// ─── PRESENTATION ──────────────────────────────────────────────────────────────
//

/// How a question's operands reach the learner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presentation {
    /// Operands flash one at a time and the learner enters their sum.
    #[default]
    Progressive,
    /// All operands are shown together as a single prompt for the time limit.
    Composed,
}

//
// ─── ACTIVITY CONFIG ───────────────────────────────────────────────────────────
//

/// Static configuration resolved once per run from an activity identifier.
///
/// Read-only to the run controller; built by an activity catalog.
#[derive(Clone)]
pub struct ActivityConfig {
    id: ActivityId,
    title: String,
    time_limit_ms: u64,
    max_score: u32,
    answer_rule: AnswerRule,
    generator: Option<Arc<dyn QuestionGenerator>>,
    presentation: Presentation,
}

impl ActivityConfig {
    /// Creates an activity with numeric-equality grading and no generator.
    ///
    /// # Errors
    ///
    /// Returns `ActivityError` if the title is blank or a limit is zero.
    pub fn new(
        id: ActivityId,
        title: impl Into<String>,
        time_limit_ms: u64,
        max_score: u32,
    ) -> Result<Self, ActivityError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(ActivityError::EmptyTitle);
        }
        if time_limit_ms == 0 {
            return Err(ActivityError::InvalidTimeLimit);
        }
        if max_score == 0 {
            return Err(ActivityError::InvalidMaxScore);
        }

        Ok(Self {
            id,
            title,
            time_limit_ms,
            max_score,
            answer_rule: AnswerRule::default(),
            generator: None,
            presentation: Presentation::default(),
        })
    }

    #[must_use]
    pub fn with_answer_rule(mut self, rule: AnswerRule) -> Self {
        self.answer_rule = rule;
        self
    }

    #[must_use]
    pub fn with_generator(mut self, generator: Arc<dyn QuestionGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    #[must_use]
    pub fn with_presentation(mut self, presentation: Presentation) -> Self {
        self.presentation = presentation;
        self
    }

    #[must_use]
    pub fn id(&self) -> ActivityId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn time_limit_ms(&self) -> u64 {
        self.time_limit_ms
    }

    #[must_use]
    pub fn max_score(&self) -> u32 {
        self.max_score
    }

    #[must_use]
    pub fn answer_rule(&self) -> &AnswerRule {
        &self.answer_rule
    }

    #[must_use]
    pub fn generator(&self) -> Option<Arc<dyn QuestionGenerator>> {
        self.generator.clone()
    }

    #[must_use]
    pub fn presentation(&self) -> Presentation {
        self.presentation
    }
}

impl fmt::Debug for ActivityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActivityConfig")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("time_limit_ms", &self.time_limit_ms)
            .field("max_score", &self.max_score)
            .field("answer_rule", &self.answer_rule)
            .field("has_generator", &self.generator.is_some())
            .field("presentation", &self.presentation)
            .finish()
    }
}
