use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;

/// Number of canonical operand slots (`a` through `t`).
pub const MAX_OPERANDS: usize = 20;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question has no usable operands")]
    NoOperands,

    #[error("question has {count} operands, at most {MAX_OPERANDS} are allowed")]
    TooManyOperands { count: usize },

    #[error("operand at position {position} is not finite")]
    NonFiniteOperand { position: usize },

    #[error("expected answer is not finite")]
    NonFiniteAnswer,

    #[error("reveal speed must be a positive number of seconds, got {provided}")]
    InvalidSpeed { provided: f64 },
}

//
// ─── OPERAND SLOTS ─────────────────────────────────────────────────────────────
//

/// One of the twenty canonical operand keys, `a` through `t`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperandKey(u8);

impl OperandKey {
    /// Returns the key at `index` in canonical order, if any.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        u8::try_from(index)
            .ok()
            .filter(|i| usize::from(*i) < MAX_OPERANDS)
            .map(Self)
    }

    /// Parses a key case-insensitively; `"B"` and `"b"` are the same slot.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let mut chars = raw.chars();
        let c = chars.next()?;
        if chars.next().is_some() || !c.is_ascii_alphabetic() {
            return None;
        }
        let offset = c.to_ascii_lowercase() as u32 - 'a' as u32;
        Self::from_index(offset as usize)
    }

    /// Iterates every key in canonical order.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..MAX_OPERANDS).filter_map(Self::from_index)
    }

    #[must_use]
    pub fn index(self) -> usize {
        usize::from(self.0)
    }

    #[must_use]
    pub fn letter(self) -> char {
        char::from(b'a' + self.0)
    }
}

impl fmt::Display for OperandKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Ordered optional operand slots keyed by [`OperandKey`].
///
/// Empty slots are simply skipped when the operands are collected, so a
/// question may use any subset of the twenty keys.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OperandSlots([Option<f64>; MAX_OPERANDS]);

impl OperandSlots {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fills slots `a`, `b`, `c`, ... from `values` in order.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::TooManyOperands` if more than twenty values are given.
    pub fn from_values(values: &[f64]) -> Result<Self, QuestionError> {
        if values.len() > MAX_OPERANDS {
            return Err(QuestionError::TooManyOperands {
                count: values.len(),
            });
        }
        let mut slots = Self::new();
        for (index, value) in values.iter().enumerate() {
            slots.0[index] = Some(*value);
        }
        Ok(slots)
    }

    pub fn set(&mut self, key: OperandKey, value: f64) {
        self.0[key.index()] = Some(value);
    }

    #[must_use]
    pub fn get(&self, key: OperandKey) -> Option<f64> {
        self.0[key.index()]
    }

    /// Present values in canonical key order.
    #[must_use]
    pub fn values(&self) -> Vec<f64> {
        self.0.iter().flatten().copied().collect()
    }

    #[must_use]
    pub fn filled(&self) -> usize {
        self.0.iter().flatten().count()
    }
}

//
// ─── QUESTION DRAFT ────────────────────────────────────────────────────────────
//

/// Unvalidated question as decoded from an external payload.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QuestionDraft {
    pub id: Option<QuestionId>,
    pub slots: OperandSlots,
    pub answer: Option<f64>,
    pub speed_secs: Option<f64>,
    pub label: Option<String>,
}

impl QuestionDraft {
    #[must_use]
    pub fn from_slots(slots: OperandSlots) -> Self {
        Self {
            slots,
            ..Self::default()
        }
    }

    /// Validate the draft into an immutable `Question`.
    ///
    /// A missing answer is derived as the floating-point sum of the operands.
    /// A non-positive or non-finite speed is dropped rather than rejected so the
    /// configured default applies.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::NoOperands` when every slot is empty, or a
    /// non-finite error when an operand or the answer is NaN/infinite.
    pub fn validate(self) -> Result<Question, QuestionError> {
        let operands = self.slots.values();
        let speed_secs = self.speed_secs.filter(|s| s.is_finite() && *s > 0.0);
        let mut question = Question::new(operands, self.answer)?;
        question.id = self.id;
        question.speed_secs = speed_secs;
        question.label = self.label.filter(|l| !l.trim().is_empty());
        Ok(question)
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// One validated quiz item. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    id: Option<QuestionId>,
    operands: Vec<f64>,
    answer: f64,
    speed_secs: Option<f64>,
    label: Option<String>,
}

impl Question {
    /// Builds a question from operands, deriving the answer when absent.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if there are no operands, more than twenty, or
    /// any value is not finite.
    pub fn new(operands: Vec<f64>, answer: Option<f64>) -> Result<Self, QuestionError> {
        if operands.is_empty() {
            return Err(QuestionError::NoOperands);
        }
        if operands.len() > MAX_OPERANDS {
            return Err(QuestionError::TooManyOperands {
                count: operands.len(),
            });
        }
        if let Some(position) = operands.iter().position(|v| !v.is_finite()) {
            return Err(QuestionError::NonFiniteOperand { position });
        }
        let answer = answer.unwrap_or_else(|| operands.iter().sum());
        if !answer.is_finite() {
            return Err(QuestionError::NonFiniteAnswer);
        }

        Ok(Self {
            id: None,
            operands,
            answer,
            speed_secs: None,
            label: None,
        })
    }

    /// Sets a per-question reveal speed in seconds per operand.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::InvalidSpeed` if `secs` is not a positive finite number.
    pub fn with_speed(mut self, secs: f64) -> Result<Self, QuestionError> {
        if !secs.is_finite() || secs <= 0.0 {
            return Err(QuestionError::InvalidSpeed { provided: secs });
        }
        self.speed_secs = Some(secs);
        Ok(self)
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn id(&self) -> Option<QuestionId> {
        self.id
    }

    #[must_use]
    pub fn operands(&self) -> &[f64] {
        &self.operands
    }

    #[must_use]
    pub fn answer(&self) -> f64 {
        self.answer
    }

    #[must_use]
    pub fn speed_secs(&self) -> Option<f64> {
        self.speed_secs
    }

    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Single composed prompt, e.g. `Calculate: 3 + 5 + 2`.
    #[must_use]
    pub fn prompt(&self) -> String {
        let terms: Vec<String> = self.operands.iter().map(|v| format_number(*v)).collect();
        format!("Calculate: {}", terms.join(" + "))
    }
}

/// Formats a number without a trailing `.0` for whole values.
#[must_use]
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
