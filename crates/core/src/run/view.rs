use serde::Serialize;

use crate::model::{RunId, RunSummary};
use crate::run::PhaseKind;

/// Read-only snapshot handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunView {
    pub run_id: RunId,
    pub activity_title: String,
    pub phase: PhaseKind,
    /// Seconds left on the countdown; only set in COUNTDOWN.
    pub countdown: Option<u32>,
    /// Operand currently flashed on screen.
    pub current_operand: Option<f64>,
    /// Operands disclosed so far for the active question.
    pub revealed: Vec<f64>,
    /// Composed prompt for non-progressive questions during GAME.
    pub prompt: Option<String>,
    /// Remaining share of the current display window, `0.0..=1.0`.
    pub time_fraction: Option<f64>,
    /// 1-based number of the active question.
    pub question_number: usize,
    pub score: u32,
    pub total_possible: u32,
    pub accepting_input: bool,
    pub last_answer: Option<String>,
    pub summary: Option<RunSummary>,
    pub torn_down: bool,
}
