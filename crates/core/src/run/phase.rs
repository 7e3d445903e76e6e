use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::completion::EndReason;
use crate::model::{Question, RunSummary};
use crate::scheduler::{RevealEvent, RevealSequence};

//
// ─── PHASE LABELS ──────────────────────────────────────────────────────────────
//

/// Payload-free phase label, for presentation and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PhaseKind {
    Ready,
    Countdown,
    Game,
    Input,
    GameOver,
    Congratulations,
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Ready => "READY",
            Self::Countdown => "COUNTDOWN",
            Self::Game => "GAME",
            Self::Input => "INPUT",
            Self::GameOver => "GAME_OVER",
            Self::Congratulations => "CONGRATULATIONS",
        };
        f.write_str(label)
    }
}

//
// ─── PHASE PAYLOADS ────────────────────────────────────────────────────────────
//

/// Exactly one phase is active; each carries only the data meaningful to it.
#[derive(Debug)]
pub(crate) enum Phase {
    Ready,
    Countdown { remaining: u32 },
    Game(GameStage),
    Input(InputStage),
    GameOver { reason: EndReason },
    Congratulations(RunSummary),
}

impl Phase {
    pub(crate) fn kind(&self) -> PhaseKind {
        match self {
            Self::Ready => PhaseKind::Ready,
            Self::Countdown { .. } => PhaseKind::Countdown,
            Self::Game(_) => PhaseKind::Game,
            Self::Input(_) => PhaseKind::Input,
            Self::GameOver { .. } => PhaseKind::GameOver,
            Self::Congratulations(_) => PhaseKind::Congratulations,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GameStep {
    /// Display window running; ticks decrement `time_left_ms`.
    Showing,
    /// Short gap before the next operand is flashed.
    BetweenOperands,
    /// Last operand done, waiting before the answer window opens.
    Settling,
}

/// Time-boxed display: either one flashed operand or the composed prompt.
#[derive(Debug)]
pub(crate) struct GameStage {
    pub(crate) question: Question,
    pub(crate) cursor: usize,
    pub(crate) time_left_ms: u64,
    pub(crate) slot_ms: u64,
    pub(crate) step: GameStep,
}

impl GameStage {
    pub(crate) fn new(question: Question, slot: Duration) -> Self {
        let slot_ms = millis(slot);
        Self {
            question,
            cursor: 0,
            time_left_ms: slot_ms,
            slot_ms,
            step: GameStep::Showing,
        }
    }

    pub(crate) fn has_next_operand(&self) -> bool {
        self.cursor + 1 < self.question.operands().len()
    }

    pub(crate) fn time_fraction(&self) -> f64 {
        if self.slot_ms == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let fraction = self.time_left_ms as f64 / self.slot_ms as f64;
        fraction.clamp(0.0, 1.0)
    }
}

/// Answer window. In the scheduler-driven variant the operands are still
/// being revealed and `ready` flips once the sequence signals input-ready.
#[derive(Debug)]
pub(crate) struct InputStage {
    pub(crate) question: Question,
    pub(crate) revealed: Vec<f64>,
    pub(crate) reveal: Option<RevealSequence>,
    pub(crate) pending: Option<RevealEvent>,
    pub(crate) ready: bool,
}

impl InputStage {
    pub(crate) fn revealing(question: Question, sequence: RevealSequence) -> Self {
        Self {
            question,
            revealed: Vec::with_capacity(sequence.total()),
            reveal: Some(sequence),
            pending: None,
            ready: false,
        }
    }

    pub(crate) fn ready(question: Question, revealed: Vec<f64>) -> Self {
        Self {
            question,
            revealed,
            reveal: None,
            pending: None,
            ready: true,
        }
    }
}

pub(crate) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
