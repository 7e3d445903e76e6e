//! End-of-run decision taken after every graded submission.

use serde::{Deserialize, Serialize};

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// Every question of the assigned set has been answered.
    SetExhausted,
    /// The cumulative score reached the activity's maximum.
    MaxScoreReached,
    /// Neither the assigned set nor a generator could supply a question.
    NoQuestion,
}

/// Outcome of [`CompletionPolicy::decide`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Continue,
    GameOver(EndReason),
}

/// Snapshot of the counters the policy looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunProgress {
    pub answered: usize,
    pub score: u32,
    /// Length of the assigned set; zero when the run is generator driven.
    pub set_len: usize,
    pub max_score: u32,
}

/// Which terminal condition is reported when both hold at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precedence {
    SetExhaustedFirst,
    MaxScoreFirst,
}

/// Ends a run when the assigned set is exhausted OR the score reaches the max.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionPolicy {
    precedence: Precedence,
}

impl CompletionPolicy {
    #[must_use]
    pub fn new(precedence: Precedence) -> Self {
        Self { precedence }
    }

    /// The legacy reveal-during-game runner checked set exhaustion first; the
    /// scheduler-driven runner checks the max score first.
    #[must_use]
    pub fn for_variant(reveal_during_game: bool) -> Self {
        if reveal_during_game {
            Self::new(Precedence::SetExhaustedFirst)
        } else {
            Self::new(Precedence::MaxScoreFirst)
        }
    }

    #[must_use]
    pub fn precedence(&self) -> Precedence {
        self.precedence
    }

    #[must_use]
    pub fn decide(&self, progress: &RunProgress) -> Decision {
        let exhausted = progress.set_len > 0 && progress.answered >= progress.set_len;
        let maxed = progress.score >= progress.max_score;

        let reason = match (self.precedence, exhausted, maxed) {
            (_, false, false) => return Decision::Continue,
            (Precedence::SetExhaustedFirst, true, _) | (Precedence::MaxScoreFirst, true, false) => {
                EndReason::SetExhausted
            }
            _ => EndReason::MaxScoreReached,
        };
        Decision::GameOver(reason)
    }
}

impl Default for CompletionPolicy {
    fn default() -> Self {
        Self::for_variant(false)
    }
}
