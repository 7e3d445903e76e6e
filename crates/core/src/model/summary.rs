use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::completion::EndReason;
use crate::model::ActivityId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RunSummaryError {
    #[error("completed_at is before started_at")]
    InvalidTimeRange,

    #[error("score ({score}) exceeds answered count ({answered})")]
    ScoreExceedsAnswered { score: u32, answered: u32 },
}

/// Final tally shown on the congratulations screen.
///
/// Lives only for the duration of the run; nothing is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    activity_id: ActivityId,
    score: u32,
    total_possible: u32,
    answered: u32,
    reason: EndReason,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
}

impl RunSummary {
    /// Build the summary of a finished run.
    ///
    /// # Errors
    ///
    /// Returns `RunSummaryError::InvalidTimeRange` if `completed_at` is before
    /// `started_at`, or `ScoreExceedsAnswered` if the tally is inconsistent.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        activity_id: ActivityId,
        score: u32,
        total_possible: u32,
        answered: u32,
        reason: EndReason,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, RunSummaryError> {
        if completed_at < started_at {
            return Err(RunSummaryError::InvalidTimeRange);
        }
        if score > answered {
            return Err(RunSummaryError::ScoreExceedsAnswered { score, answered });
        }

        Ok(Self {
            activity_id,
            score,
            total_possible,
            answered,
            reason,
            started_at,
            completed_at,
        })
    }

    #[must_use]
    pub fn activity_id(&self) -> ActivityId {
        self.activity_id
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Size of the assigned set, or the activity's max score when the run
    /// used the fallback generator.
    #[must_use]
    pub fn total_possible(&self) -> u32 {
        self.total_possible
    }

    #[must_use]
    pub fn answered(&self) -> u32 {
        self.answered
    }

    #[must_use]
    pub fn reason(&self) -> EndReason {
        self.reason
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }
}
