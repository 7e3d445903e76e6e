use chrono::{DateTime, Utc};

/// Wall-clock source for run start and completion timestamps.
///
/// Pacing never reads this clock; it only stamps the run summary, so a fixed
/// clock keeps summaries deterministic in tests.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    System,
    Fixed(DateTime<Utc>),
}

impl Clock {
    #[must_use]
    pub fn system() -> Self {
        Self::System
    }

    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::System => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }

    /// Completion stamp for a run that started at `started_at`.
    ///
    /// A wall clock stepped backwards mid-run yields `started_at` itself, so
    /// a summary never reports a negative duration.
    #[must_use]
    pub fn completion_stamp(&self, started_at: DateTime<Utc>) -> DateTime<Utc> {
        self.now().max(started_at)
    }
}

/// Deterministic timestamp for tests (2023-11-14T22:13:20Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0).unwrap_or_default()
}

#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}
