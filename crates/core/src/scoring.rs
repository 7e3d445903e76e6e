use std::fmt;
use std::sync::Arc;

//
// ─── VALIDATION RULES ──────────────────────────────────────────────────────────
//

/// Pluggable answer check supplied by an activity.
pub trait AnswerValidator: Send + Sync {
    /// Returns true when `submitted` is an acceptable answer for `expected`.
    fn is_correct(&self, submitted: &str, expected: f64) -> bool;
}

/// How a free-form answer is compared with the expected value.
#[derive(Clone, Default)]
pub enum AnswerRule {
    /// Both sides parsed as floating point and compared exactly.
    #[default]
    NumericEquality,
    /// Parsed answer within `epsilon` of the expected value.
    Tolerance(f64),
    Custom(Arc<dyn AnswerValidator>),
}

impl fmt::Debug for AnswerRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NumericEquality => f.write_str("NumericEquality"),
            Self::Tolerance(eps) => f.debug_tuple("Tolerance").field(eps).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Grading outcome for one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Correct,
    Incorrect,
}

impl Verdict {
    #[must_use]
    pub fn is_correct(self) -> bool {
        matches!(self, Self::Correct)
    }
}

impl From<bool> for Verdict {
    fn from(correct: bool) -> Self {
        if correct { Self::Correct } else { Self::Incorrect }
    }
}

/// Parses a learner submission; anything that is not a finite number is `None`.
#[must_use]
pub fn parse_answer(submitted: &str) -> Option<f64> {
    submitted
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Grades a free-form answer with the activity's rule. Never fails.
#[must_use]
pub fn grade(submitted: &str, expected: f64, rule: &AnswerRule) -> Verdict {
    match rule {
        AnswerRule::NumericEquality => grade_sum(submitted, expected),
        AnswerRule::Tolerance(eps) => parse_answer(submitted)
            .is_some_and(|v| (v - expected).abs() <= eps.abs())
            .into(),
        AnswerRule::Custom(validator) => validator.is_correct(submitted, expected).into(),
    }
}

/// Grades a flash-sum answer against the precomputed sum.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn grade_sum(submitted: &str, sum: f64) -> Verdict {
    parse_answer(submitted).is_some_and(|v| v == sum).into()
}

//
// ─── SCOREBOARD ────────────────────────────────────────────────────────────────
//

/// Cumulative tally for one run. The score only ever goes up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Scoreboard {
    score: u32,
    answered: u32,
}

impl Scoreboard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one graded submission, adding exactly 1 for a correct one.
    pub fn record(&mut self, verdict: Verdict) {
        self.answered = self.answered.saturating_add(1);
        if verdict.is_correct() {
            self.score = self.score.saturating_add(1);
        }
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn answered(&self) -> u32 {
        self.answered
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    struct EvenOnly;

    impl AnswerValidator for EvenOnly {
        fn is_correct(&self, submitted: &str, _expected: f64) -> bool {
            parse_answer(submitted).is_some_and(|v| v % 2.0 == 0.0)
        }
    }

    #[test]
    fn numeric_equality_trims_and_parses() {
        let rule = AnswerRule::NumericEquality;
        assert_eq!(grade("10", 10.0, &rule), Verdict::Correct);
        assert_eq!(grade("  10 ", 10.0, &rule), Verdict::Correct);
        assert_eq!(grade("10.0", 10.0, &rule), Verdict::Correct);
        assert_eq!(grade("10.0001", 10.0, &rule), Verdict::Incorrect);
    }

    #[test]
    fn unparseable_answers_are_incorrect() {
        let rule = AnswerRule::NumericEquality;
        assert_eq!(grade("abc", 10.0, &rule), Verdict::Incorrect);
        assert_eq!(grade("", 0.0, &rule), Verdict::Incorrect);
        assert_eq!(grade("NaN", f64::NAN, &rule), Verdict::Incorrect);
        assert_eq!(grade_sum("inf", f64::INFINITY), Verdict::Incorrect);
    }

    #[test]
    fn tolerance_accepts_close_answers() {
        let rule = AnswerRule::Tolerance(0.01);
        assert_eq!(grade("10.005", 10.0, &rule), Verdict::Correct);
        assert_eq!(grade("10.1", 10.0, &rule), Verdict::Incorrect);
    }

    #[test]
    fn custom_rule_delegates() {
        let rule = AnswerRule::Custom(Arc::new(EvenOnly));
        assert_eq!(grade("4", 7.0, &rule), Verdict::Correct);
        assert_eq!(grade("3", 3.0, &rule), Verdict::Incorrect);
    }

    #[test]
    fn flash_sum_compares_directly() {
        assert_eq!(grade_sum("45", 45.0), Verdict::Correct);
        assert_eq!(grade_sum("44", 45.0), Verdict::Incorrect);
    }

    #[test]
    fn scoreboard_only_counts_correct() {
        let mut board = Scoreboard::new();
        board.record(Verdict::Correct);
        board.record(Verdict::Incorrect);
        board.record(Verdict::Correct);
        assert_eq!(board.score(), 2);
        assert_eq!(board.answered(), 3);
    }
}
