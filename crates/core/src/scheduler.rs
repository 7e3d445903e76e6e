use std::iter::FusedIterator;
use std::time::Duration;

use thiserror::Error;

use crate::model::RunSettings;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("reveal sequence needs at least one operand")]
    NoOperands,
}

//
// ─── DELAY RESOLUTION ──────────────────────────────────────────────────────────
//

/// Converts a seconds-per-operand speed into a delay, ignoring degenerate values.
fn speed_to_delay(secs: Option<f64>) -> Option<Duration> {
    secs.filter(|s| s.is_finite() && *s > 0.0)
        .map(|s| Duration::from_secs_f64(s.min(3_600.0)))
}

/// Resolves the per-operand delay.
///
/// Order: run/assignment override, then per-question speed, then `default`.
/// The result is never below `min`.
///
/// # Examples
///
/// ```
/// # use std::time::Duration;
/// # use drill_core::scheduler::resolve_delay;
/// let min = Duration::from_millis(150);
/// let default = Duration::from_millis(800);
/// assert_eq!(resolve_delay(None, Some(1.5), default, min), Duration::from_millis(1500));
/// assert_eq!(resolve_delay(Some(0.5), Some(1.5), default, min), Duration::from_millis(500));
/// assert_eq!(resolve_delay(None, Some(0.01), default, min), min);
/// assert_eq!(resolve_delay(None, None, default, min), default);
/// ```
#[must_use]
pub fn resolve_delay(
    override_secs: Option<f64>,
    question_secs: Option<f64>,
    default: Duration,
    min: Duration,
) -> Duration {
    speed_to_delay(override_secs)
        .or_else(|| speed_to_delay(question_secs))
        .unwrap_or(default)
        .max(min)
}

//
// ─── REVEAL EVENTS ─────────────────────────────────────────────────────────────
//

/// One step of progressive operand disclosure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RevealEvent {
    Operand {
        position: usize,
        value: f64,
        /// True for the final operand of the question.
        last: bool,
    },
    /// Terminal event: the answer field may now accept input.
    InputReady,
}

impl RevealEvent {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::InputReady)
    }
}

/// An event together with the delay since the previous one was emitted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RevealStep {
    pub after: Duration,
    pub event: RevealEvent,
}

/// Fixed timings around the per-operand delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealTiming {
    pub lead_in: Duration,
    pub settle: Duration,
    /// Floor for the per-operand delay.
    pub min_delay: Duration,
}

impl RevealTiming {
    #[must_use]
    pub fn from_settings(settings: &RunSettings) -> Self {
        Self {
            lead_in: settings.reveal_lead_in(),
            settle: settings.reveal_settle(),
            min_delay: settings.min_reveal_delay(),
        }
    }
}

impl Default for RevealTiming {
    fn default() -> Self {
        Self {
            lead_in: Duration::from_millis(250),
            settle: Duration::from_millis(400),
            min_delay: Duration::from_millis(150),
        }
    }
}

//
// ─── REVEAL SEQUENCE ───────────────────────────────────────────────────────────
//

/// Lazy, finite, one-shot sequence of reveal steps for one question.
///
/// Yields one `Operand` step per operand (the first after the lead-in, each
/// following one `delay` after its predecessor), then a single `InputReady`
/// step once the last operand has been on screen for `delay` plus the settle
/// time. Not `Clone`: once consumed it cannot be replayed.
#[derive(Debug)]
pub struct RevealSequence {
    operands: std::vec::IntoIter<f64>,
    total: usize,
    emitted: usize,
    delay: Duration,
    timing: RevealTiming,
    done: bool,
}

impl RevealSequence {
    /// `delay` below `timing.min_delay` is raised to it.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::NoOperands` for an empty operand list.
    pub fn new(
        operands: Vec<f64>,
        delay: Duration,
        timing: RevealTiming,
    ) -> Result<Self, SchedulerError> {
        if operands.is_empty() {
            return Err(SchedulerError::NoOperands);
        }
        Ok(Self {
            total: operands.len(),
            operands: operands.into_iter(),
            emitted: 0,
            delay: delay.max(timing.min_delay),
            timing,
            done: false,
        })
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    /// Operands not yet emitted.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.total - self.emitted
    }
}

impl Iterator for RevealSequence {
    type Item = RevealStep;

    fn next(&mut self) -> Option<RevealStep> {
        if self.done {
            return None;
        }

        if let Some(value) = self.operands.next() {
            let position = self.emitted;
            self.emitted += 1;
            let after = if position == 0 {
                self.timing.lead_in
            } else {
                self.delay
            };
            return Some(RevealStep {
                after,
                event: RevealEvent::Operand {
                    position,
                    value,
                    last: self.emitted == self.total,
                },
            });
        }

        self.done = true;
        Some(RevealStep {
            after: self.delay + self.timing.settle,
            event: RevealEvent::InputReady,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = if self.done { 0 } else { self.remaining() + 1 };
        (left, Some(left))
    }
}

impl ExactSizeIterator for RevealSequence {}

impl FusedIterator for RevealSequence {}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
