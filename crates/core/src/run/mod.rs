//! The run controller: a single-owner phase state machine driven by events.
//!
//! The controller never sleeps. Timed transitions are requested through
//! [`Command::Schedule`]; whoever drives the controller delivers the alarm
//! back as [`Event::Alarm`] once the delay elapses. Every alarm carries the
//! epoch it was armed in. The epoch moves whenever a new alarm is armed, on
//! every phase change and on teardown, so only the most recently armed alarm
//! is ever honoured and a late one from a superseded phase is dropped.

mod controller;
mod phase;
mod view;

use std::time::Duration;

pub use controller::{RunController, RunState};
pub use phase::PhaseKind;
pub use view::RunView;

/// What a scheduled alarm asks the controller to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlarmKind {
    CountdownTick,
    GameTick,
    NextOperand,
    FlashSettled,
    Reveal,
    ShowSummary,
}

/// A timer request stamped with the epoch it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Alarm {
    epoch: u64,
    kind: AlarmKind,
}

impl Alarm {
    pub(crate) fn new(epoch: u64, kind: AlarmKind) -> Self {
        Self { epoch, kind }
    }

    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    #[must_use]
    pub fn kind(&self) -> AlarmKind {
        self.kind
    }
}

/// Inputs to the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Learner pressed start (from READY or after CONGRATULATIONS).
    Start,
    Alarm(Alarm),
    /// Learner confirmed an answer.
    Submit(String),
    /// The owner is going away; nothing may fire afterwards.
    Teardown,
}

/// Side effects requested by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Schedule { alarm: Alarm, after: Duration },
    /// Drop every alarm armed so far.
    CancelPending,
}
