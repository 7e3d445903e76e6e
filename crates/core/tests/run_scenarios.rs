use std::sync::Arc;
use std::time::Duration;

use drill_core::completion::EndReason;
use drill_core::model::{ActivityConfig, ActivityId, OperandSlots, QuestionDraft, RunSettings};
use drill_core::run::{Alarm, Command, Event, PhaseKind, RunController};
use drill_core::supplier::{QuestionSet, QuestionSupplier, SumGenerator};
use drill_core::time::fixed_clock;

/// Delivers alarms in virtual time, in due order, the way the async driver
/// would with a paused clock.
struct Harness {
    controller: RunController,
    pending: Vec<(Duration, u64, Alarm)>,
    now: Duration,
    seq: u64,
}

impl Harness {
    fn new(controller: RunController) -> Self {
        Self {
            controller,
            pending: Vec::new(),
            now: Duration::ZERO,
            seq: 0,
        }
    }

    fn send(&mut self, event: Event) {
        let commands = self.controller.handle(event);
        self.apply(commands);
    }

    fn apply(&mut self, commands: Vec<Command>) {
        for command in commands {
            match command {
                Command::CancelPending => self.pending.clear(),
                Command::Schedule { alarm, after } => {
                    self.seq += 1;
                    self.pending.push((self.now + after, self.seq, alarm));
                }
            }
        }
    }

    /// Fires the next due alarm. Returns false once nothing is pending.
    fn step(&mut self) -> bool {
        let Some(next) = self
            .pending
            .iter()
            .enumerate()
            .min_by_key(|(_, (due, seq, _))| (*due, *seq))
            .map(|(position, _)| position)
        else {
            return false;
        };
        let (due, _, alarm) = self.pending.swap_remove(next);
        self.now = due;
        self.send(Event::Alarm(alarm));
        true
    }

    fn run_until(&mut self, done: impl Fn(&RunController) -> bool) {
        for _ in 0..10_000 {
            if done(&self.controller) {
                return;
            }
            if !self.step() {
                break;
            }
        }
        assert!(done(&self.controller), "condition never reached at {:?}", self.now);
    }

    fn await_answer_window(&mut self) {
        self.run_until(|c| c.view().accepting_input || c.phase_kind() == PhaseKind::GameOver);
    }

    fn answer_correctly(&mut self) {
        self.await_answer_window();
        let sum: f64 = self.controller.view().revealed.iter().sum();
        self.send(Event::Submit(format!("{sum}")));
    }

    fn answer_wrongly(&mut self) {
        self.await_answer_window();
        self.send(Event::Submit("-1".to_owned()));
    }

    fn finish(&mut self) {
        self.run_until(|c| c.phase_kind() == PhaseKind::Congratulations);
    }
}

fn activity(max_score: u32) -> ActivityConfig {
    ActivityConfig::new(ActivityId::new(1), "Flash Number", 5_000, max_score)
        .expect("valid activity")
}

fn assigned(count: usize) -> QuestionSet {
    let drafts = (0..count)
        .map(|n| {
            #[allow(clippy::cast_precision_loss)]
            let base = n as f64;
            QuestionDraft {
                slots: OperandSlots::from_values(&[base + 1.0, 2.0, 3.0]).expect("slots"),
                ..QuestionDraft::default()
            }
        })
        .collect();
    QuestionSet::new(drafts)
}

fn harness(max_score: u32, set: QuestionSet, settings: RunSettings) -> Harness {
    let activity = activity(max_score);
    let supplier = QuestionSupplier::for_activity(&activity, set);
    let controller = RunController::new(activity, supplier, settings)
        .expect("valid settings")
        .with_clock(fixed_clock())
        .with_seed(42);
    Harness::new(controller)
}

#[test]
fn max_score_ends_run_before_set_is_exhausted() {
    let mut h = harness(3, assigned(5), RunSettings::default());
    h.send(Event::Start);
    for _ in 0..3 {
        h.answer_correctly();
    }
    assert_eq!(h.controller.phase_kind(), PhaseKind::GameOver);
    h.finish();

    let summary = h.controller.summary().expect("summary");
    assert_eq!(summary.score(), 3);
    assert_eq!(summary.answered(), 3);
    assert_eq!(summary.total_possible(), 5);
    assert_eq!(summary.reason(), EndReason::MaxScoreReached);
}

#[test]
fn exhausted_set_ends_run_with_partial_score() {
    let mut h = harness(10, assigned(2), RunSettings::default());
    h.send(Event::Start);
    h.answer_correctly();
    h.answer_wrongly();
    h.finish();

    let summary = h.controller.summary().expect("summary");
    assert_eq!(summary.score(), 1);
    assert_eq!(summary.answered(), 2);
    assert_eq!(summary.reason(), EndReason::SetExhausted);
}

#[test]
fn precedence_differs_between_variants() {
    for (reveal_during_game, expected) in [
        (true, EndReason::SetExhausted),
        (false, EndReason::MaxScoreReached),
    ] {
        let settings = RunSettings::default().with_reveal_during_game(reveal_during_game);
        let mut h = harness(2, assigned(2), settings);
        h.send(Event::Start);
        h.answer_correctly();
        h.answer_correctly();
        h.finish();

        let summary = h.controller.summary().expect("summary");
        assert_eq!(summary.reason(), expected, "reveal_during_game={reveal_during_game}");
    }
}

#[test]
fn answer_window_opens_after_countdown_and_reveal() {
    let set = QuestionSet::new(vec![QuestionDraft {
        slots: OperandSlots::from_values(&[4.0, 7.0]).expect("slots"),
        ..QuestionDraft::default()
    }]);
    let mut h = harness(5, set, RunSettings::default());
    h.send(Event::Start);
    h.await_answer_window();

    // 3 s countdown, 250 ms lead-in, 800 ms per operand, 400 ms settle.
    assert_eq!(h.now, Duration::from_millis(3_000 + 250 + 800 + 800 + 400));
    assert_eq!(h.controller.view().revealed, vec![4.0, 7.0]);
}

#[test]
fn legacy_flash_honours_speed_override() {
    let settings = RunSettings::default()
        .with_reveal_during_game(true)
        .with_speed_override(Some(0.5));
    let set = QuestionSet::new(vec![QuestionDraft {
        slots: OperandSlots::from_values(&[1.0, 2.0, 3.0]).expect("slots"),
        ..QuestionDraft::default()
    }]);
    let mut h = harness(5, set, settings);
    h.send(Event::Start);
    h.await_answer_window();

    // Three 500 ms windows, two 100 ms gaps, 500 ms settle.
    assert_eq!(h.now, Duration::from_millis(3_000 + 1_500 + 200 + 500));
}

#[test]
fn teardown_mid_countdown_leaves_no_effect() {
    let mut h = harness(3, assigned(3), RunSettings::default());
    h.send(Event::Start);
    assert!(h.step());
    let leftover: Vec<Alarm> = h.pending.iter().map(|(_, _, alarm)| *alarm).collect();

    h.send(Event::Teardown);
    assert!(h.pending.is_empty());
    for alarm in leftover {
        assert!(h.controller.handle(Event::Alarm(alarm)).is_empty());
    }
    assert_eq!(h.controller.phase_kind(), PhaseKind::Countdown);
    assert_eq!(h.controller.view().countdown, Some(2));
    assert_eq!(h.controller.state().answered(), 0);
}

#[test]
fn restart_after_congratulations_begins_fresh_run() {
    let mut h = harness(1, assigned(3), RunSettings::default());
    h.send(Event::Start);
    h.answer_correctly();
    h.finish();
    assert_eq!(h.controller.state().score(), 1);

    h.send(Event::Start);
    assert_eq!(h.controller.phase_kind(), PhaseKind::Countdown);
    assert_eq!(h.controller.state().score(), 0);
    assert_eq!(h.controller.state().index(), 0);
    assert_eq!(h.pending.len(), 1);
}

#[test]
fn empty_set_falls_back_to_generator() {
    let activity = activity(2).with_generator(Arc::new(SumGenerator::new(4)));
    let supplier = QuestionSupplier::for_activity(&activity, QuestionSet::empty());
    let controller = RunController::new(activity, supplier, RunSettings::default())
        .expect("valid settings")
        .with_clock(fixed_clock())
        .with_seed(9);
    let mut h = Harness::new(controller);

    h.send(Event::Start);
    h.answer_wrongly();
    assert_eq!(h.controller.view().total_possible, 2);
    h.await_answer_window();
    assert_eq!(h.controller.view().revealed.len(), 4);
    assert_eq!(h.controller.view().question_number, 2);
    h.answer_correctly();
    h.answer_correctly();
    h.finish();

    let summary = h.controller.summary().expect("summary");
    assert_eq!(summary.score(), 2);
    assert_eq!(summary.answered(), 3);
    assert_eq!(summary.reason(), EndReason::MaxScoreReached);
}

#[test]
fn empty_set_without_generator_is_game_over() {
    let mut h = harness(3, QuestionSet::empty(), RunSettings::default());
    h.send(Event::Start);
    h.finish();

    let summary = h.controller.summary().expect("summary");
    assert_eq!(summary.answered(), 0);
    assert_eq!(summary.reason(), EndReason::NoQuestion);
    assert_eq!(h.now, Duration::from_millis(3_000 + 2_000));
}

#[test]
fn malformed_assigned_record_ends_run() {
    let set = QuestionSet::new(vec![
        QuestionDraft {
            slots: OperandSlots::from_values(&[1.0, 1.0]).expect("slots"),
            ..QuestionDraft::default()
        },
        QuestionDraft::default(),
    ]);
    let mut h = harness(5, set, RunSettings::default());
    h.send(Event::Start);
    h.answer_correctly();
    h.finish();

    let summary = h.controller.summary().expect("summary");
    assert_eq!(summary.score(), 1);
    assert_eq!(summary.reason(), EndReason::NoQuestion);
}
