use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, trace, warn};

use crate::completion::{CompletionPolicy, Decision, EndReason, RunProgress};
use crate::error::Error;
use crate::model::{ActivityConfig, RunId, RunSettings, RunSummary};
use crate::run::phase::{GameStage, GameStep, InputStage, Phase, PhaseKind, millis};
use crate::run::{Alarm, AlarmKind, Command, Event, RunView};
use crate::scheduler::{RevealEvent, RevealSequence, RevealTiming, resolve_delay};
use crate::scoring::{Scoreboard, Verdict, grade, grade_sum};
use crate::supplier::{QuestionSupplier, Supplied};
use crate::time::Clock;

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

/// Mutable run state. Owned exclusively by one [`RunController`].
#[derive(Debug)]
pub struct RunState {
    phase: Phase,
    index: usize,
    scoreboard: Scoreboard,
    last_answer: Option<String>,
    epoch: u64,
    torn_down: bool,
    started_at: Option<DateTime<Utc>>,
}

impl RunState {
    fn new() -> Self {
        Self {
            phase: Phase::Ready,
            index: 0,
            scoreboard: Scoreboard::new(),
            last_answer: None,
            epoch: 0,
            torn_down: false,
            started_at: None,
        }
    }

    #[must_use]
    pub fn phase(&self) -> PhaseKind {
        self.phase.kind()
    }

    /// Zero-based position of the active question.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.scoreboard.score()
    }

    #[must_use]
    pub fn answered(&self) -> u32 {
        self.scoreboard.answered()
    }

    #[must_use]
    pub fn last_answer(&self) -> Option<&str> {
        self.last_answer.as_deref()
    }

    /// Current alarm epoch. Alarms armed under another epoch are ignored.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }
}

//
// ─── CONTROLLER ────────────────────────────────────────────────────────────────
//

/// Drives one activity run through
/// READY → COUNTDOWN → GAME/INPUT → GAME_OVER → CONGRATULATIONS.
#[derive(Debug)]
pub struct RunController {
    id: RunId,
    activity: ActivityConfig,
    settings: RunSettings,
    supplier: QuestionSupplier,
    policy: CompletionPolicy,
    clock: Clock,
    rng: StdRng,
    state: RunState,
}

impl RunController {
    /// # Errors
    ///
    /// Returns `Error::Settings` if the pacing settings are invalid.
    pub fn new(
        activity: ActivityConfig,
        supplier: QuestionSupplier,
        settings: RunSettings,
    ) -> Result<Self, Error> {
        settings.validate()?;
        Ok(Self {
            id: RunId::new(),
            policy: CompletionPolicy::for_variant(settings.reveal_during_game()),
            activity,
            settings,
            supplier,
            clock: Clock::system(),
            rng: StdRng::from_os_rng(),
            state: RunState::new(),
        })
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Makes generated questions reproducible.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    #[must_use]
    pub fn id(&self) -> RunId {
        self.id
    }

    #[must_use]
    pub fn activity(&self) -> &ActivityConfig {
        &self.activity
    }

    #[must_use]
    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    #[must_use]
    pub fn state(&self) -> &RunState {
        &self.state
    }

    #[must_use]
    pub fn phase_kind(&self) -> PhaseKind {
        self.state.phase.kind()
    }

    /// Summary of the last completed run, available in CONGRATULATIONS.
    #[must_use]
    pub fn summary(&self) -> Option<&RunSummary> {
        match &self.state.phase {
            Phase::Congratulations(summary) => Some(summary),
            _ => None,
        }
    }

    /// Score denominator shown to the learner.
    #[must_use]
    pub fn total_possible(&self) -> u32 {
        match self.supplier.set_len() {
            0 => self.activity.max_score(),
            len => u32::try_from(len).unwrap_or(u32::MAX),
        }
    }

    /// Applies one event and returns the timer commands it produced.
    ///
    /// Events that make no sense in the current phase are ignored rather
    /// than treated as errors.
    pub fn handle(&mut self, event: Event) -> Vec<Command> {
        if self.state.torn_down {
            trace!(run = %self.id, ?event, "event after teardown ignored");
            return Vec::new();
        }
        match event {
            Event::Start => self.start(),
            Event::Alarm(alarm) => self.on_alarm(alarm),
            Event::Submit(text) => self.submit(text),
            Event::Teardown => self.teardown(),
        }
    }

    // ─── Transitions ───────────────────────────────────────────────────────────

    fn start(&mut self) -> Vec<Command> {
        if !matches!(self.state.phase, Phase::Ready | Phase::Congratulations(_)) {
            debug!(run = %self.id, phase = %self.phase_kind(), "start ignored while a run is active");
            return Vec::new();
        }
        self.state.index = 0;
        self.state.scoreboard = Scoreboard::new();
        self.state.last_answer = None;
        self.state.started_at = Some(self.clock.now());
        info!(
            run = %self.id,
            activity = %self.activity.id(),
            set_len = self.supplier.set_len(),
            max_score = self.activity.max_score(),
            "run started"
        );

        let mut commands = vec![Command::CancelPending];
        commands.extend(self.enter_countdown());
        commands
    }

    fn teardown(&mut self) -> Vec<Command> {
        self.state.epoch = self.state.epoch.wrapping_add(1);
        self.state.torn_down = true;
        info!(run = %self.id, phase = %self.phase_kind(), "run torn down");
        vec![Command::CancelPending]
    }

    fn on_alarm(&mut self, alarm: Alarm) -> Vec<Command> {
        if alarm.epoch() != self.state.epoch {
            trace!(
                run = %self.id,
                kind = ?alarm.kind(),
                alarm_epoch = alarm.epoch(),
                epoch = self.state.epoch,
                "stale alarm suppressed"
            );
            return Vec::new();
        }
        match alarm.kind() {
            AlarmKind::CountdownTick => self.countdown_tick(),
            AlarmKind::GameTick => self.game_tick(),
            AlarmKind::NextOperand => self.next_operand(),
            AlarmKind::FlashSettled => self.flash_settled(),
            AlarmKind::Reveal => self.reveal_step(),
            AlarmKind::ShowSummary => self.show_summary(),
        }
    }

    fn enter(&mut self, phase: Phase) {
        let from = self.state.phase.kind();
        self.state.epoch = self.state.epoch.wrapping_add(1);
        self.state.phase = phase;
        debug!(
            run = %self.id,
            %from,
            to = %self.state.phase.kind(),
            epoch = self.state.epoch,
            index = self.state.index,
            "phase transition"
        );
    }

    /// Arms the next alarm. Only the most recently armed alarm is live.
    fn arm(&mut self, kind: AlarmKind, after: Duration) -> Command {
        self.state.epoch = self.state.epoch.wrapping_add(1);
        Command::Schedule {
            alarm: Alarm::new(self.state.epoch, kind),
            after,
        }
    }

    fn mismatched(&self, kind: AlarmKind) -> Vec<Command> {
        trace!(run = %self.id, ?kind, phase = %self.phase_kind(), "alarm does not apply to phase");
        Vec::new()
    }

    // ─── Countdown ─────────────────────────────────────────────────────────────

    fn enter_countdown(&mut self) -> Vec<Command> {
        self.enter(Phase::Countdown {
            remaining: self.settings.countdown_from(),
        });
        let tick = self.settings.countdown_tick();
        vec![self.arm(AlarmKind::CountdownTick, tick)]
    }

    fn countdown_tick(&mut self) -> Vec<Command> {
        let Phase::Countdown { remaining } = &mut self.state.phase else {
            return self.mismatched(AlarmKind::CountdownTick);
        };
        *remaining = remaining.saturating_sub(1);
        if *remaining > 0 {
            let tick = self.settings.countdown_tick();
            return vec![self.arm(AlarmKind::CountdownTick, tick)];
        }
        self.begin_question()
    }

    fn begin_question(&mut self) -> Vec<Command> {
        let index = self.state.index;
        let question = match self.supplier.next(index, &mut self.rng) {
            Supplied::Question(question, origin) => {
                debug!(
                    run = %self.id,
                    index,
                    ?origin,
                    operands = question.operands().len(),
                    "question supplied"
                );
                question
            }
            Supplied::EndOfSet => {
                info!(run = %self.id, index, "no question available");
                return self.game_over(EndReason::NoQuestion);
            }
        };

        if !self.supplier.is_progressive() {
            let window = Duration::from_millis(self.activity.time_limit_ms());
            self.enter(Phase::Game(GameStage::new(question, window)));
            let tick = self.settings.game_tick();
            return vec![self.arm(AlarmKind::GameTick, tick)];
        }

        let delay = resolve_delay(
            self.settings
                .speed_override_secs()
                .or(self.supplier.speed_override()),
            question.speed_secs(),
            self.settings.default_display(),
            self.settings.min_reveal_delay(),
        );

        if self.settings.reveal_during_game() {
            self.enter(Phase::Game(GameStage::new(question, delay)));
            let tick = self.settings.game_tick();
            return vec![self.arm(AlarmKind::GameTick, tick)];
        }

        let timing = RevealTiming::from_settings(&self.settings);
        match RevealSequence::new(question.operands().to_vec(), delay, timing) {
            Ok(sequence) => {
                self.enter(Phase::Input(InputStage::revealing(question, sequence)));
                self.schedule_next_reveal()
            }
            Err(err) => {
                warn!(run = %self.id, index, error = %err, "question cannot be revealed");
                self.game_over(EndReason::NoQuestion)
            }
        }
    }

    // ─── Flash display (GAME) ──────────────────────────────────────────────────

    fn game_tick(&mut self) -> Vec<Command> {
        enum Next {
            Tick,
            Gap,
            Settle,
            Answer,
        }

        let tick = self.settings.game_tick();
        let progressive = self.supplier.is_progressive();
        let Phase::Game(stage) = &mut self.state.phase else {
            return self.mismatched(AlarmKind::GameTick);
        };
        if stage.step != GameStep::Showing {
            return Vec::new();
        }

        stage.time_left_ms = stage.time_left_ms.saturating_sub(millis(tick));
        let next = if stage.time_left_ms > 0 {
            Next::Tick
        } else if !progressive {
            Next::Answer
        } else if stage.has_next_operand() {
            stage.step = GameStep::BetweenOperands;
            Next::Gap
        } else {
            stage.step = GameStep::Settling;
            Next::Settle
        };

        match next {
            Next::Tick => vec![self.arm(AlarmKind::GameTick, tick)],
            Next::Gap => {
                let gap = self.settings.operand_gap();
                vec![self.arm(AlarmKind::NextOperand, gap)]
            }
            Next::Settle => {
                let settle = self.settings.flash_settle();
                vec![self.arm(AlarmKind::FlashSettled, settle)]
            }
            Next::Answer => self.open_answer_window(),
        }
    }

    fn next_operand(&mut self) -> Vec<Command> {
        let Phase::Game(stage) = &mut self.state.phase else {
            return self.mismatched(AlarmKind::NextOperand);
        };
        if stage.step != GameStep::BetweenOperands {
            return Vec::new();
        }
        stage.cursor += 1;
        stage.time_left_ms = stage.slot_ms;
        stage.step = GameStep::Showing;
        trace!(run = %self.id, cursor = stage.cursor, "next operand flashed");
        let tick = self.settings.game_tick();
        vec![self.arm(AlarmKind::GameTick, tick)]
    }

    fn flash_settled(&mut self) -> Vec<Command> {
        let settling =
            matches!(&self.state.phase, Phase::Game(stage) if stage.step == GameStep::Settling);
        if !settling {
            return self.mismatched(AlarmKind::FlashSettled);
        }
        self.open_answer_window()
    }

    fn open_answer_window(&mut self) -> Vec<Command> {
        let Phase::Game(stage) = &self.state.phase else {
            return Vec::new();
        };
        let question = stage.question.clone();
        let revealed = if self.supplier.is_progressive() {
            question.operands().to_vec()
        } else {
            Vec::new()
        };
        self.enter(Phase::Input(InputStage::ready(question, revealed)));
        Vec::new()
    }

    // ─── Scheduler-driven reveal (INPUT) ───────────────────────────────────────

    fn schedule_next_reveal(&mut self) -> Vec<Command> {
        let Phase::Input(stage) = &mut self.state.phase else {
            return Vec::new();
        };
        let Some(step) = stage.reveal.as_mut().and_then(Iterator::next) else {
            stage.reveal = None;
            return Vec::new();
        };
        stage.pending = Some(step.event);
        vec![self.arm(AlarmKind::Reveal, step.after)]
    }

    fn reveal_step(&mut self) -> Vec<Command> {
        let Phase::Input(stage) = &mut self.state.phase else {
            return self.mismatched(AlarmKind::Reveal);
        };
        match stage.pending.take() {
            Some(RevealEvent::Operand { position, value, .. }) => {
                stage.revealed.push(value);
                trace!(run = %self.id, position, "operand revealed");
                self.schedule_next_reveal()
            }
            Some(RevealEvent::InputReady) => {
                stage.ready = true;
                stage.reveal = None;
                debug!(run = %self.id, index = self.state.index, "answer window open");
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    // ─── Answers ───────────────────────────────────────────────────────────────

    fn submit(&mut self, text: String) -> Vec<Command> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            trace!(run = %self.id, "empty submission ignored");
            return Vec::new();
        }
        let Phase::Input(stage) = &self.state.phase else {
            debug!(run = %self.id, phase = %self.phase_kind(), "submission outside answer window ignored");
            return Vec::new();
        };
        if !stage.ready {
            debug!(run = %self.id, "submission before reveal finished ignored");
            return Vec::new();
        }

        let expected = stage.question.answer();
        let verdict: Verdict = if self.supplier.is_progressive() {
            grade_sum(trimmed, expected)
        } else {
            grade(trimmed, expected, self.activity.answer_rule())
        };
        self.state.scoreboard.record(verdict);
        self.state.last_answer = Some(text);

        let progress = RunProgress {
            answered: usize::try_from(self.state.scoreboard.answered()).unwrap_or(usize::MAX),
            score: self.state.scoreboard.score(),
            set_len: self.supplier.set_len(),
            max_score: self.activity.max_score(),
        };
        info!(
            run = %self.id,
            index = self.state.index,
            correct = verdict.is_correct(),
            score = progress.score,
            answered = progress.answered,
            "answer graded"
        );

        match self.policy.decide(&progress) {
            Decision::Continue => {
                self.state.index += 1;
                self.enter_countdown()
            }
            Decision::GameOver(reason) => self.game_over(reason),
        }
    }

    // ─── Ending ────────────────────────────────────────────────────────────────

    fn game_over(&mut self, reason: EndReason) -> Vec<Command> {
        info!(
            run = %self.id,
            ?reason,
            score = self.state.scoreboard.score(),
            answered = self.state.scoreboard.answered(),
            "game over"
        );
        self.enter(Phase::GameOver { reason });
        let delay = self.settings.game_over_delay();
        vec![self.arm(AlarmKind::ShowSummary, delay)]
    }

    fn show_summary(&mut self) -> Vec<Command> {
        let reason = match &self.state.phase {
            Phase::GameOver { reason } => *reason,
            _ => return self.mismatched(AlarmKind::ShowSummary),
        };
        let started_at = self.state.started_at.unwrap_or_else(|| self.clock.now());
        let summary = RunSummary::new(
            self.activity.id(),
            self.state.scoreboard.score(),
            self.total_possible(),
            self.state.scoreboard.answered(),
            reason,
            started_at,
            self.clock.completion_stamp(started_at),
        );
        match summary {
            Ok(summary) => self.enter(Phase::Congratulations(summary)),
            Err(err) => {
                warn!(run = %self.id, error = %err, "run summary rejected, returning to ready");
                self.enter(Phase::Ready);
            }
        }
        Vec::new()
    }

    // ─── View ──────────────────────────────────────────────────────────────────

    /// Snapshot of everything the presentation layer needs to draw.
    #[must_use]
    pub fn view(&self) -> RunView {
        let mut view = RunView {
            run_id: self.id,
            activity_title: self.activity.title().to_owned(),
            phase: self.phase_kind(),
            countdown: None,
            current_operand: None,
            revealed: Vec::new(),
            prompt: None,
            time_fraction: None,
            question_number: self.state.index + 1,
            score: self.state.scoreboard.score(),
            total_possible: self.total_possible(),
            accepting_input: false,
            last_answer: self.state.last_answer.clone(),
            summary: None,
            torn_down: self.state.torn_down,
        };

        match &self.state.phase {
            Phase::Ready => view.question_number = 0,
            Phase::Countdown { remaining } => view.countdown = Some(*remaining),
            Phase::Game(stage) => {
                view.time_fraction = Some(stage.time_fraction());
                if self.supplier.is_progressive() {
                    view.current_operand = stage.question.operands().get(stage.cursor).copied();
                    view.revealed = stage.question.operands()[..stage.cursor].to_vec();
                } else {
                    view.prompt = Some(stage.question.prompt());
                }
            }
            Phase::Input(stage) => {
                view.revealed.clone_from(&stage.revealed);
                if !stage.ready {
                    view.current_operand = stage.revealed.last().copied();
                }
                view.accepting_input = stage.ready;
            }
            Phase::GameOver { .. } => {}
            Phase::Congratulations(summary) => view.summary = Some(summary.clone()),
        }
        view
    }
}
