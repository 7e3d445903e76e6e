use drill_core::model::RunSummary;
use drill_core::run::{Alarm, Command, Event, PhaseKind, RunController, RunView};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::error::RunError;

/// Async runtime around a [`RunController`].
///
/// Timer commands become sleeping tasks that post the alarm back on an
/// unbounded channel; `CancelPending` cancels the child token those tasks
/// watch. Dropping the driver cancels everything it spawned.
pub struct RunDriver {
    controller: RunController,
    alarms_tx: mpsc::UnboundedSender<Alarm>,
    alarms_rx: mpsc::UnboundedReceiver<Alarm>,
    root: CancellationToken,
    pending: CancellationToken,
    views: watch::Sender<RunView>,
}

impl RunDriver {
    #[must_use]
    pub fn new(controller: RunController) -> Self {
        let (alarms_tx, alarms_rx) = mpsc::unbounded_channel();
        let root = CancellationToken::new();
        let pending = root.child_token();
        let (views, _) = watch::channel(controller.view());
        Self {
            controller,
            alarms_tx,
            alarms_rx,
            root,
            pending,
            views,
        }
    }

    #[must_use]
    pub fn controller(&self) -> &RunController {
        &self.controller
    }

    /// Latest published view.
    #[must_use]
    pub fn view(&self) -> RunView {
        self.views.borrow().clone()
    }

    /// View updates, one per handled event.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<RunView> {
        self.views.subscribe()
    }

    /// Token that tears the run down when cancelled.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.root.clone()
    }

    pub fn start(&mut self) {
        self.dispatch(Event::Start);
    }

    pub fn submit(&mut self, answer: impl Into<String>) {
        self.dispatch(Event::Submit(answer.into()));
    }

    pub fn teardown(&mut self) {
        self.dispatch(Event::Teardown);
        self.root.cancel();
    }

    /// Waits for the next alarm and applies it.
    ///
    /// Returns `false` once the driver has been cancelled.
    pub async fn tick(&mut self) -> bool {
        tokio::select! {
            () = self.root.cancelled() => false,
            alarm = self.alarms_rx.recv() => match alarm {
                Some(alarm) => {
                    self.dispatch(Event::Alarm(alarm));
                    true
                }
                None => false,
            },
        }
    }

    /// Drives a whole run, feeding answers from `answers`, until the summary
    /// is shown.
    ///
    /// # Errors
    ///
    /// Returns `RunError::Cancelled` if the cancellation token fires or the
    /// run is torn down, and `RunError::InputClosed` if `answers` closes
    /// while the run waits for an answer.
    pub async fn run(mut self, mut answers: mpsc::Receiver<String>) -> Result<RunSummary, RunError> {
        if matches!(
            self.controller.phase_kind(),
            PhaseKind::Ready | PhaseKind::Congratulations
        ) {
            self.start();
        }

        let mut answers_open = true;
        loop {
            if let Some(summary) = self.controller.summary() {
                return Ok(summary.clone());
            }
            if self.controller.state().is_torn_down() {
                return Err(RunError::Cancelled);
            }
            if !answers_open && self.controller.view().accepting_input {
                self.teardown();
                return Err(RunError::InputClosed);
            }

            tokio::select! {
                () = self.root.cancelled() => {
                    self.dispatch(Event::Teardown);
                    return Err(RunError::Cancelled);
                }
                Some(alarm) = self.alarms_rx.recv() => self.dispatch(Event::Alarm(alarm)),
                answer = answers.recv(), if answers_open => match answer {
                    Some(answer) => self.submit(answer),
                    None => {
                        debug!(run = %self.controller.id(), "answer input closed");
                        answers_open = false;
                    }
                },
            }
        }
    }

    fn dispatch(&mut self, event: Event) {
        for command in self.controller.handle(event) {
            self.execute(command);
        }
        self.views.send_replace(self.controller.view());
    }

    fn execute(&mut self, command: Command) {
        match command {
            Command::CancelPending => {
                self.pending.cancel();
                self.pending = self.root.child_token();
            }
            Command::Schedule { alarm, after } => {
                trace!(run = %self.controller.id(), kind = ?alarm.kind(), ?after, "alarm armed");
                let tx = self.alarms_tx.clone();
                let token = self.pending.clone();
                tokio::spawn(async move {
                    tokio::select! {
                        () = token.cancelled() => {}
                        () = tokio::time::sleep(after) => {
                            // Receiver gone means the driver was dropped.
                            let _ = tx.send(alarm);
                        }
                    }
                });
            }
        }
    }
}

impl Drop for RunDriver {
    fn drop(&mut self) {
        self.root.cancel();
    }
}
