//! Line-oriented terminal rendering of run views.

use drill_core::model::{RunSummary, format_number};
use drill_core::run::{PhaseKind, RunView};
use tokio::sync::watch;

/// Prints a line whenever the visible state changes, until the driver goes away.
pub async fn follow(mut views: watch::Receiver<RunView>) {
    let mut previous: Option<RunView> = None;
    while views.changed().await.is_ok() {
        let view = views.borrow_and_update().clone();
        if let Some(line) = describe(&view, previous.as_ref()) {
            println!("{line}");
        }
        previous = Some(view);
    }
}

/// What, if anything, to print for `view` given the last one printed from.
pub fn describe(view: &RunView, previous: Option<&RunView>) -> Option<String> {
    if view.torn_down {
        return None;
    }
    let entered = previous.is_none_or(|p| p.phase != view.phase);

    match view.phase {
        PhaseKind::Ready => None,
        PhaseKind::Countdown => {
            let changed = entered || previous.is_some_and(|p| p.countdown != view.countdown);
            let count = view.countdown?;
            if !changed {
                return None;
            }
            if entered {
                Some(format!(
                    "\n{} - question {} ({} of {} so far)\nGet ready... {count}",
                    view.activity_title, view.question_number, view.score, view.total_possible
                ))
            } else {
                Some(format!("Get ready... {count}"))
            }
        }
        PhaseKind::Game => {
            if let Some(prompt) = &view.prompt {
                return entered.then(|| prompt.clone());
            }
            let shown = previous.map_or(0, |p| p.revealed.len() + usize::from(p.current_operand.is_some()));
            let now = view.revealed.len() + usize::from(view.current_operand.is_some());
            if entered || now != shown {
                view.current_operand.map(|n| format!("  {}", format_number(n)))
            } else {
                None
            }
        }
        PhaseKind::Input => {
            let was_ready = !entered && previous.is_some_and(|p| p.accepting_input);
            if view.accepting_input && !was_ready {
                return Some(format!("Question {}: your answer?", view.question_number));
            }
            let before = if entered {
                0
            } else {
                previous.map_or(0, |p| p.revealed.len())
            };
            if !view.accepting_input && view.revealed.len() > before {
                return view.revealed.last().map(|n| format!("  {}", format_number(*n)));
            }
            None
        }
        PhaseKind::GameOver => entered.then(|| {
            format!(
                "Game over! Score: {}/{}",
                view.score, view.total_possible
            )
        }),
        PhaseKind::Congratulations => {
            if !entered {
                return None;
            }
            view.summary.as_ref().map(congratulations)
        }
    }
}

#[must_use]
pub fn congratulations(summary: &RunSummary) -> String {
    let elapsed = summary.completed_at() - summary.started_at();
    format!(
        "Congratulations! You scored {} out of {} ({} answered in {}s).",
        summary.score(),
        summary.total_possible(),
        summary.answered(),
        elapsed.num_seconds()
    )
}
