use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use drill_core::completion::EndReason;
use drill_core::model::{ActivityId, OperandSlots, QuestionDraft, RunSettings};
use drill_core::run::PhaseKind;
use drill_core::supplier::QuestionSet;
use drill_core::time::fixed_now;
use services::{Clock, RunError, RunLauncher};
use storage::{InMemorySource, QuestionSource, SourceError, StaticCatalog};
use tokio::sync::mpsc;
use tokio::time::Instant;

fn assigned(sums: &[&[f64]]) -> QuestionSet {
    QuestionSet::new(
        sums.iter()
            .map(|values| QuestionDraft::from_slots(OperandSlots::from_values(values).unwrap()))
            .collect(),
    )
}

fn launcher(source: impl QuestionSource + 'static) -> RunLauncher {
    RunLauncher::new(
        Clock::fixed(fixed_now()),
        Arc::new(StaticCatalog::builtin()),
        Arc::new(source),
    )
    .with_seed(Some(11))
}

struct FailingSource;

#[async_trait]
impl QuestionSource for FailingSource {
    async fn question_set(&self, _activity: ActivityId) -> Result<QuestionSet, SourceError> {
        Err(SourceError::Connection("backend unavailable".into()))
    }
}

#[tokio::test(start_paused = true)]
async fn run_loop_reaches_congratulations() {
    let source = InMemorySource::new();
    source
        .assign(ActivityId::new(1), assigned(&[&[3.0, 5.0], &[2.0, 2.0, 2.0]]))
        .unwrap();
    let driver = launcher(source).launch(ActivityId::new(1)).await.unwrap();
    let mut views = driver.subscribe();
    let (answers, rx) = mpsc::channel(4);
    let started = Instant::now();
    let run = tokio::spawn(driver.run(rx));

    let mut answered_for = 0;
    let mut first_window = None;
    while views.changed().await.is_ok() {
        let view = views.borrow_and_update().clone();
        if view.accepting_input && view.question_number != answered_for {
            answered_for = view.question_number;
            first_window.get_or_insert_with(|| started.elapsed());
            let sum: f64 = view.revealed.iter().sum();
            answers.send(format!("{sum}")).await.unwrap();
        }
    }

    let summary = run.await.unwrap().unwrap();
    assert_eq!(summary.score(), 2);
    assert_eq!(summary.total_possible(), 2);
    assert_eq!(summary.reason(), EndReason::SetExhausted);
    assert!(first_window.unwrap() >= Duration::from_millis(5_250));
}

#[tokio::test(start_paused = true)]
async fn source_failure_falls_back_to_generator() {
    let settings = RunSettings::default().with_speed_override(Some(0.2));
    let driver = launcher(FailingSource)
        .with_settings(settings)
        .launch(ActivityId::new(1))
        .await
        .unwrap();
    assert_eq!(driver.view().total_possible, 10);

    let mut views = driver.subscribe();
    let (answers, rx) = mpsc::channel(4);
    let run = tokio::spawn(driver.run(rx));

    let mut answered_for = 0;
    while views.changed().await.is_ok() {
        let view = views.borrow_and_update().clone();
        if view.accepting_input && view.question_number != answered_for {
            answered_for = view.question_number;
            assert_eq!(view.revealed.len(), 10);
            let sum: f64 = view.revealed.iter().sum();
            answers.send(format!("{sum}")).await.unwrap();
        }
    }

    let summary = run.await.unwrap().unwrap();
    assert_eq!(summary.score(), 10);
    assert_eq!(summary.reason(), EndReason::MaxScoreReached);
}

#[tokio::test]
async fn unknown_activity_is_rejected() {
    let err = launcher(InMemorySource::new())
        .launch(ActivityId::new(404))
        .await
        .err()
        .expect("launch should fail");
    assert!(matches!(err, RunError::UnknownActivity(id) if id == ActivityId::new(404)));
}

#[tokio::test(start_paused = true)]
async fn cancellation_tears_the_run_down() {
    let driver = launcher(InMemorySource::new())
        .launch(ActivityId::new(1))
        .await
        .unwrap();
    let token = driver.cancellation_token();
    let mut views = driver.subscribe();
    let (_answers, rx) = mpsc::channel::<String>(1);
    let run = tokio::spawn(driver.run(rx));

    views.changed().await.unwrap();
    assert_eq!(views.borrow().phase, PhaseKind::Countdown);
    token.cancel();

    let result = run.await.unwrap();
    assert!(matches!(result, Err(RunError::Cancelled)));
}

#[tokio::test(start_paused = true)]
async fn closed_input_ends_the_run_at_the_answer_window() {
    let source = InMemorySource::new();
    source
        .assign(ActivityId::new(1), assigned(&[&[1.0, 1.0]]))
        .unwrap();
    let driver = launcher(source).launch(ActivityId::new(1)).await.unwrap();
    let (answers, rx) = mpsc::channel::<String>(1);
    drop(answers);

    let result = driver.run(rx).await;
    assert!(matches!(result, Err(RunError::InputClosed)));
}
