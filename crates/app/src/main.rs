mod args;
mod logging;
mod render;

use std::io::BufRead;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use drill_core::model::{ActivityId, RunSettings, format_number};
use services::{Clock, RunError, RunLauncher};
use storage::{InMemorySource, JsonFileSource, QuestionSource, StaticCatalog};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::args::{Cli, Commands, PlayArgs};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logging(cli.log_format, cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "flash-drill failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Activities => {
            list_activities();
            Ok(())
        }
        Commands::Play(args) => play(args).await,
    }
}

fn list_activities() {
    let catalog = StaticCatalog::builtin();
    for activity in catalog.iter() {
        println!(
            "{:>3}  {:<20} max score {:<3} time limit {}s",
            activity.id(),
            activity.title(),
            activity.max_score(),
            format_number(activity.time_limit_ms() as f64 / 1000.0)
        );
    }
}

async fn play(args: PlayArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut settings = load_settings(args.settings.as_deref()).await?;
    if let Some(speed) = args.speed {
        settings = settings.with_speed_override(Some(speed));
    }
    if args.reveal_during_game {
        settings = settings.with_reveal_during_game(true);
    }
    settings.validate()?;

    let questions: Arc<dyn QuestionSource> = match &args.questions {
        Some(path) => {
            let mut source = JsonFileSource::new(path);
            if let Some(group) = &args.group {
                source = source.with_group(group.clone());
            }
            Arc::new(source)
        }
        None => Arc::new(InMemorySource::new()),
    };

    let launcher = RunLauncher::new(Clock::system(), Arc::new(StaticCatalog::builtin()), questions)
        .with_settings(settings)
        .with_seed(args.seed);
    let driver = launcher.launch(ActivityId::new(args.activity)).await?;

    let token = driver.cancellation_token();
    let (answers_tx, answers_rx) = mpsc::channel(16);
    spawn_answer_reader(answers_tx);
    tokio::spawn(cancel_on_ctrl_c(token.clone()));
    let renderer = tokio::spawn(render::follow(driver.subscribe()));

    let result = driver.run(answers_rx).await;
    if let Err(err) = renderer.await {
        warn!(error = %err, "renderer task failed");
    }

    match result {
        Ok(summary) => {
            info!(
                score = summary.score(),
                answered = summary.answered(),
                reason = ?summary.reason(),
                "run finished"
            );
            Ok(())
        }
        Err(RunError::Cancelled) => {
            println!("\nRun cancelled.");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

async fn load_settings(path: Option<&Path>) -> Result<RunSettings, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(RunSettings::default());
    };
    let bytes = tokio::fs::read(path).await?;
    let settings: RunSettings = serde_json::from_slice(&bytes)?;
    debug!(path = %path.display(), ?settings, "settings loaded");
    Ok(settings)
}

/// Reads answers on a plain thread; a blocked stdin read must not hold the
/// runtime open at exit.
fn spawn_answer_reader(answers: mpsc::Sender<String>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if answers.blocking_send(line).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    warn!(error = %err, "reading stdin failed");
                    break;
                }
            }
        }
    });
}

async fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::select! {
        () = token.cancelled() => {}
        signal = tokio::signal::ctrl_c() => {
            if let Err(err) = signal {
                warn!(error = %err, "ctrl-c handler unavailable");
                return;
            }
            debug!("ctrl-c received");
            token.cancel();
        }
    }
}
