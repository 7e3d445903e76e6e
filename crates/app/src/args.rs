use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::logging::LogFormat;

/// Timed mental-arithmetic drills in the terminal.
#[derive(Parser, Debug)]
#[command(name = "flash-drill", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log output format.
    #[arg(
        long,
        value_enum,
        default_value = "human",
        global = true,
        env = "FLASH_DRILL_LOG_FORMAT"
    )]
    pub log_format: LogFormat,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Play one run of an activity; type answers and press enter.
    Play(PlayArgs),

    /// List the built-in activities.
    Activities,
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct PlayArgs {
    /// Activity to play.
    #[arg(short, long, default_value_t = 1, env = "FLASH_DRILL_ACTIVITY")]
    pub activity: u64,

    /// JSON file (or directory of `<activity>.json` files) with assigned questions.
    #[arg(short, long, env = "FLASH_DRILL_QUESTIONS")]
    pub questions: Option<PathBuf>,

    /// Assignment group to play from a grouped payload, by title or slug.
    #[arg(short, long, requires = "questions", env = "FLASH_DRILL_GROUP")]
    pub group: Option<String>,

    /// Seconds each operand stays on screen; beats per-question speeds.
    #[arg(short, long, env = "FLASH_DRILL_SPEED")]
    pub speed: Option<f64>,

    /// Flash operands inside the timed game phase instead of during input.
    #[arg(long, env = "FLASH_DRILL_REVEAL_DURING_GAME")]
    pub reveal_during_game: bool,

    /// Seed for generated questions.
    #[arg(long, env = "FLASH_DRILL_SEED")]
    pub seed: Option<u64>,

    /// JSON file with pacing settings.
    #[arg(long, env = "FLASH_DRILL_SETTINGS")]
    pub settings: Option<PathBuf>,
}
