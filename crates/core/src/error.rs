use thiserror::Error;

use crate::model::{ActivityError, QuestionError, RunSummaryError, SettingsError};
use crate::scheduler::SchedulerError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Activity(#[from] ActivityError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
    #[error(transparent)]
    Summary(#[from] RunSummaryError),
}
