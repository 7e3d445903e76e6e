//! Shared error types for the services crate.

use thiserror::Error;

use drill_core::model::ActivityId;
use storage::SourceError;

/// Errors emitted while launching or driving a run.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RunError {
    #[error("activity {0} is not in the catalog")]
    UnknownActivity(ActivityId),
    #[error("run was cancelled")]
    Cancelled,
    #[error("answer input closed while waiting for an answer")]
    InputClosed,
    #[error(transparent)]
    Core(#[from] drill_core::Error),
    #[error(transparent)]
    Catalog(#[from] SourceError),
}
