use async_trait::async_trait;
use drill_core::model::{ActivityConfig, ActivityId};
use drill_core::supplier::QuestionSet;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by question sources and catalogs.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SourceError {
    #[error("no questions found for activity {0}")]
    NotFound(ActivityId),

    #[error("assignment group {0:?} not found")]
    UnknownGroup(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("payload decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Supplies the externally assigned questions for an activity.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Fetch the ordered question set assigned for an activity.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::NotFound` if nothing is assigned, or other
    /// source errors.
    async fn question_set(&self, activity: ActivityId) -> Result<QuestionSet, SourceError>;
}

/// Read-only lookup of activity configuration.
#[async_trait]
pub trait ActivityCatalog: Send + Sync {
    /// Fetch an activity by ID, `None` when the catalog has no such entry.
    ///
    /// # Errors
    ///
    /// Returns `SourceError` if the catalog cannot be read.
    async fn activity(&self, id: ActivityId) -> Result<Option<ActivityConfig>, SourceError>;
}

/// Simple in-memory question source for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemorySource {
    sets: Arc<Mutex<HashMap<ActivityId, QuestionSet>>>,
}

impl InMemorySource {
    #[must_use]
    pub fn new() -> Self {
        Self {
            sets: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Store or replace the set assigned to an activity.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::Connection` if the store lock is poisoned.
    pub fn assign(&self, activity: ActivityId, set: QuestionSet) -> Result<(), SourceError> {
        let mut guard = self
            .sets
            .lock()
            .map_err(|e| SourceError::Connection(e.to_string()))?;
        guard.insert(activity, set);
        Ok(())
    }
}

#[async_trait]
impl QuestionSource for InMemorySource {
    async fn question_set(&self, activity: ActivityId) -> Result<QuestionSet, SourceError> {
        let guard = self
            .sets
            .lock()
            .map_err(|e| SourceError::Connection(e.to_string()))?;
        guard
            .get(&activity)
            .cloned()
            .ok_or(SourceError::NotFound(activity))
    }
}

/// Catalog and question source behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Sources {
    pub catalog: Arc<dyn ActivityCatalog>,
    pub questions: Arc<dyn QuestionSource>,
}

impl Sources {
    #[must_use]
    pub fn new(catalog: Arc<dyn ActivityCatalog>, questions: Arc<dyn QuestionSource>) -> Self {
        Self { catalog, questions }
    }

    /// Built-in catalog with an empty in-memory source, so every run uses
    /// the fallback generators.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(crate::catalog::StaticCatalog::builtin()),
            Arc::new(InMemorySource::new()),
        )
    }
}
