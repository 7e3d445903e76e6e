use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use drill_core::model::ActivityId;
use drill_core::supplier::QuestionSet;
use tracing::debug;

use crate::payload::decode_question_set;
use crate::repository::{QuestionSource, SourceError};

/// Reads assigned questions from JSON on disk.
///
/// A file path serves the same payload for every activity; a directory path
/// serves `<dir>/<activity id>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
    group: Option<String>,
}

impl JsonFileSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            group: None,
        }
    }

    /// Pick one assignment group, by title or slug, from grouped payloads.
    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn resolve(&self, activity: ActivityId) -> Result<PathBuf, SourceError> {
        let metadata = tokio::fs::metadata(&self.path).await?;
        if metadata.is_dir() {
            Ok(self.path.join(format!("{activity}.json")))
        } else {
            Ok(self.path.clone())
        }
    }
}

#[async_trait]
impl QuestionSource for JsonFileSource {
    async fn question_set(&self, activity: ActivityId) -> Result<QuestionSet, SourceError> {
        let path = self.resolve(activity).await?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(SourceError::NotFound(activity));
            }
            Err(err) => return Err(err.into()),
        };
        let set = decode_question_set(&bytes, self.group.as_deref())?;
        debug!(
            path = %path.display(),
            %activity,
            questions = set.len(),
            "question set loaded"
        );
        Ok(set)
    }
}
