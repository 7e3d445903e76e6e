use std::sync::Arc;

use drill_core::model::{ActivityId, RunSettings};
use drill_core::run::RunController;
use drill_core::supplier::{QuestionSet, QuestionSupplier};
use storage::{ActivityCatalog, QuestionSource, SourceError, Sources};
use tracing::{debug, info, warn};

use crate::Clock;
use crate::error::RunError;
use crate::runs::RunDriver;

/// Resolves an activity and its questions, then builds a ready run.
#[derive(Clone)]
pub struct RunLauncher {
    clock: Clock,
    catalog: Arc<dyn ActivityCatalog>,
    questions: Arc<dyn QuestionSource>,
    settings: RunSettings,
    seed: Option<u64>,
}

impl RunLauncher {
    #[must_use]
    pub fn new(
        clock: Clock,
        catalog: Arc<dyn ActivityCatalog>,
        questions: Arc<dyn QuestionSource>,
    ) -> Self {
        Self {
            clock,
            catalog,
            questions,
            settings: RunSettings::default(),
            seed: None,
        }
    }

    #[must_use]
    pub fn from_sources(clock: Clock, sources: &Sources) -> Self {
        Self::new(
            clock,
            Arc::clone(&sources.catalog),
            Arc::clone(&sources.questions),
        )
    }

    #[must_use]
    pub fn with_settings(mut self, settings: RunSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Fixes the RNG seed; a random one is drawn per run otherwise.
    #[must_use]
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Build a controller for the given activity.
    ///
    /// A failing question source is not fatal: the run falls back to the
    /// activity's generator.
    ///
    /// # Errors
    ///
    /// Returns `RunError::UnknownActivity` when the catalog has no entry,
    /// `RunError::Catalog` when the catalog cannot be read, and
    /// `RunError::Core` for invalid run settings.
    pub async fn prepare(&self, activity_id: ActivityId) -> Result<RunController, RunError> {
        let activity = self
            .catalog
            .activity(activity_id)
            .await?
            .ok_or(RunError::UnknownActivity(activity_id))?;

        let set = match self.questions.question_set(activity_id).await {
            Ok(set) => set,
            Err(SourceError::NotFound(_)) => {
                debug!(activity = %activity_id, "no assigned questions, using generator");
                QuestionSet::empty()
            }
            Err(err) => {
                warn!(activity = %activity_id, error = %err, "question source failed, using generator");
                QuestionSet::empty()
            }
        };

        let seed = self.seed.unwrap_or_else(rand::random);
        let supplier = QuestionSupplier::for_activity(&activity, set);
        let controller = RunController::new(activity, supplier, self.settings.clone())?
            .with_clock(self.clock)
            .with_seed(seed);

        info!(
            run = %controller.id(),
            activity = %activity_id,
            title = controller.activity().title(),
            seed,
            "run prepared"
        );
        Ok(controller)
    }

    /// Build a controller and wrap it in a driver.
    ///
    /// # Errors
    ///
    /// Same as [`RunLauncher::prepare`].
    pub async fn launch(&self, activity_id: ActivityId) -> Result<RunDriver, RunError> {
        Ok(RunDriver::new(self.prepare(activity_id).await?))
    }
}
