use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use drill_core::model::{ActivityConfig, ActivityError, ActivityId, Presentation};
use drill_core::supplier::{AdditionGenerator, SumGenerator};

use crate::repository::{ActivityCatalog, SourceError};

pub const FLASH_NUMBER_ID: u64 = 1;
pub const ADDITION_PRACTICE_ID: u64 = 2;

/// Fixed, in-process activity catalog.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    activities: HashMap<ActivityId, ActivityConfig>,
}

impl StaticCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The two stock activities: flash-number sums and composed addition.
    #[must_use]
    pub fn builtin() -> Self {
        match builtin_activities() {
            Ok(activities) => activities
                .into_iter()
                .fold(Self::new(), StaticCatalog::with_activity),
            Err(err) => {
                tracing::error!(error = %err, "built-in activities rejected");
                Self::new()
            }
        }
    }

    #[must_use]
    pub fn with_activity(mut self, activity: ActivityConfig) -> Self {
        self.activities.insert(activity.id(), activity);
        self
    }

    /// Activities in id order.
    pub fn iter(&self) -> impl Iterator<Item = &ActivityConfig> {
        let mut activities: Vec<&ActivityConfig> = self.activities.values().collect();
        activities.sort_by_key(|activity| activity.id());
        activities.into_iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.activities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }
}

fn builtin_activities() -> Result<Vec<ActivityConfig>, ActivityError> {
    let flash = ActivityConfig::new(ActivityId::new(FLASH_NUMBER_ID), "Flash Number", 5_000, 10)?
        .with_generator(Arc::new(SumGenerator::default()));
    let addition = ActivityConfig::new(
        ActivityId::new(ADDITION_PRACTICE_ID),
        "Addition Practice",
        10_000,
        10,
    )?
    .with_generator(Arc::new(AdditionGenerator::default()))
    .with_presentation(Presentation::Composed);
    Ok(vec![flash, addition])
}

#[async_trait]
impl ActivityCatalog for StaticCatalog {
    async fn activity(&self, id: ActivityId) -> Result<Option<ActivityConfig>, SourceError> {
        Ok(self.activities.get(&id).cloned())
    }
}
