use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("countdown must start at >= 1")]
    InvalidCountdown,

    #[error("{field} must be > 0 ms")]
    ZeroTick { field: &'static str },

    #[error("speed override must be a positive number of seconds, got {provided}")]
    InvalidSpeedOverride { provided: f64 },
}

/// Pacing knobs for a run.
///
/// Every field has a default, so a partial JSON document deserializes into a
/// complete configuration. Call [`RunSettings::validate`] after loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunSettings {
    countdown_from: u32,
    countdown_tick_ms: u64,
    game_tick_ms: u64,
    default_display_ms: u64,
    operand_gap_ms: u64,
    flash_settle_ms: u64,
    game_over_delay_ms: u64,
    reveal_lead_in_ms: u64,
    reveal_settle_ms: u64,
    min_reveal_delay_ms: u64,
    speed_override_secs: Option<f64>,
    reveal_during_game: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            countdown_from: 3,
            countdown_tick_ms: 1_000,
            game_tick_ms: 100,
            default_display_ms: 800,
            operand_gap_ms: 100,
            flash_settle_ms: 500,
            game_over_delay_ms: 2_000,
            reveal_lead_in_ms: 250,
            reveal_settle_ms: 400,
            min_reveal_delay_ms: 150,
            speed_override_secs: None,
            reveal_during_game: false,
        }
    }
}

impl RunSettings {
    /// Checks invariants that `Default` always satisfies but a loaded file may not.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` for a zero countdown, a zero tick, or a
    /// non-positive speed override.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.countdown_from == 0 {
            return Err(SettingsError::InvalidCountdown);
        }
        let ticks = [
            ("countdown_tick_ms", self.countdown_tick_ms),
            ("game_tick_ms", self.game_tick_ms),
            ("default_display_ms", self.default_display_ms),
            ("min_reveal_delay_ms", self.min_reveal_delay_ms),
        ];
        if let Some(&(field, _)) = ticks.iter().find(|(_, ms)| *ms == 0) {
            return Err(SettingsError::ZeroTick { field });
        }
        match self.speed_override_secs {
            Some(secs) if !secs.is_finite() || secs <= 0.0 => {
                return Err(SettingsError::InvalidSpeedOverride { provided: secs });
            }
            _ => {}
        }
        Ok(())
    }

    /// Run-level speed override in seconds per operand.
    #[must_use]
    pub fn with_speed_override(mut self, secs: Option<f64>) -> Self {
        self.speed_override_secs = secs;
        self
    }

    /// Selects the legacy variant that flashes operands inside the GAME phase.
    #[must_use]
    pub fn with_reveal_during_game(mut self, enabled: bool) -> Self {
        self.reveal_during_game = enabled;
        self
    }

    #[must_use]
    pub fn with_countdown_from(mut self, from: u32) -> Self {
        self.countdown_from = from;
        self
    }

    #[must_use]
    pub fn with_default_display_ms(mut self, ms: u64) -> Self {
        self.default_display_ms = ms;
        self
    }

    #[must_use]
    pub fn countdown_from(&self) -> u32 {
        self.countdown_from
    }

    #[must_use]
    pub fn countdown_tick(&self) -> Duration {
        Duration::from_millis(self.countdown_tick_ms)
    }

    #[must_use]
    pub fn game_tick(&self) -> Duration {
        Duration::from_millis(self.game_tick_ms)
    }

    #[must_use]
    pub fn default_display(&self) -> Duration {
        Duration::from_millis(self.default_display_ms)
    }

    #[must_use]
    pub fn operand_gap(&self) -> Duration {
        Duration::from_millis(self.operand_gap_ms)
    }

    #[must_use]
    pub fn flash_settle(&self) -> Duration {
        Duration::from_millis(self.flash_settle_ms)
    }

    #[must_use]
    pub fn game_over_delay(&self) -> Duration {
        Duration::from_millis(self.game_over_delay_ms)
    }

    #[must_use]
    pub fn reveal_lead_in(&self) -> Duration {
        Duration::from_millis(self.reveal_lead_in_ms)
    }

    #[must_use]
    pub fn reveal_settle(&self) -> Duration {
        Duration::from_millis(self.reveal_settle_ms)
    }

    #[must_use]
    pub fn min_reveal_delay(&self) -> Duration {
        Duration::from_millis(self.min_reveal_delay_ms)
    }

    #[must_use]
    pub fn speed_override_secs(&self) -> Option<f64> {
        self.speed_override_secs
    }

    #[must_use]
    pub fn reveal_during_game(&self) -> bool {
        self.reveal_during_game
    }
}
