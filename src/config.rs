//! Session configuration parameters
//!
//! All tunable parameters for the pet: smoothing, hold and hunger timing,
//! and the food keyword.  Values can be overridden from a JSON file (see
//! [`JsonFileConfig`](crate::adapters::json_config::JsonFileConfig)) or
//! hot-reloaded with `AppCommand::UpdateConfig`.

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::smoother::WINDOW_CAPACITY;

/// Core pet configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PetConfig {
    // --- Smoothing ---
    /// Samples kept per label in the rolling window (1..=16)
    pub buffer_size: usize,
    /// Rolling-average confidence needed for a stable signal (0..=1)
    pub confidence_threshold: f32,
    /// Labels tracked at once before the least recently seen is evicted
    pub max_tracked_labels: usize,
    /// Observe every prediction per frame instead of only the top one
    pub sample_all_labels: bool,

    // --- Feeding ---
    /// Case-insensitive substring that marks a label as food
    pub food_keyword: String,
    /// How long a stable food detection must persist (milliseconds)
    pub hold_time_ms: u64,
    /// Whether a stable non-food label restarts the food hold clock
    pub non_food_resets_hold: bool,

    // --- Display timing ---
    /// How long the happy face is held after a feeding (milliseconds)
    pub display_hold_ms: u64,
    /// Delay before a manual non-food press settles back (milliseconds)
    pub manual_revert_ms: u64,
    /// Time without food before the pet turns sad (milliseconds)
    pub sad_after_ms: u64,

    // --- Loop timing ---
    /// Hunger check interval (milliseconds)
    pub hunger_check_interval_ms: u64,
    /// Camera frame / classification interval (milliseconds)
    pub frame_interval_ms: u64,
    /// Telemetry report interval (milliseconds)
    pub telemetry_interval_ms: u64,
}

impl Default for PetConfig {
    fn default() -> Self {
        Self {
            // Smoothing
            buffer_size: 5,
            confidence_threshold: 0.85,
            max_tracked_labels: 32,
            sample_all_labels: false,

            // Feeding
            food_keyword: String::from("carrot"),
            hold_time_ms: 1000,
            non_food_resets_hold: true,

            // Display timing
            display_hold_ms: 3000,
            manual_revert_ms: 1500,
            sad_after_ms: 60_000,

            // Loop timing
            hunger_check_interval_ms: 2000,
            frame_interval_ms: 33,       // ~30 fps
            telemetry_interval_ms: 60_000, // 1/min
        }
    }
}

impl PetConfig {
    /// Reject out-of-range values.  Nothing is clamped silently.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buffer_size == 0 || self.buffer_size > WINDOW_CAPACITY {
            return Err(ConfigError::ValidationFailed("buffer_size must be 1..=16"));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(ConfigError::ValidationFailed(
                "confidence_threshold must be within 0..=1",
            ));
        }
        if self.max_tracked_labels == 0 {
            return Err(ConfigError::ValidationFailed("max_tracked_labels must be > 0"));
        }
        if self.food_keyword.trim().is_empty() {
            return Err(ConfigError::ValidationFailed("food_keyword must not be empty"));
        }
        if self.hunger_check_interval_ms == 0
            || self.frame_interval_ms == 0
            || self.telemetry_interval_ms == 0
        {
            return Err(ConfigError::ValidationFailed("intervals must be > 0"));
        }
        if self.sad_after_ms == 0 {
            return Err(ConfigError::ValidationFailed("sad_after_ms must be > 0"));
        }
        Ok(())
    }

    /// Whether `label` names the food item.
    pub fn is_food(&self, label: &str) -> bool {
        label
            .to_lowercase()
            .contains(&self.food_keyword.to_lowercase())
    }
}
