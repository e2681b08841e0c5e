//! Gameplay tuning
//!
//! Loaded from JSON on native builds; every field falls back to the
//! constants in [`crate::consts`] when absent.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;

/// Data-driven gameplay balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Input ===
    /// Software key-repeat period in ms (0 disables repeat)
    pub repeat_interval_ms: u32,
    /// Impulse magnitude per key firing
    pub impulse_strength: f32,

    // === Spawn scheduler ===
    /// Delay before the first tick
    pub initial_interval_ms: u32,
    /// Delay reduction per tick
    pub interval_step_ms: u32,
    /// Delay floor
    pub min_interval_ms: u32,
    /// Spawn height range (min, max)
    pub spawn_height: (f32, f32),

    // === Entity pool ===
    /// Live entity capacity
    pub max_entities: usize,
    /// Non-player entities below this height are pruned
    pub death_y: f32,

    // === Session ===
    /// Player below this height ends the session
    pub game_over_y: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            repeat_interval_ms: KEY_REPEAT_MS,
            impulse_strength: IMPULSE_STRENGTH,

            initial_interval_ms: INITIAL_INTERVAL_MS,
            interval_step_ms: INTERVAL_STEP_MS,
            min_interval_ms: MIN_INTERVAL_MS,
            spawn_height: SPAWN_Y,

            max_entities: MAX_ENTITIES,
            death_y: DIE_AT_Y,

            game_over_y: GAME_OVER_Y,
        }
    }
}

impl Tuning {
    /// Parse tuning from a JSON document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let tuning: Self = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load tuning from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let tuning = Self::from_json(&json)?;
        log::info!("Loaded tuning from {}", path.display());
        Ok(tuning)
    }

    /// Reject values that would break the scheduler or pool invariants
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_interval_ms == 0 {
            return Err(ConfigError::invalid("min_interval_ms", "must be positive"));
        }
        if self.initial_interval_ms < self.min_interval_ms {
            return Err(ConfigError::invalid(
                "initial_interval_ms",
                format!(
                    "{} is below min_interval_ms ({})",
                    self.initial_interval_ms, self.min_interval_ms
                ),
            ));
        }
        if self.max_entities == 0 {
            return Err(ConfigError::invalid("max_entities", "must be positive"));
        }
        if !self.impulse_strength.is_finite() || self.impulse_strength <= 0.0 {
            return Err(ConfigError::invalid(
                "impulse_strength",
                format!("{} is not a positive number", self.impulse_strength),
            ));
        }

        let (low, high) = self.spawn_height;
        if !low.is_finite() || !high.is_finite() || low >= high {
            return Err(ConfigError::invalid(
                "spawn_height",
                format!("({low}, {high}) is not a valid range"),
            ));
        }
        // New shapes must never be pruned on the tick that spawned them
        if low <= self.death_y {
            return Err(ConfigError::invalid(
                "spawn_height",
                format!("lowest spawn height {low} is not above death_y {}", self.death_y),
            ));
        }
        if !self.death_y.is_finite() || !self.game_over_y.is_finite() {
            return Err(ConfigError::invalid("death_y", "thresholds must be finite"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let tuning = Tuning::default();
        assert!(tuning.validate().is_ok());
        assert_eq!(tuning.max_entities, 400);
        assert_eq!(tuning.initial_interval_ms, 1000);
        assert_eq!(tuning.min_interval_ms, 50);
        assert_eq!(tuning.repeat_interval_ms, 50);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let tuning = Tuning::from_json(r#"{ "max_entities": 12, "repeat_interval_ms": 0 }"#)
            .expect("valid tuning");
        assert_eq!(tuning.max_entities, 12);
        assert_eq!(tuning.repeat_interval_ms, 0);
        assert_eq!(tuning.initial_interval_ms, INITIAL_INTERVAL_MS);
        assert_eq!(tuning.death_y, DIE_AT_Y);
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = Tuning::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_rejects_zero_floor() {
        let tuning = Tuning {
            min_interval_ms: 0,
            ..Default::default()
        };
        assert!(matches!(
            tuning.validate(),
            Err(ConfigError::Invalid { field: "min_interval_ms", .. })
        ));
    }

    #[test]
    fn test_rejects_initial_below_floor() {
        let tuning = Tuning {
            initial_interval_ms: 40,
            ..Default::default()
        };
        assert!(matches!(
            tuning.validate(),
            Err(ConfigError::Invalid { field: "initial_interval_ms", .. })
        ));
    }

    #[test]
    fn test_rejects_spawn_below_death_line() {
        let err = Tuning::from_json(r#"{ "spawn_height": [-30.0, 5.0] }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "spawn_height", .. }));
    }

    #[test]
    fn test_rejects_zero_capacity() {
        let tuning = Tuning {
            max_entities: 0,
            ..Default::default()
        };
        assert!(tuning.validate().is_err());
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = Tuning::load("/definitely/not/here/tuning.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
