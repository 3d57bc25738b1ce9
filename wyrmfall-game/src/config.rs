//! Encounter tuning loaded from bundled JSON.
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ability::AbilityTuning;
use crate::constants::{ENRAGE_AFTER_SECS, TICK_INTERVAL_MS};
use crate::minions::SpawnRules;
use crate::phase::PhaseThresholds;
use crate::reward::RewardTuning;
use crate::scaling::ScalingConfig;

const DEFAULT_ENCOUNTER_DATA: &str = include_str!("../assets/encounter.json");

/// Errors raised when encounter configuration invariants are violated.
#[derive(Debug, Error, PartialEq)]
pub enum EncounterConfigError {
    #[error("encounter config is not valid JSON: {0}")]
    Parse(String),
    #[error("{field} must be at least {min} (got {value})")]
    MinViolation {
        field: &'static str,
        min: f64,
        value: f64,
    },
    #[error("{field} must be between {min:.2} and {max:.2} (got {value:.2})")]
    RangeViolation {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("thresholds must strictly decrease (aerial {aerial:.2}, ground {ground:.2}, enraged {enraged:.2})")]
    ThresholdOrder {
        aerial: f64,
        ground: f64,
        enraged: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterConfig {
    #[serde(default = "EncounterConfig::default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "EncounterConfig::default_enrage_after_secs")]
    pub enrage_after_secs: u64,
    #[serde(default)]
    pub thresholds: PhaseThresholds,
    #[serde(default)]
    pub spawn: SpawnRules,
    #[serde(default)]
    pub abilities: AbilityTuning,
    #[serde(default)]
    pub rewards: RewardTuning,
    #[serde(default)]
    pub scaling: ScalingConfig,
}

impl EncounterConfig {
    const fn default_tick_interval_ms() -> u64 {
        TICK_INTERVAL_MS
    }

    const fn default_enrage_after_secs() -> u64 {
        ENRAGE_AFTER_SECS
    }

    /// Configuration built from constants alone, used when the bundled data fails to parse.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            tick_interval_ms: Self::default_tick_interval_ms(),
            enrage_after_secs: Self::default_enrage_after_secs(),
            thresholds: PhaseThresholds::default(),
            spawn: SpawnRules::default(),
            abilities: AbilityTuning::default(),
            rewards: RewardTuning::default(),
            scaling: ScalingConfig::default(),
        }
    }

    #[must_use]
    pub fn load_from_static() -> Self {
        Self::default()
    }

    /// Parse and validate a JSON document. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`EncounterConfigError::Parse`] for malformed JSON, or the first
    /// validation failure.
    pub fn from_json(raw: &str) -> Result<Self, EncounterConfigError> {
        let cfg: Self =
            serde_json::from_str(raw).map_err(|err| EncounterConfigError::Parse(err.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    #[must_use]
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    #[must_use]
    pub const fn enrage_after(&self) -> Duration {
        Duration::from_secs(self.enrage_after_secs)
    }

    /// Validate configuration bounds.
    ///
    /// # Errors
    ///
    /// Returns `EncounterConfigError` when any field violates the documented bounds.
    pub fn validate(&self) -> Result<(), EncounterConfigError> {
        min_u64("tick_interval_ms", self.tick_interval_ms, 1)?;
        min_u64("enrage_after_secs", self.enrage_after_secs, 1)?;
        self.validate_thresholds()?;
        for (field, rule) in [
            ("spawn.crystal.participant_divisor", self.spawn.crystal),
            ("spawn.aerial.participant_divisor", self.spawn.aerial),
            ("spawn.ground.participant_divisor", self.spawn.ground),
            ("spawn.enraged.participant_divisor", self.spawn.enraged),
        ] {
            min_u64(field, u64::from(rule.participant_divisor), 1)?;
        }
        for (field, value) in self.abilities.magnitudes() {
            non_negative(field, value)?;
        }
        unit_range(
            "abilities.anchor_regen_fraction",
            self.abilities.anchor_regen_fraction,
        )?;
        min_u64(
            "abilities.breath_duration_ticks",
            u64::from(self.abilities.breath_duration_ticks),
            1,
        )?;
        non_negative(
            "scaling.health_per_extra_participant",
            self.scaling.health_per_extra_participant,
        )?;
        non_negative(
            "scaling.damage_per_extra_participant",
            self.scaling.damage_per_extra_participant,
        )?;
        at_least(
            "scaling.max_health_multiplier",
            self.scaling.max_health_multiplier,
            1.0,
        )?;
        at_least(
            "scaling.max_damage_multiplier",
            self.scaling.max_damage_multiplier,
            1.0,
        )?;
        Ok(())
    }

    fn validate_thresholds(&self) -> Result<(), EncounterConfigError> {
        let t = &self.thresholds;
        unit_range("thresholds.aerial", t.aerial)?;
        unit_range("thresholds.ground", t.ground)?;
        unit_range("thresholds.enraged", t.enraged)?;
        if !(t.aerial > t.ground && t.ground > t.enraged) {
            return Err(EncounterConfigError::ThresholdOrder {
                aerial: t.aerial,
                ground: t.ground,
                enraged: t.enraged,
            });
        }
        Ok(())
    }
}

impl Default for EncounterConfig {
    fn default() -> Self {
        serde_json::from_str(DEFAULT_ENCOUNTER_DATA).unwrap_or_else(|_| Self::fallback())
    }
}

#[allow(clippy::cast_precision_loss)]
fn min_u64(field: &'static str, value: u64, min: u64) -> Result<(), EncounterConfigError> {
    if value < min {
        return Err(EncounterConfigError::MinViolation {
            field,
            min: min as f64,
            value: value as f64,
        });
    }
    Ok(())
}

fn at_least(field: &'static str, value: f64, min: f64) -> Result<(), EncounterConfigError> {
    if !value.is_finite() || value < min {
        return Err(EncounterConfigError::MinViolation { field, min, value });
    }
    Ok(())
}

fn non_negative(field: &'static str, value: f64) -> Result<(), EncounterConfigError> {
    at_least(field, value, 0.0)
}

fn unit_range(field: &'static str, value: f64) -> Result<(), EncounterConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(EncounterConfigError::RangeViolation {
            field,
            min: 0.0,
            max: 1.0,
            value,
        });
    }
    Ok(())
}
