//! Group-size scaling for boss health and damage.
use serde::{Deserialize, Serialize};

use crate::constants::{
    DAMAGE_PER_EXTRA_PARTICIPANT, HEALTH_PER_EXTRA_PARTICIPANT, MAX_DAMAGE_MULTIPLIER,
    MAX_HEALTH_MULTIPLIER,
};
use crate::numbers::{positive_or, usize_to_f64};

/// Tuning used when a trigger asks for multipliers derived from group size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingConfig {
    #[serde(default = "ScalingConfig::default_health_per_extra")]
    pub health_per_extra_participant: f64,
    #[serde(default = "ScalingConfig::default_damage_per_extra")]
    pub damage_per_extra_participant: f64,
    #[serde(default = "ScalingConfig::default_max_health")]
    pub max_health_multiplier: f64,
    #[serde(default = "ScalingConfig::default_max_damage")]
    pub max_damage_multiplier: f64,
}

impl ScalingConfig {
    const fn default_health_per_extra() -> f64 {
        HEALTH_PER_EXTRA_PARTICIPANT
    }

    const fn default_damage_per_extra() -> f64 {
        DAMAGE_PER_EXTRA_PARTICIPANT
    }

    const fn default_max_health() -> f64 {
        MAX_HEALTH_MULTIPLIER
    }

    const fn default_max_damage() -> f64 {
        MAX_DAMAGE_MULTIPLIER
    }
}

impl Default for ScalingConfig {
    fn default() -> Self {
        Self {
            health_per_extra_participant: Self::default_health_per_extra(),
            damage_per_extra_participant: Self::default_damage_per_extra(),
            max_health_multiplier: Self::default_max_health(),
            max_damage_multiplier: Self::default_max_damage(),
        }
    }
}

/// Inputs to a scaling pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalingInput {
    pub base_health: f64,
    pub health_multiplier: f64,
    pub damage_multiplier: f64,
    pub participant_count: usize,
}

/// Boss stats after scaling. `current_health` always starts at `max_health`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaledStats {
    pub max_health: f64,
    pub current_health: f64,
    pub damage_multiplier: f64,
    pub participant_count: usize,
}

/// Pair of multipliers suggested for a group size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Multipliers {
    pub health: f64,
    pub damage: f64,
}

/// Stateless scaling arithmetic.
pub struct ScalingCalculator;

impl ScalingCalculator {
    /// Scale base health; the damage multiplier is carried through untouched
    /// for ability damage and never folded into the boss's own attributes.
    #[must_use]
    pub fn apply(input: ScalingInput) -> ScaledStats {
        let max_health = input.base_health.max(0.0) * input.health_multiplier;
        ScaledStats {
            max_health,
            current_health: max_health,
            damage_multiplier: input.damage_multiplier,
            participant_count: input.participant_count,
        }
    }

    /// Multipliers grow linearly with every participant past the first and are capped.
    #[must_use]
    pub fn recommended_multipliers(participant_count: usize, cfg: &ScalingConfig) -> Multipliers {
        let extra = usize_to_f64(participant_count.saturating_sub(1));
        let health_cap = positive_or(cfg.max_health_multiplier, 1.0).max(1.0);
        let damage_cap = positive_or(cfg.max_damage_multiplier, 1.0).max(1.0);
        let health = (1.0 + extra * cfg.health_per_extra_participant.max(0.0)).min(health_cap);
        let damage = (1.0 + extra * cfg.damage_per_extra_participant.max(0.0)).min(damage_cap);
        Multipliers { health, damage }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_base_health_and_fills_it() {
        let stats = ScalingCalculator::apply(ScalingInput {
            base_health: 200.0,
            health_multiplier: 2.0,
            damage_multiplier: 1.5,
            participant_count: 4,
        });
        assert!((stats.max_health - 400.0).abs() < f64::EPSILON);
        assert!((stats.current_health - 400.0).abs() < f64::EPSILON);
        assert!((stats.damage_multiplier - 1.5).abs() < f64::EPSILON);
        assert_eq!(stats.participant_count, 4);
    }

    #[test]
    fn recommended_multipliers_scale_and_cap() {
        let cfg = ScalingConfig::default();
        let solo = ScalingCalculator::recommended_multipliers(1, &cfg);
        assert!((solo.health - 1.0).abs() < f64::EPSILON);
        assert!((solo.damage - 1.0).abs() < f64::EPSILON);

        let four = ScalingCalculator::recommended_multipliers(4, &cfg);
        assert!((four.health - 1.75).abs() < 1e-9);
        assert!((four.damage - 1.15).abs() < 1e-9);

        let crowd = ScalingCalculator::recommended_multipliers(200, &cfg);
        assert!((crowd.health - cfg.max_health_multiplier).abs() < f64::EPSILON);
        assert!((crowd.damage - cfg.max_damage_multiplier).abs() < f64::EPSILON);

        let empty = ScalingCalculator::recommended_multipliers(0, &cfg);
        assert!((empty.health - 1.0).abs() < f64::EPSILON);
    }
}
