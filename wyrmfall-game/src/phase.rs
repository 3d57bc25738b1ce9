//! Ordered combat phases and the controller that walks them.
//!
//! A phase is data: its ability table, its spawn rule, the boss modifier it
//! applies on entry and the cleanup it performs on exit. The controller only
//! decides *whether* to move; the monitor applies the move so the session keeps
//! a single mutator.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ability::{self, AbilitySlot};
use crate::constants::{
    AERIAL_HEALTH_THRESHOLD, ENRAGED_HEALTH_THRESHOLD, GROUND_HEALTH_THRESHOLD,
};
use crate::host::{BossModifier, MinionKind};
use crate::minions::{SpawnRule, SpawnRules};

/// Encounter phase, declared in escalation order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Crystal,
    Aerial,
    Ground,
    Enraged,
}

/// Work performed when leaving a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseCleanup {
    None,
    /// Force-remove every helper of this kind still standing.
    RetireMinions(MinionKind),
}

impl Phase {
    pub const ALL: [Self; 4] = [Self::Crystal, Self::Aerial, Self::Ground, Self::Enraged];

    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Crystal => Some(Self::Aerial),
            Self::Aerial => Some(Self::Ground),
            Self::Ground => Some(Self::Enraged),
            Self::Enraged => None,
        }
    }

    /// Name handed to the broadcast collaborator.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Crystal => "Crystal Ward",
            Self::Aerial => "Skyborne Fury",
            Self::Ground => "Scorched Earth",
            Self::Enraged => "Wyrm's Rage",
        }
    }

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Crystal => "crystal",
            Self::Aerial => "aerial",
            Self::Ground => "ground",
            Self::Enraged => "enraged",
        }
    }

    #[must_use]
    pub const fn abilities(self) -> &'static [AbilitySlot] {
        ability::catalog(self)
    }

    #[must_use]
    pub const fn minion_kind(self) -> MinionKind {
        match self {
            Self::Crystal => MinionKind::AnchorCrystal,
            Self::Aerial => MinionKind::Skyling,
            Self::Ground => MinionKind::Broodguard,
            Self::Enraged => MinionKind::Ravager,
        }
    }

    #[must_use]
    pub const fn entry_modifier(self) -> BossModifier {
        match self {
            Self::Crystal => BossModifier::CrystalWarded,
            Self::Aerial => BossModifier::Airborne,
            Self::Ground => BossModifier::Grounded,
            Self::Enraged => BossModifier::Enraged,
        }
    }

    #[must_use]
    pub const fn exit_cleanup(self) -> PhaseCleanup {
        match self {
            Self::Crystal => PhaseCleanup::RetireMinions(MinionKind::AnchorCrystal),
            Self::Aerial | Self::Ground | Self::Enraged => PhaseCleanup::None,
        }
    }

    #[must_use]
    pub const fn spawn_rule(self, rules: &SpawnRules) -> SpawnRule {
        match self {
            Self::Crystal => rules.crystal,
            Self::Aerial => rules.aerial,
            Self::Ground => rules.ground,
            Self::Enraged => rules.enraged,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Health fractions at or below which the boss leaves a phase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseThresholds {
    #[serde(default = "PhaseThresholds::default_aerial")]
    pub aerial: f64,
    #[serde(default = "PhaseThresholds::default_ground")]
    pub ground: f64,
    #[serde(default = "PhaseThresholds::default_enraged")]
    pub enraged: f64,
}

impl PhaseThresholds {
    const fn default_aerial() -> f64 {
        AERIAL_HEALTH_THRESHOLD
    }

    const fn default_ground() -> f64 {
        GROUND_HEALTH_THRESHOLD
    }

    const fn default_enraged() -> f64 {
        ENRAGED_HEALTH_THRESHOLD
    }
}

impl Default for PhaseThresholds {
    fn default() -> Self {
        Self {
            aerial: Self::default_aerial(),
            ground: Self::default_ground(),
            enraged: Self::default_enraged(),
        }
    }
}

/// Why a transition fired.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cause", rename_all = "snake_case")]
pub enum TransitionCause {
    HealthThreshold { fraction: f64 },
    AnchorsCleared,
    EnrageTimeout { elapsed_secs: u64 },
}

/// A decided, not yet applied, phase change.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseTransition {
    pub from: Phase,
    pub to: Phase,
    pub cause: TransitionCause,
}

/// Per-tick transition rules.
#[derive(Debug, Clone)]
pub struct PhaseController {
    thresholds: PhaseThresholds,
    enrage_after: Duration,
}

impl PhaseController {
    #[must_use]
    pub const fn new(thresholds: PhaseThresholds, enrage_after: Duration) -> Self {
        Self {
            thresholds,
            enrage_after,
        }
    }

    #[must_use]
    pub const fn enrage_after(&self) -> Duration {
        self.enrage_after
    }

    /// Health- and anchor-driven check. Moves at most one phase forward.
    #[must_use]
    pub fn evaluate(
        &self,
        current: Phase,
        health_fraction: f64,
        anchors_cleared: bool,
    ) -> Option<PhaseTransition> {
        let health = TransitionCause::HealthThreshold {
            fraction: health_fraction,
        };
        let (to, cause) = match current {
            Phase::Crystal if health_fraction <= self.thresholds.aerial => (Phase::Aerial, health),
            Phase::Crystal if anchors_cleared => (Phase::Aerial, TransitionCause::AnchorsCleared),
            Phase::Aerial if health_fraction <= self.thresholds.ground => (Phase::Ground, health),
            Phase::Ground if health_fraction <= self.thresholds.enraged => {
                (Phase::Enraged, health)
            }
            _ => return None,
        };
        Some(PhaseTransition {
            from: current,
            to,
            cause,
        })
    }

    /// Time-based override: jump straight to the enraged phase once the
    /// encounter has run for the configured limit.
    #[must_use]
    pub fn check_enrage_timeout(
        &self,
        current: Phase,
        elapsed: Duration,
    ) -> Option<PhaseTransition> {
        if current == Phase::Enraged || elapsed < self.enrage_after {
            return None;
        }
        Some(PhaseTransition {
            from: current,
            to: Phase::Enraged,
            cause: TransitionCause::EnrageTimeout {
                elapsed_secs: elapsed.as_secs(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn controller() -> PhaseController {
        PhaseController::new(PhaseThresholds::default(), Duration::from_secs(600))
    }

    #[test]
    fn phases_are_ordered() {
        assert!(Phase::Crystal < Phase::Aerial);
        assert!(Phase::Aerial < Phase::Ground);
        assert!(Phase::Ground < Phase::Enraged);
        assert_eq!(Phase::Enraged.next(), None);
        for pair in Phase::ALL.windows(2) {
            assert_eq!(pair[0].next(), Some(pair[1]));
        }
    }

    #[test]
    fn health_thresholds_advance_one_step() {
        let ctl = controller();
        assert_eq!(ctl.evaluate(Phase::Crystal, 0.76, false), None);
        let t = ctl.evaluate(Phase::Crystal, 0.75, false).expect("transition");
        assert_eq!((t.from, t.to), (Phase::Crystal, Phase::Aerial));

        // A steep drop still only moves one phase per evaluation.
        let t = ctl.evaluate(Phase::Crystal, 0.1, false).expect("transition");
        assert_eq!(t.to, Phase::Aerial);

        assert_eq!(ctl.evaluate(Phase::Aerial, 0.51, false), None);
        assert_eq!(ctl.evaluate(Phase::Aerial, 0.5, false).map(|t| t.to), Some(Phase::Ground));
        assert_eq!(ctl.evaluate(Phase::Ground, 0.26, false), None);
        assert_eq!(
            ctl.evaluate(Phase::Ground, 0.25, false).map(|t| t.to),
            Some(Phase::Enraged)
        );
        assert_eq!(ctl.evaluate(Phase::Enraged, 0.0, true), None);
    }

    #[test]
    fn cleared_anchors_only_matter_in_crystal_phase() {
        let ctl = controller();
        let t = ctl.evaluate(Phase::Crystal, 1.0, true).expect("transition");
        assert_eq!(t.to, Phase::Aerial);
        assert_eq!(t.cause, TransitionCause::AnchorsCleared);
        assert_eq!(ctl.evaluate(Phase::Aerial, 0.9, true), None);
    }

    #[test]
    fn reevaluating_after_transition_is_a_noop() {
        let ctl = controller();
        let t = ctl.evaluate(Phase::Crystal, 0.74, false).expect("transition");
        assert_eq!(ctl.evaluate(t.to, 0.74, false), None);
        assert_eq!(ctl.evaluate(t.to, 0.74, false), None);
    }

    #[test]
    fn timeout_forces_enrage_from_any_phase() {
        let ctl = controller();
        for phase in [Phase::Crystal, Phase::Aerial, Phase::Ground] {
            assert_eq!(ctl.check_enrage_timeout(phase, Duration::from_secs(599)), None);
            let t = ctl
                .check_enrage_timeout(phase, Duration::from_secs(600))
                .expect("timeout");
            assert_eq!(t.to, Phase::Enraged);
            assert!(matches!(t.cause, TransitionCause::EnrageTimeout { elapsed_secs: 600 }));
        }
        assert_eq!(
            ctl.check_enrage_timeout(Phase::Enraged, Duration::from_secs(9_000)),
            None
        );
    }

    #[test]
    fn non_increasing_health_never_regresses_phase() {
        let ctl = controller();
        let mut rng = SmallRng::seed_from_u64(0x5EED);
        for _ in 0..200 {
            let mut phase = Phase::Crystal;
            let mut fraction = 1.0_f64;
            let mut seen = vec![phase];
            for _ in 0..60 {
                fraction = (fraction - rng.gen_range(0.0..0.08)).max(0.0);
                if let Some(t) = ctl.evaluate(phase, fraction, false) {
                    assert_eq!(t.from, phase);
                    phase = t.to;
                }
                seen.push(phase);
            }
            assert!(seen.windows(2).all(|w| w[0] <= w[1]), "phase regressed: {seen:?}");
        }
    }
}
