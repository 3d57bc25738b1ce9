//! Collaborator interfaces between the encounter and the hosting world.
//!
//! Nothing in this crate owns an entity. The boss, the participants and every
//! summoned helper live in the host's entity system; the encounter holds plain
//! handles and asks the host to act on them. Every method takes `&self` so the
//! orchestrator can share collaborators without locking inside the
//! single-threaded tick model.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ability::Ability;
use crate::phase::Phase;

/// Handle for the boss entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BossId(pub u64);

/// Handle for a participant (player-equivalent actor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub u64);

/// Weak handle for a summoned helper; the host may invalidate it at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityHandle(pub u64);

impl fmt::Display for BossId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "boss#{}", self.0)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "participant#{}", self.0)
    }
}

/// World-space position.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Location {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Location {
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[must_use]
    pub fn distance_to(&self, other: &Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Point `radius` away on the horizontal ring around `self`, `slot` of `slots`.
    #[must_use]
    pub fn ring_point(&self, radius: f64, slot: usize, slots: usize) -> Self {
        let slots = crate::numbers::usize_to_f64(slots.max(1));
        let angle = std::f64::consts::TAU * crate::numbers::usize_to_f64(slot) / slots;
        Self {
            x: self.x + radius * angle.cos(),
            y: self.y,
            z: self.z + radius * angle.sin(),
        }
    }
}

/// A participant as registered at encounter start.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
}

impl Participant {
    #[must_use]
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id: ParticipantId(id),
            name: name.into(),
        }
    }
}

/// Current and maximum health of the boss.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BossHealth {
    pub current: f64,
    pub max: f64,
}

impl BossHealth {
    #[must_use]
    pub const fn full(max: f64) -> Self {
        Self { current: max, max }
    }

    /// Health fraction in `[0, 1]`.
    #[must_use]
    pub fn fraction(&self) -> f64 {
        crate::numbers::health_fraction(self.current, self.max)
    }

    #[must_use]
    pub fn is_depleted(&self) -> bool {
        self.current <= 0.0
    }
}

/// Whether a participant can still take part in the fight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    Present,
    Offline,
    Dead,
    OutOfRange,
}

impl Presence {
    #[must_use]
    pub const fn is_present(self) -> bool {
        matches!(self, Self::Present)
    }
}

/// Kind of helper creature requested from the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MinionKind {
    /// Anchor-bound crystal that shields and heals the boss.
    AnchorCrystal,
    /// Flying skirmisher.
    Skyling,
    /// Ground guardian.
    Broodguard,
    /// Frenzied spawn released when the boss is enraged or calls its brood.
    Ravager,
}

/// Status modifier applied to the boss on phase entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BossModifier {
    CrystalWarded,
    Airborne,
    Grounded,
    Enraged,
}

/// Status applied to participants by abilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusEffect {
    Fear,
}

/// Opaque cue for the effects renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cue", rename_all = "snake_case")]
pub enum EffectCue {
    PhaseEntered { phase: Phase },
    AbilityCast { ability: Ability, phase: Phase, at: Option<Location> },
    Victory,
    Failure,
}

/// The host entity system.
pub trait Arena {
    /// Health of the boss, or `None` when the handle no longer resolves.
    fn boss_health(&self, boss: BossId) -> Option<BossHealth>;

    /// Overwrite boss health. Returns `false` if the boss could not be updated.
    fn set_boss_health(&self, boss: BossId, health: BossHealth) -> bool;

    /// Heal the boss, capped at its maximum. Returns `false` if nothing was applied.
    fn heal_boss(&self, boss: BossId, amount: f64) -> bool;

    fn boss_location(&self, boss: BossId) -> Option<Location>;

    fn apply_boss_modifier(&self, boss: BossId, modifier: BossModifier);

    /// Fixed anchor sites for the first phase; may be empty.
    fn anchor_sites(&self, boss: BossId) -> Vec<Location>;

    fn presence(&self, participant: ParticipantId) -> Presence;

    fn participant_location(&self, participant: ParticipantId) -> Option<Location>;

    /// Participants that struck the boss since the previous call, one entry per hit.
    fn drain_hits(&self, boss: BossId) -> Vec<ParticipantId>;

    fn spawn_minion(&self, kind: MinionKind, at: Location) -> Option<EntityHandle>;

    fn is_alive(&self, handle: EntityHandle) -> bool;

    /// Ask the host to remove a helper. Returns `false` if it was already gone.
    fn remove_entity(&self, handle: EntityHandle) -> bool;

    /// Returns `false` when the damage could not be applied.
    fn damage_participant(&self, participant: ParticipantId, amount: f64) -> bool;

    /// Returns `false` when the knockback could not be applied.
    fn knock_back(&self, participant: ParticipantId, from: Location, strength: f64) -> bool;

    /// Returns `false` when the status could not be applied.
    fn apply_status(
        &self,
        participant: ParticipantId,
        status: StatusEffect,
        duration: Duration,
    ) -> bool;
}

/// Title/chat broadcast collaborator; rendering is entirely its concern.
pub trait Broadcaster {
    fn announce_phase_transition(&self, name: &str);

    fn announce_victory(&self, top_contributor: Option<&str>);

    fn announce_failure(&self);
}

/// Extra information handed to the reward collaborator alongside the amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardContext {
    pub boss: BossId,
    pub phase_transitions: u32,
    pub top_contributor: Option<ParticipantId>,
    pub duration_secs: u64,
}

/// Inventory/currency collaborator.
pub trait RewardGranter {
    fn grant_reward(&self, participant: &Participant, amount: u32, context: &RewardContext);
}

/// Visual/audio collaborator.
pub trait EffectsPlayer {
    fn play(&self, cue: EffectCue);
}
