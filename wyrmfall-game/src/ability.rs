//! Phase ability tables and the per-tick scheduler that fires them.
//!
//! Each phase owns a static table of slots. Every tick each slot rolls its own
//! trigger chance; of the slots that hit, one is picked uniformly and one
//! ability from its pool is picked uniformly. So a tick fires zero or one
//! ability.

use std::fmt;
use std::time::Duration;

use log::warn;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

use crate::constants::{
    ANCHOR_BEAM_DAMAGE, ANCHOR_REGEN_FRACTION, AREA_BARRAGE_DAMAGE, BREATH_DAMAGE_PER_TICK,
    BREATH_DURATION_TICKS, BREATH_RADIUS, CALL_BROOD_BASE, CHANCE_ANCHOR_BEAM, CHANCE_AREA_BARRAGE,
    CHANCE_CALL_BROOD, CHANCE_ENRAGED_ANY, CHANCE_FEAR_ROAR, CHANCE_KNOCKBACK_GUST,
    CHANCE_LINGERING_BREATH, CHANCE_MELEE_SWEEP, CHANCE_REGEN_NEAR_ANCHOR, FEAR_ROAR_DURATION_SECS,
    KNOCKBACK_GUST_DAMAGE, KNOCKBACK_GUST_STRENGTH, MELEE_SWEEP_DAMAGE, MELEE_SWEEP_REACH,
    MELEE_SWEEP_STRENGTH,
};
use crate::host::{
    Arena, BossId, EffectCue, EffectsPlayer, Location, Participant, ParticipantId, StatusEffect,
};
use crate::phase::Phase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ability {
    RegenNearAnchor,
    AnchorBeam,
    AreaBarrage,
    KnockbackGust,
    MeleeSweep,
    LingeringBreath,
    CallBrood,
    FearRoar,
}

impl Ability {
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::RegenNearAnchor => "regen-near-anchor",
            Self::AnchorBeam => "anchor-beam-attack",
            Self::AreaBarrage => "area-barrage",
            Self::KnockbackGust => "knockback-gust",
            Self::MeleeSweep => "melee-sweep",
            Self::LingeringBreath => "lingering-breath-zone",
            Self::CallBrood => "call-brood",
            Self::FearRoar => "fear-roar",
        }
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One independently rolled entry of a phase table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AbilitySlot {
    pub chance: f64,
    pub pool: &'static [Ability],
}

const fn slot(chance: f64, pool: &'static [Ability]) -> AbilitySlot {
    AbilitySlot { chance, pool }
}

const CRYSTAL_TABLE: [AbilitySlot; 2] = [
    slot(CHANCE_REGEN_NEAR_ANCHOR, &[Ability::RegenNearAnchor]),
    slot(CHANCE_ANCHOR_BEAM, &[Ability::AnchorBeam]),
];

const AERIAL_TABLE: [AbilitySlot; 2] = [
    slot(CHANCE_AREA_BARRAGE, &[Ability::AreaBarrage]),
    slot(CHANCE_KNOCKBACK_GUST, &[Ability::KnockbackGust]),
];

const GROUND_TABLE: [AbilitySlot; 3] = [
    slot(CHANCE_MELEE_SWEEP, &[Ability::MeleeSweep]),
    slot(CHANCE_LINGERING_BREATH, &[Ability::LingeringBreath]),
    slot(CHANCE_CALL_BROOD, &[Ability::CallBrood]),
];

const ENRAGED_POOL: [Ability; 7] = [
    Ability::RegenNearAnchor,
    Ability::AnchorBeam,
    Ability::AreaBarrage,
    Ability::KnockbackGust,
    Ability::MeleeSweep,
    Ability::LingeringBreath,
    Ability::CallBrood,
];

const ENRAGED_TABLE: [AbilitySlot; 2] = [
    slot(CHANCE_ENRAGED_ANY, &ENRAGED_POOL),
    slot(CHANCE_FEAR_ROAR, &[Ability::FearRoar]),
];

/// Static ability table for a phase.
#[must_use]
pub const fn catalog(phase: Phase) -> &'static [AbilitySlot] {
    match phase {
        Phase::Crystal => &CRYSTAL_TABLE,
        Phase::Aerial => &AERIAL_TABLE,
        Phase::Ground => &GROUND_TABLE,
        Phase::Enraged => &ENRAGED_TABLE,
    }
}

/// Payload magnitudes. Damage values are multiplied by the session's damage multiplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilityTuning {
    #[serde(default = "AbilityTuning::default_regen_fraction")]
    pub anchor_regen_fraction: f64,
    #[serde(default = "AbilityTuning::default_beam_damage")]
    pub anchor_beam_damage: f64,
    #[serde(default = "AbilityTuning::default_barrage_damage")]
    pub area_barrage_damage: f64,
    #[serde(default = "AbilityTuning::default_gust_damage")]
    pub knockback_gust_damage: f64,
    #[serde(default = "AbilityTuning::default_gust_strength")]
    pub knockback_gust_strength: f64,
    #[serde(default = "AbilityTuning::default_sweep_damage")]
    pub melee_sweep_damage: f64,
    #[serde(default = "AbilityTuning::default_sweep_strength")]
    pub melee_sweep_strength: f64,
    #[serde(default = "AbilityTuning::default_sweep_reach")]
    pub melee_sweep_reach: f64,
    #[serde(default = "AbilityTuning::default_breath_damage")]
    pub breath_damage_per_tick: f64,
    #[serde(default = "AbilityTuning::default_breath_radius")]
    pub breath_radius: f64,
    #[serde(default = "AbilityTuning::default_breath_ticks")]
    pub breath_duration_ticks: u32,
    #[serde(default = "AbilityTuning::default_fear_secs")]
    pub fear_roar_duration_secs: u64,
    #[serde(default = "AbilityTuning::default_brood_base")]
    pub call_brood_base: u32,
}

impl AbilityTuning {
    const fn default_regen_fraction() -> f64 {
        ANCHOR_REGEN_FRACTION
    }

    const fn default_beam_damage() -> f64 {
        ANCHOR_BEAM_DAMAGE
    }

    const fn default_barrage_damage() -> f64 {
        AREA_BARRAGE_DAMAGE
    }

    const fn default_gust_damage() -> f64 {
        KNOCKBACK_GUST_DAMAGE
    }

    const fn default_gust_strength() -> f64 {
        KNOCKBACK_GUST_STRENGTH
    }

    const fn default_sweep_damage() -> f64 {
        MELEE_SWEEP_DAMAGE
    }

    const fn default_sweep_strength() -> f64 {
        MELEE_SWEEP_STRENGTH
    }

    const fn default_sweep_reach() -> f64 {
        MELEE_SWEEP_REACH
    }

    const fn default_breath_damage() -> f64 {
        BREATH_DAMAGE_PER_TICK
    }

    const fn default_breath_radius() -> f64 {
        BREATH_RADIUS
    }

    const fn default_breath_ticks() -> u32 {
        BREATH_DURATION_TICKS
    }

    const fn default_fear_secs() -> u64 {
        FEAR_ROAR_DURATION_SECS
    }

    const fn default_brood_base() -> u32 {
        CALL_BROOD_BASE
    }

    /// Every magnitude paired with its field name, for validation.
    pub(crate) fn magnitudes(&self) -> [(&'static str, f64); 10] {
        [
            ("anchor_regen_fraction", self.anchor_regen_fraction),
            ("anchor_beam_damage", self.anchor_beam_damage),
            ("area_barrage_damage", self.area_barrage_damage),
            ("knockback_gust_damage", self.knockback_gust_damage),
            ("knockback_gust_strength", self.knockback_gust_strength),
            ("melee_sweep_damage", self.melee_sweep_damage),
            ("melee_sweep_strength", self.melee_sweep_strength),
            ("melee_sweep_reach", self.melee_sweep_reach),
            ("breath_damage_per_tick", self.breath_damage_per_tick),
            ("breath_radius", self.breath_radius),
        ]
    }
}

impl Default for AbilityTuning {
    fn default() -> Self {
        Self {
            anchor_regen_fraction: Self::default_regen_fraction(),
            anchor_beam_damage: Self::default_beam_damage(),
            area_barrage_damage: Self::default_barrage_damage(),
            knockback_gust_damage: Self::default_gust_damage(),
            knockback_gust_strength: Self::default_gust_strength(),
            melee_sweep_damage: Self::default_sweep_damage(),
            melee_sweep_strength: Self::default_sweep_strength(),
            melee_sweep_reach: Self::default_sweep_reach(),
            breath_damage_per_tick: Self::default_breath_damage(),
            breath_radius: Self::default_breath_radius(),
            breath_duration_ticks: Self::default_breath_ticks(),
            fear_roar_duration_secs: Self::default_fear_secs(),
            call_brood_base: Self::default_brood_base(),
        }
    }
}

/// Ground zone left by a breath attack, pulsed once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LingeringZone {
    pub center: Location,
    pub radius: f64,
    pub damage_per_tick: f64,
    pub remaining_ticks: u32,
}

/// Why a cast produced no effect.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AbilityError {
    #[error("{ability} found no valid target")]
    NoTarget { ability: Ability },
    #[error("{ability} needs a standing anchor")]
    NoAnchor { ability: Ability },
    #[error("{ability} could not locate the boss")]
    BossUnavailable { ability: Ability },
    #[error("host rejected the effect of {ability}")]
    EffectRejected { ability: Ability },
}

/// What a successful cast asks the monitor to record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum AbilityOutcome {
    Struck {
        targets: Vec<ParticipantId>,
        damage: f64,
    },
    Healed {
        amount: f64,
    },
    ZoneOpened {
        zone: LingeringZone,
        targets: Vec<ParticipantId>,
    },
    SummonRequested {
        count: u32,
        near: Location,
    },
    Feared {
        targets: Vec<ParticipantId>,
    },
}

/// Read-only view of the session for a single cast.
pub struct CastContext<'a> {
    pub boss: BossId,
    pub phase: Phase,
    pub participants: &'a [Participant],
    pub live_anchors: &'a [Location],
    pub damage_multiplier: f64,
}

type Eligible = SmallVec<[&'static AbilitySlot; 4]>;

#[derive(Debug, Clone)]
pub struct AbilityScheduler {
    tuning: AbilityTuning,
}

impl AbilityScheduler {
    #[must_use]
    pub const fn new(tuning: AbilityTuning) -> Self {
        Self { tuning }
    }

    #[must_use]
    pub const fn tuning(&self) -> &AbilityTuning {
        &self.tuning
    }

    /// Roll the phase table; returns at most one ability.
    pub fn roll<R: Rng + ?Sized>(&self, phase: Phase, rng: &mut R) -> Option<Ability> {
        let eligible: Eligible = phase
            .abilities()
            .iter()
            .filter(|slot| rng.gen_bool(slot.chance.clamp(0.0, 1.0)))
            .collect();
        let slot = eligible.choose(rng)?;
        slot.pool.choose(rng).copied()
    }

    /// Execute one cast against the world.
    ///
    /// # Errors
    ///
    /// Returns an [`AbilityError`] when the cast has no valid target, needs a
    /// standing anchor, cannot find the boss, or the host refuses the effect.
    /// Callers log it and move on; the tick never aborts on it.
    pub fn execute<R: Rng + ?Sized>(
        &self,
        ability: Ability,
        ctx: &CastContext<'_>,
        arena: &dyn Arena,
        effects: &dyn EffectsPlayer,
        rng: &mut R,
    ) -> Result<AbilityOutcome, AbilityError> {
        let tuning = &self.tuning;
        let (outcome, at) = match ability {
            Ability::RegenNearAnchor => {
                let anchor = ctx
                    .live_anchors
                    .choose(rng)
                    .copied()
                    .ok_or(AbilityError::NoAnchor { ability })?;
                let health = arena
                    .boss_health(ctx.boss)
                    .ok_or(AbilityError::BossUnavailable { ability })?;
                let amount = health.max * tuning.anchor_regen_fraction;
                if !arena.heal_boss(ctx.boss, amount) {
                    return Err(AbilityError::EffectRejected { ability });
                }
                (AbilityOutcome::Healed { amount }, Some(anchor))
            }
            Ability::AnchorBeam => {
                let anchor = ctx
                    .live_anchors
                    .choose(rng)
                    .copied()
                    .ok_or(AbilityError::NoAnchor { ability })?;
                let target = pick_target(ability, ctx, arena, rng)?;
                let damage = tuning.anchor_beam_damage * ctx.damage_multiplier;
                strike(ability, arena, &[target], damage)?;
                (
                    AbilityOutcome::Struck {
                        targets: vec![target],
                        damage,
                    },
                    Some(anchor),
                )
            }
            Ability::AreaBarrage => {
                let targets = present_targets(ctx, arena);
                if targets.is_empty() {
                    return Err(AbilityError::NoTarget { ability });
                }
                let damage = tuning.area_barrage_damage * ctx.damage_multiplier;
                strike(ability, arena, &targets, damage)?;
                let at = arena.boss_location(ctx.boss);
                (AbilityOutcome::Struck { targets, damage }, at)
            }
            Ability::KnockbackGust => {
                let origin = arena
                    .boss_location(ctx.boss)
                    .ok_or(AbilityError::BossUnavailable { ability })?;
                let target = pick_target(ability, ctx, arena, rng)?;
                let damage = tuning.knockback_gust_damage * ctx.damage_multiplier;
                strike(ability, arena, &[target], damage)?;
                if !arena.knock_back(target, origin, tuning.knockback_gust_strength) {
                    return Err(AbilityError::EffectRejected { ability });
                }
                (
                    AbilityOutcome::Struck {
                        targets: vec![target],
                        damage,
                    },
                    Some(origin),
                )
            }
            Ability::MeleeSweep => {
                let origin = arena
                    .boss_location(ctx.boss)
                    .ok_or(AbilityError::BossUnavailable { ability })?;
                let targets = within(ctx, arena, origin, tuning.melee_sweep_reach);
                if targets.is_empty() {
                    return Err(AbilityError::NoTarget { ability });
                }
                let damage = tuning.melee_sweep_damage * ctx.damage_multiplier;
                strike(ability, arena, &targets, damage)?;
                for target in &targets {
                    if !arena.knock_back(*target, origin, tuning.melee_sweep_strength) {
                        warn!("{ability}: knockback on {target} was rejected");
                    }
                }
                (AbilityOutcome::Struck { targets, damage }, Some(origin))
            }
            Ability::LingeringBreath => {
                let target = pick_target(ability, ctx, arena, rng)?;
                let center = arena
                    .participant_location(target)
                    .ok_or(AbilityError::NoTarget { ability })?;
                let zone = LingeringZone {
                    center,
                    radius: tuning.breath_radius,
                    damage_per_tick: tuning.breath_damage_per_tick * ctx.damage_multiplier,
                    remaining_ticks: tuning.breath_duration_ticks,
                };
                let targets = self.pulse_zone(&zone, ctx, arena);
                (AbilityOutcome::ZoneOpened { zone, targets }, Some(center))
            }
            Ability::CallBrood => {
                let near = arena
                    .boss_location(ctx.boss)
                    .ok_or(AbilityError::BossUnavailable { ability })?;
                let count = tuning
                    .call_brood_base
                    .saturating_add(crate::numbers::usize_to_u32(ctx.participants.len()) / 2);
                (AbilityOutcome::SummonRequested { count, near }, Some(near))
            }
            Ability::FearRoar => {
                let targets = present_targets(ctx, arena);
                if targets.is_empty() {
                    return Err(AbilityError::NoTarget { ability });
                }
                let duration = Duration::from_secs(tuning.fear_roar_duration_secs);
                let feared: Vec<ParticipantId> = targets
                    .into_iter()
                    .filter(|id| arena.apply_status(*id, StatusEffect::Fear, duration))
                    .collect();
                if feared.is_empty() {
                    return Err(AbilityError::EffectRejected { ability });
                }
                let at = arena.boss_location(ctx.boss);
                (AbilityOutcome::Feared { targets: feared }, at)
            }
        };
        effects.play(EffectCue::AbilityCast {
            ability,
            phase: ctx.phase,
            at,
        });
        Ok(outcome)
    }

    /// Damage every present participant inside `zone`; returns who was hit.
    #[must_use]
    pub fn pulse_zone(
        &self,
        zone: &LingeringZone,
        ctx: &CastContext<'_>,
        arena: &dyn Arena,
    ) -> Vec<ParticipantId> {
        within(ctx, arena, zone.center, zone.radius)
            .into_iter()
            .filter(|id| arena.damage_participant(*id, zone.damage_per_tick))
            .collect()
    }
}

fn present_targets(ctx: &CastContext<'_>, arena: &dyn Arena) -> Vec<ParticipantId> {
    ctx.participants
        .iter()
        .map(|p| p.id)
        .filter(|id| arena.presence(*id).is_present())
        .collect()
}

fn within(
    ctx: &CastContext<'_>,
    arena: &dyn Arena,
    origin: Location,
    radius: f64,
) -> Vec<ParticipantId> {
    present_targets(ctx, arena)
        .into_iter()
        .filter(|id| {
            arena
                .participant_location(*id)
                .is_some_and(|loc| loc.distance_to(&origin) <= radius)
        })
        .collect()
}

fn pick_target<R: Rng + ?Sized>(
    ability: Ability,
    ctx: &CastContext<'_>,
    arena: &dyn Arena,
    rng: &mut R,
) -> Result<ParticipantId, AbilityError> {
    present_targets(ctx, arena)
        .choose(rng)
        .copied()
        .ok_or(AbilityError::NoTarget { ability })
}

fn strike(
    ability: Ability,
    arena: &dyn Arena,
    targets: &[ParticipantId],
    damage: f64,
) -> Result<(), AbilityError> {
    let landed = targets
        .iter()
        .filter(|id| arena.damage_participant(**id, damage))
        .count();
    if landed == 0 {
        return Err(AbilityError::EffectRejected { ability });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{BossHealth, Presence};
    use crate::memory::{MemoryArena, RecordingEffects};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    const BOSS: BossId = BossId(7);

    fn fixture() -> (MemoryArena, Vec<Participant>) {
        let arena = MemoryArena::new();
        arena.add_boss(BOSS, BossHealth::full(400.0), Location::new(0.0, 0.0, 0.0));
        let participants: Vec<Participant> = (1..=3)
            .map(|id| Participant::new(id, format!("p{id}")))
            .collect();
        for (offset, p) in participants.iter().enumerate() {
            let x = 2.0 + 3.0 * crate::numbers::usize_to_f64(offset);
            arena.add_participant(p.id, Location::new(x, 0.0, 0.0));
        }
        (arena, participants)
    }

    fn ctx<'a>(
        phase: Phase,
        participants: &'a [Participant],
        anchors: &'a [Location],
    ) -> CastContext<'a> {
        CastContext {
            boss: BOSS,
            phase,
            participants,
            live_anchors: anchors,
            damage_multiplier: 1.5,
        }
    }

    #[test]
    fn every_phase_table_is_well_formed() {
        for phase in Phase::ALL {
            let table = catalog(phase);
            assert!(!table.is_empty(), "{phase} has no abilities");
            for slot in table {
                assert!((0.0..=1.0).contains(&slot.chance));
                assert!(!slot.pool.is_empty());
            }
        }
        let enraged = catalog(Phase::Enraged);
        assert!((enraged[0].chance - 0.25).abs() < f64::EPSILON);
        assert!(enraged[0].pool.contains(&Ability::MeleeSweep));
        assert_eq!(enraged[1].pool, &[Ability::FearRoar]);
    }

    #[test]
    fn roll_fires_at_most_one_phase_ability() {
        let scheduler = AbilityScheduler::new(AbilityTuning::default());
        let mut rng = SmallRng::seed_from_u64(11);
        let mut fired = 0;
        for _ in 0..2_000 {
            if let Some(ability) = scheduler.roll(Phase::Aerial, &mut rng) {
                assert!(matches!(ability, Ability::AreaBarrage | Ability::KnockbackGust));
                fired += 1;
            }
        }
        assert!(fired > 0);
        assert!(fired < 2_000);
    }

    #[test]
    fn beam_applies_damage_multiplier() {
        let (arena, participants) = fixture();
        let effects = RecordingEffects::default();
        let scheduler = AbilityScheduler::new(AbilityTuning::default());
        let anchors = [Location::new(20.0, 0.0, 0.0)];
        let mut rng = SmallRng::seed_from_u64(3);
        let outcome = scheduler
            .execute(
                Ability::AnchorBeam,
                &ctx(Phase::Crystal, &participants, &anchors),
                &arena,
                &effects,
                &mut rng,
            )
            .expect("beam lands");
        let AbilityOutcome::Struck { targets, damage } = outcome else {
            panic!("unexpected outcome {outcome:?}");
        };
        assert_eq!(targets.len(), 1);
        assert!((damage - 9.0).abs() < f64::EPSILON);
        assert!((arena.damage_taken(targets[0]) - 9.0).abs() < f64::EPSILON);
        assert_eq!(effects.cues().len(), 1);
    }

    #[test]
    fn missing_targets_and_anchors_fizzle_without_effects() {
        let (arena, participants) = fixture();
        let effects = RecordingEffects::default();
        let scheduler = AbilityScheduler::new(AbilityTuning::default());
        let mut rng = SmallRng::seed_from_u64(5);

        let err = scheduler
            .execute(
                Ability::RegenNearAnchor,
                &ctx(Phase::Crystal, &participants, &[]),
                &arena,
                &effects,
                &mut rng,
            )
            .unwrap_err();
        assert_eq!(err, AbilityError::NoAnchor { ability: Ability::RegenNearAnchor });

        for p in &participants {
            arena.set_presence(p.id, Presence::Offline);
        }
        let err = scheduler
            .execute(
                Ability::AreaBarrage,
                &ctx(Phase::Aerial, &participants, &[]),
                &arena,
                &effects,
                &mut rng,
            )
            .unwrap_err();
        assert_eq!(err, AbilityError::NoTarget { ability: Ability::AreaBarrage });
        assert!(effects.cues().is_empty());
    }

    #[test]
    fn sweep_only_reaches_nearby_participants() {
        let (arena, participants) = fixture();
        let effects = RecordingEffects::default();
        let scheduler = AbilityScheduler::new(AbilityTuning::default());
        let mut rng = SmallRng::seed_from_u64(8);
        let outcome = scheduler
            .execute(
                Ability::MeleeSweep,
                &ctx(Phase::Ground, &participants, &[]),
                &arena,
                &effects,
                &mut rng,
            )
            .expect("sweep lands");
        // Participants stand at x = 2, 5, 8; reach is 8.
        let AbilityOutcome::Struck { targets, .. } = outcome else {
            panic!("unexpected outcome {outcome:?}");
        };
        assert_eq!(targets.len(), 3);
        assert_eq!(arena.knockbacks(), 3);
    }

    #[test]
    fn sweep_still_lands_when_knockback_is_resisted() {
        let (arena, participants) = fixture();
        arena.set_resist_knockback(true);
        let effects = RecordingEffects::default();
        let scheduler = AbilityScheduler::new(AbilityTuning::default());
        let mut rng = SmallRng::seed_from_u64(8);
        let outcome = scheduler
            .execute(
                Ability::MeleeSweep,
                &ctx(Phase::Ground, &participants, &[]),
                &arena,
                &effects,
                &mut rng,
            )
            .expect("sweep lands");
        assert!(matches!(outcome, AbilityOutcome::Struck { ref targets, .. } if targets.len() == 3));
        assert_eq!(arena.knockbacks(), 0);
        assert!(arena.damage_taken(participants[0].id) > 0.0);
        assert_eq!(effects.cues().len(), 1);
    }

    #[test]
    fn regen_heals_boss_near_anchor() {
        let (arena, participants) = fixture();
        arena.set_boss_fraction(BOSS, 0.5);
        let effects = RecordingEffects::default();
        let scheduler = AbilityScheduler::new(AbilityTuning::default());
        let anchors = [Location::new(20.0, 0.0, 0.0)];
        let mut rng = SmallRng::seed_from_u64(1);
        let outcome = scheduler
            .execute(
                Ability::RegenNearAnchor,
                &ctx(Phase::Crystal, &participants, &anchors),
                &arena,
                &effects,
                &mut rng,
            )
            .expect("regen");
        assert_eq!(outcome, AbilityOutcome::Healed { amount: 8.0 });
        let health = arena.boss_health(BOSS).expect("boss");
        assert!((health.current - 208.0).abs() < 1e-9);
    }

    #[test]
    fn breath_opens_zone_and_pulses_once() {
        let (arena, participants) = fixture();
        let effects = RecordingEffects::default();
        let scheduler = AbilityScheduler::new(AbilityTuning::default());
        let mut rng = SmallRng::seed_from_u64(21);
        let outcome = scheduler
            .execute(
                Ability::LingeringBreath,
                &ctx(Phase::Ground, &participants, &[]),
                &arena,
                &effects,
                &mut rng,
            )
            .expect("breath");
        let AbilityOutcome::ZoneOpened { zone, targets } = outcome else {
            panic!("unexpected outcome {outcome:?}");
        };
        assert_eq!(zone.remaining_ticks, BREATH_DURATION_TICKS);
        assert!((zone.damage_per_tick - 4.5).abs() < f64::EPSILON);
        assert!(!targets.is_empty());
    }

    #[test]
    fn fear_roar_applies_status_to_everyone_present() {
        let (arena, participants) = fixture();
        arena.set_presence(participants[0].id, Presence::Dead);
        let effects = RecordingEffects::default();
        let scheduler = AbilityScheduler::new(AbilityTuning::default());
        let mut rng = SmallRng::seed_from_u64(2);
        let outcome = scheduler
            .execute(
                Ability::FearRoar,
                &ctx(Phase::Enraged, &participants, &[]),
                &arena,
                &effects,
                &mut rng,
            )
            .expect("roar");
        assert_eq!(
            outcome,
            AbilityOutcome::Feared {
                targets: vec![participants[1].id, participants[2].id]
            }
        );
    }
}
