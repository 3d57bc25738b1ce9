use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use wyrmfall_game::memory::MemoryHost;
use wyrmfall_game::{
    Arena, BossHealth, BossId, CombatRequest, EncounterConfig, EncounterOutcome, EncounterSession,
    FailureCause, Location, ManualScheduler, MinionKind, Participant, Phase, Presence,
    ScalingCalculator, start_combat,
};

const BOSS: BossId = BossId(1);
const ARENA_CENTER: Location = Location::new(0.0, 64.0, 0.0);
const PARTICIPANT_RING: f64 = 8.0;

/// Knobs for the simulated raid group.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SimulationPlan {
    pub participants: usize,
    pub boss_health: f64,
    /// Explicit multipliers; the group-size recommendation is used when unset.
    pub health_multiplier: Option<f64>,
    pub damage_multiplier: Option<f64>,
    /// Chance per tick that a present participant lands a hit.
    pub hit_chance: f64,
    pub damage_per_hit: f64,
    /// Chance per tick that a present participant disconnects for good.
    pub dropout_chance: f64,
    /// Chance per tick that the group shatters one standing anchor crystal.
    pub anchor_break_chance: f64,
    pub max_ticks: u64,
}

impl Default for SimulationPlan {
    fn default() -> Self {
        Self {
            participants: 4,
            boss_health: 200.0,
            health_multiplier: None,
            damage_multiplier: None,
            hit_chance: 0.6,
            damage_per_hit: 2.0,
            dropout_chance: 0.0,
            anchor_break_chance: 0.05,
            max_ticks: 1_200,
        }
    }
}

/// What one simulated fight produced, plus any broken expectations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncounterRecord {
    pub seed: u64,
    pub outcome: String,
    pub final_phase: Phase,
    pub phase_transitions: u32,
    pub enraged: bool,
    pub ticks: u64,
    pub duration_secs: u64,
    pub participants_left: usize,
    pub reward_total: u64,
    pub minions_spawned: usize,
    pub minions_slain: usize,
    pub violations: Vec<String>,
}

impl EncounterRecord {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    #[must_use]
    pub fn is_victory(&self) -> bool {
        self.outcome == "victory"
    }
}

#[must_use]
pub fn outcome_label(outcome: Option<&EncounterOutcome>) -> &'static str {
    match outcome {
        Some(EncounterOutcome::Victory { .. }) => "victory",
        Some(EncounterOutcome::Failure {
            cause: FailureCause::ParticipantsLost,
        }) => "wiped",
        Some(EncounterOutcome::Failure {
            cause: FailureCause::BossLost,
        }) => "boss-lost",
        Some(EncounterOutcome::Cancelled) => "cancelled",
        None => "unfinished",
    }
}

/// Deterministic headless fight: the encounter runs on a manual scheduler
/// while a seeded world rng decides who hits, who leaves and which crystals break.
pub struct SimulationSession {
    plan: SimulationPlan,
    config: EncounterConfig,
    verbose: bool,
}

impl SimulationSession {
    #[must_use]
    pub const fn new(plan: SimulationPlan, config: EncounterConfig, verbose: bool) -> Self {
        Self {
            plan,
            config,
            verbose,
        }
    }

    pub fn run(&self, seed: u64) -> anyhow::Result<EncounterRecord> {
        let plan = self.plan;
        let host = MemoryHost::new();
        host.arena
            .add_boss(BOSS, BossHealth::full(plan.boss_health), ARENA_CENTER);
        let roster: Vec<Participant> = (1..=u64::try_from(plan.participants)?)
            .map(|id| Participant::new(id, format!("raider-{id}")))
            .collect();
        host.arena
            .add_participants(&roster, ARENA_CENTER, PARTICIPANT_RING);

        let recommended =
            ScalingCalculator::recommended_multipliers(roster.len(), &self.config.scaling);
        let request = CombatRequest::new(
            BOSS,
            roster.clone(),
            plan.health_multiplier.unwrap_or(recommended.health),
            plan.damage_multiplier.unwrap_or(recommended.damage),
        )
        .with_seed(seed);

        let mut scheduler = ManualScheduler::with_clock(host.clock.clone());
        let handle = start_combat(&mut scheduler, host.services(), self.config.clone(), request)?;
        let interval = self.config.tick_interval();
        let mut world = ChaCha8Rng::seed_from_u64(seed);
        let mut violations = Vec::new();
        let mut last_phase = handle.phase();
        let mut was_enraged = false;

        for _ in 0..plan.max_ticks {
            if handle.is_finished() {
                break;
            }
            self.drive_world(&host, &roster, &mut world);
            scheduler.advance(interval);

            let phase = handle.phase();
            if phase < last_phase {
                violations.push(format!("phase regressed from {last_phase} to {phase}"));
            }
            last_phase = phase;
            if let Some(enraged) = handle.with_session(EncounterSession::is_enraged) {
                if was_enraged && !enraged {
                    violations.push("enrage flag cleared mid-fight".to_string());
                }
                was_enraged = enraged;
            }
        }

        if !handle.is_finished() {
            handle.cancel();
        }
        let summary = handle.summary();
        let outcome = summary.as_ref().map(|s| &s.outcome);
        let grants = host.rewards.grants();
        let victory = outcome.is_some_and(EncounterOutcome::is_victory);
        if victory == grants.is_empty() {
            violations.push(format!(
                "{} grants for a {} outcome",
                grants.len(),
                outcome_label(outcome)
            ));
        }
        if host.arena.living_minions() > 0 {
            violations.push(format!(
                "{} minions left standing after teardown",
                host.arena.living_minions()
            ));
        }
        if scheduler.active_tasks() > 0 {
            violations.push("tick task still scheduled after teardown".to_string());
        }

        let record = EncounterRecord {
            seed,
            outcome: outcome_label(outcome).to_string(),
            final_phase: handle.phase(),
            phase_transitions: summary.as_ref().map_or(0, |s| s.phase_transitions),
            enraged: summary.as_ref().is_some_and(|s| s.enraged),
            ticks: summary.as_ref().map_or(0, |s| s.ticks),
            duration_secs: summary.as_ref().map_or(0, |s| s.duration_secs),
            participants_left: roster
                .iter()
                .filter(|p| host.arena.presence(p.id).is_present())
                .count(),
            reward_total: grants.iter().map(|g| u64::from(g.amount)).sum(),
            minions_spawned: summary.as_ref().map_or(0, |s| s.minions_spawned),
            minions_slain: summary.as_ref().map_or(0, |s| s.minions_slain),
            violations,
        };
        if self.verbose {
            log::info!(
                "seed {seed}: {} in {} phase after {} ticks",
                record.outcome,
                record.final_phase,
                record.ticks
            );
        }
        Ok(record)
    }

    fn drive_world(&self, host: &MemoryHost, roster: &[Participant], world: &mut ChaCha8Rng) {
        let plan = &self.plan;
        for participant in roster {
            if !host.arena.presence(participant.id).is_present() {
                continue;
            }
            if world.gen_bool(plan.dropout_chance.clamp(0.0, 1.0)) {
                host.arena.set_presence(participant.id, Presence::Offline);
                continue;
            }
            if world.gen_bool(plan.hit_chance.clamp(0.0, 1.0)) {
                host.arena.damage_boss(BOSS, plan.damage_per_hit);
                host.arena.record_hit(BOSS, participant.id);
            }
        }
        if world.gen_bool(plan.anchor_break_chance.clamp(0.0, 1.0))
            && let Some(anchor) = host
                .arena
                .living_of_kind(MinionKind::AnchorCrystal)
                .first()
                .copied()
        {
            host.arena.slay(anchor);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_fight() {
        let session = SimulationSession::new(
            SimulationPlan::default(),
            EncounterConfig::default(),
            false,
        );
        let a = session.run(77).expect("run");
        let b = session.run(77).expect("run");
        assert_eq!(a.outcome, b.outcome);
        assert_eq!(a.ticks, b.ticks);
        assert_eq!(a.reward_total, b.reward_total);
        assert!(a.passed(), "{:?}", a.violations);
    }

    #[test]
    fn idle_group_hits_enrage_and_stalls() {
        let plan = SimulationPlan {
            hit_chance: 0.0,
            anchor_break_chance: 0.0,
            max_ticks: 650,
            ..SimulationPlan::default()
        };
        let record = SimulationSession::new(plan, EncounterConfig::default(), false)
            .run(3)
            .expect("run");
        assert_eq!(record.outcome, "cancelled");
        assert_eq!(record.final_phase, Phase::Enraged);
        assert!(record.enraged);
        assert_eq!(record.reward_total, 0);
        assert!(record.passed(), "{:?}", record.violations);
    }

    #[test]
    fn everyone_leaving_is_a_wipe() {
        let plan = SimulationPlan {
            dropout_chance: 1.0,
            ..SimulationPlan::default()
        };
        let record = SimulationSession::new(plan, EncounterConfig::default(), false)
            .run(9)
            .expect("run");
        assert_eq!(record.outcome, "wiped");
        assert_eq!(record.ticks, 1);
        assert_eq!(record.participants_left, 0);
        assert!(record.passed());
    }
}
