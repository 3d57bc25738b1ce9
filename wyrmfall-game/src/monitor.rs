//! The combat monitor: owns the session and runs the tick loop.
//!
//! Each tick runs to completion in a fixed order:
//!
//! 1. liveness: a dead boss is a victory, a vanished boss a failure;
//! 2. participant pruning, then hit bookkeeping;
//! 3. minion sweep, then at most one transition: the enrage timeout is
//!    checked first and the health/anchor trigger only when it did not fire;
//! 4. lingering zones, then at most one ability.
//!
//! The monitor is the only code that mutates an [`EncounterSession`]. Every
//! other component reads the session and hands back a decision.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use std::time::Duration;

use log::{debug, info, warn};
use serde_json::json;
use thiserror::Error;

use crate::ability::{Ability, AbilityOutcome, AbilityScheduler, CastContext};
use crate::config::{EncounterConfig, EncounterConfigError};
use crate::events::EventKind;
use crate::host::{
    Arena, BossHealth, BossId, Broadcaster, EffectCue, EffectsPlayer, MinionKind, Participant,
    RewardContext, RewardGranter,
};
use crate::minions::{MinionLifecycleManager, MinionStatus};
use crate::phase::{Phase, PhaseCleanup, PhaseController, PhaseTransition};
use crate::reward::RewardCalculator;
use crate::rng::EncounterRng;
use crate::scaling::{ScalingCalculator, ScalingInput};
use crate::scheduler::{CancelHandle, Clock, Scheduler, TickControl};
use crate::session::{EncounterOutcome, EncounterSession, EncounterSummary, FailureCause};

/// Collaborators injected into a monitor.
#[derive(Clone)]
pub struct HostServices {
    pub arena: Rc<dyn Arena>,
    pub broadcaster: Rc<dyn Broadcaster>,
    pub rewards: Rc<dyn RewardGranter>,
    pub effects: Rc<dyn EffectsPlayer>,
    pub clock: Rc<dyn Clock>,
}

/// Arguments of a combat start request.
#[derive(Debug, Clone, PartialEq)]
pub struct CombatRequest {
    pub boss: BossId,
    pub participants: Vec<Participant>,
    pub health_multiplier: f64,
    pub damage_multiplier: f64,
    /// Seed for every probabilistic draw in the fight.
    pub seed: u64,
}

impl CombatRequest {
    #[must_use]
    pub const fn new(
        boss: BossId,
        participants: Vec<Participant>,
        health_multiplier: f64,
        damage_multiplier: f64,
    ) -> Self {
        Self {
            boss,
            participants,
            health_multiplier,
            damage_multiplier,
            seed: 0,
        }
    }

    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Reasons a fight could not start. Nothing is left behind when one is returned.
#[derive(Debug, Error, PartialEq)]
pub enum SetupError {
    #[error("{0} does not resolve to a living boss")]
    InvalidBoss(BossId),
    #[error("an encounter needs at least one participant")]
    NoParticipants,
    #[error("{name} multiplier must be positive and finite (got {value})")]
    InvalidMultiplier { name: &'static str, value: f64 },
    #[error("{0} is already engaged")]
    AlreadyEngaged(BossId),
    #[error(transparent)]
    Config(#[from] EncounterConfigError),
}

/// Result of a single tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickStatus {
    Running,
    Finished(EncounterOutcome),
}

pub struct CombatMonitor {
    boss: BossId,
    host: HostServices,
    phases: PhaseController,
    abilities: AbilityScheduler,
    minions: MinionLifecycleManager,
    rewards: RewardCalculator,
    rng: EncounterRng,
    session: Option<EncounterSession>,
    summary: Option<EncounterSummary>,
}

impl CombatMonitor {
    /// Validate the request, scale the boss and enter the opening phase.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError`] when the configuration is invalid, a multiplier
    /// is not positive, no participant was supplied, or the boss is missing
    /// or already dead.
    pub fn begin(
        host: HostServices,
        config: EncounterConfig,
        request: CombatRequest,
    ) -> Result<Self, SetupError> {
        config.validate()?;
        for (name, value) in [
            ("health", request.health_multiplier),
            ("damage", request.damage_multiplier),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(SetupError::InvalidMultiplier { name, value });
            }
        }
        let mut seen = HashSet::new();
        let participants: Vec<Participant> = request
            .participants
            .into_iter()
            .filter(|p| seen.insert(p.id))
            .collect();
        if participants.is_empty() {
            return Err(SetupError::NoParticipants);
        }

        let boss = request.boss;
        let health = host
            .arena
            .boss_health(boss)
            .filter(|h| !h.is_depleted())
            .ok_or(SetupError::InvalidBoss(boss))?;
        let stats = ScalingCalculator::apply(ScalingInput {
            base_health: health.max,
            health_multiplier: request.health_multiplier,
            damage_multiplier: request.damage_multiplier,
            participant_count: participants.len(),
        });
        if !host
            .arena
            .set_boss_health(boss, BossHealth::full(stats.max_health))
        {
            return Err(SetupError::InvalidBoss(boss));
        }

        info!(
            "{boss} engaged by {} participants (health x{}, damage x{})",
            participants.len(),
            request.health_multiplier,
            request.damage_multiplier
        );
        let session = EncounterSession::new(
            boss,
            participants,
            host.clock.now(),
            request.health_multiplier,
            &stats,
        );
        let mut monitor = Self {
            boss,
            phases: PhaseController::new(config.thresholds, config.enrage_after()),
            abilities: AbilityScheduler::new(config.abilities),
            minions: MinionLifecycleManager::new(config.spawn),
            rewards: RewardCalculator::new(config.rewards),
            rng: EncounterRng::from_seed(request.seed),
            host,
            session: Some(session),
            summary: None,
        };
        monitor.enter_phase(Phase::Crystal);
        Ok(monitor)
    }

    #[must_use]
    pub const fn boss(&self) -> BossId {
        self.boss
    }

    /// Live session; `None` once the fight has been torn down.
    #[must_use]
    pub const fn session(&self) -> Option<&EncounterSession> {
        self.session.as_ref()
    }

    #[must_use]
    pub const fn summary(&self) -> Option<&EncounterSummary> {
        self.summary.as_ref()
    }

    #[must_use]
    pub fn outcome(&self) -> Option<EncounterOutcome> {
        self.summary.as_ref().map(|s| s.outcome.clone())
    }

    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.session.is_none()
    }

    /// Current phase, or the final one after teardown.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.session.as_ref().map_or_else(
            || self.summary.as_ref().map_or(Phase::Crystal, |s| s.final_phase),
            EncounterSession::phase,
        )
    }

    /// Run one tick.
    pub fn tick(&mut self) -> TickStatus {
        if let Some(summary) = &self.summary {
            return TickStatus::Finished(summary.outcome.clone());
        }
        let now = self.host.clock.now();
        let Some(session) = self.session.as_mut() else {
            return TickStatus::Finished(EncounterOutcome::Cancelled);
        };
        session.begin_tick(now.saturating_sub(session.started_at()));

        let fraction = match self.host.arena.boss_health(self.boss) {
            None => {
                warn!("{} no longer resolves; ending the encounter", self.boss);
                return self.finish_failure(FailureCause::BossLost);
            }
            Some(health) if health.is_depleted() => return self.finish_victory(),
            Some(health) => health.fraction(),
        };

        if self.prune_participants() == 0 {
            return self.finish_failure(FailureCause::ParticipantsLost);
        }

        self.phase_step(fraction);
        self.ability_step();
        TickStatus::Running
    }

    /// Tear the fight down from outside. No reward is granted and nothing is
    /// announced. Returns `false` if the fight had already ended.
    pub fn cancel(&mut self) -> bool {
        if self.session.is_none() {
            return false;
        }
        info!("{} encounter cancelled", self.boss);
        self.finalize(EncounterOutcome::Cancelled);
        true
    }

    /// Drops absent participants and records this tick's hits. Returns how
    /// many participants remain engaged.
    fn prune_participants(&mut self) -> usize {
        let Some(session) = self.session.as_mut() else {
            return 0;
        };
        let arena = self.host.arena.as_ref();
        let pruned = session.prune(|p| arena.presence(p.id).is_present());
        if !pruned.is_empty() {
            let ids: Vec<_> = pruned.iter().map(|p| p.id).collect();
            let remaining = session.participants().len();
            debug!("{}: pruned {ids:?}, {remaining} remain", self.boss);
            session.push_event(
                EventKind::ParticipantsPruned,
                json!({ "participants": ids, "remaining": remaining }),
            );
        }
        let hits = arena.drain_hits(self.boss);
        session.record_hits(&hits);
        session.participants().len()
    }

    fn phase_step(&mut self, fraction: f64) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let arena = self.host.arena.as_ref();
        let fallen = self.minions.sweep_fallen(session.minions(), arena);
        if !fallen.is_empty() {
            debug!("{}: {} minions fell", self.boss, fallen.len());
            session.mark_minions(&fallen, MinionStatus::Slain);
        }
        let transition = self
            .phases
            .check_enrage_timeout(session.phase(), session.elapsed())
            .or_else(|| {
                let anchors_cleared = self.minions.anchors_cleared(session.minions());
                self.phases
                    .evaluate(session.phase(), fraction, anchors_cleared)
            });
        if let Some(transition) = transition {
            self.apply_transition(transition);
        }
    }

    fn apply_transition(&mut self, transition: PhaseTransition) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if transition.to <= session.phase() {
            return;
        }
        let arena = self.host.arena.as_ref();
        if let PhaseCleanup::RetireMinions(kind) = transition.from.exit_cleanup() {
            let retired = self
                .minions
                .retire_where(session.minions(), arena, |r| r.kind == kind);
            if !retired.is_empty() {
                session.mark_minions(&retired, MinionStatus::Retired);
                session.push_event(
                    EventKind::MinionsRetired,
                    json!({ "phase": transition.from, "kind": kind, "count": retired.len() }),
                );
            }
        }
        session.advance_phase(transition.to);
        info!(
            "{} moved {} -> {} ({:?})",
            self.boss, transition.from, transition.to, transition.cause
        );
        session.push_event(
            EventKind::PhaseChanged,
            json!({ "from": transition.from, "to": transition.to, "cause": transition.cause }),
        );
        if transition.to == Phase::Enraged {
            session.push_event(EventKind::Enraged, json!({ "cause": transition.cause }));
        }
        self.enter_phase(transition.to);
        self.host
            .broadcaster
            .announce_phase_transition(transition.to.display_name());
    }

    /// Entry hook: boss modifier, spawn wave, effects cue.
    fn enter_phase(&mut self, phase: Phase) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let arena = self.host.arena.as_ref();
        arena.apply_boss_modifier(self.boss, phase.entry_modifier());
        let wave =
            self.minions
                .spawn_for_phase(phase, self.boss, session.participants().len(), arena);
        session.push_event(
            EventKind::MinionsSpawned,
            json!({
                "phase": phase,
                "kind": phase.minion_kind(),
                "requested": wave.requested,
                "spawned": wave.records.len(),
            }),
        );
        if phase == Phase::Crystal {
            session.set_anchors(wave.sites);
        }
        session.push_minions(wave.records);
        self.host.effects.play(EffectCue::PhaseEntered { phase });
    }

    fn ability_step(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let arena = self.host.arena.as_ref();
        let phase = session.phase();
        let participants = session.participants().to_vec();
        let live_anchors = self.minions.live_anchor_sites(session.minions());
        let ctx = CastContext {
            boss: self.boss,
            phase,
            participants: &participants,
            live_anchors: &live_anchors,
            damage_multiplier: session.damage_multiplier(),
        };

        for zone in session.zones() {
            let struck = self.abilities.pulse_zone(zone, &ctx, arena);
            if !struck.is_empty() {
                debug!("{}: lingering zone struck {struck:?}", self.boss);
            }
        }
        session.decay_zones();

        let rolled = self.abilities.roll(phase, &mut *self.rng.abilities());
        if let Some(ability) = rolled {
            self.cast(ability);
        }
    }

    /// Resolve one ability against the live session and record the result.
    fn cast(&mut self, ability: Ability) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let arena = self.host.arena.as_ref();
        let phase = session.phase();
        let participants = session.participants().to_vec();
        let live_anchors = self.minions.live_anchor_sites(session.minions());
        let ctx = CastContext {
            boss: self.boss,
            phase,
            participants: &participants,
            live_anchors: &live_anchors,
            damage_multiplier: session.damage_multiplier(),
        };
        let cast = self.abilities.execute(
            ability,
            &ctx,
            arena,
            self.host.effects.as_ref(),
            &mut *self.rng.targeting(),
        );
        match cast {
            Ok(outcome) => {
                session.push_event(
                    EventKind::AbilityCast,
                    json!({ "ability": ability, "phase": phase, "effect": &outcome }),
                );
                match outcome {
                    AbilityOutcome::ZoneOpened { zone, .. } => session.open_zone(zone),
                    AbilityOutcome::SummonRequested { count, near } => {
                        let spawned = MinionLifecycleManager::spawn_around(
                            phase,
                            MinionKind::Ravager,
                            count,
                            near,
                            arena,
                        );
                        session.push_event(
                            EventKind::MinionsSpawned,
                            json!({
                                "phase": phase,
                                "kind": MinionKind::Ravager,
                                "requested": count,
                                "spawned": spawned.len(),
                            }),
                        );
                        session.push_minions(spawned);
                    }
                    AbilityOutcome::Struck { .. }
                    | AbilityOutcome::Healed { .. }
                    | AbilityOutcome::Feared { .. } => {}
                }
            }
            Err(err) => {
                debug!("{}: {err}", self.boss);
                session.push_event(
                    EventKind::AbilityFizzled,
                    json!({ "ability": ability, "phase": phase, "reason": err.to_string() }),
                );
            }
        }
    }

    fn finish_victory(&mut self) -> TickStatus {
        let Some(session) = self.session.as_ref() else {
            return TickStatus::Finished(EncounterOutcome::Cancelled);
        };
        let arena = self.host.arena.as_ref();
        let top = RewardCalculator::top_contributor(session.roster(), session.contributions());
        let amount = self.rewards.amount(session.phase_transitions());
        let context = RewardContext {
            boss: self.boss,
            phase_transitions: session.phase_transitions(),
            top_contributor: top,
            duration_secs: session.elapsed().as_secs(),
        };
        let mut rewarded = 0;
        for participant in session.participants() {
            if arena.presence(participant.id).is_present() {
                self.host.rewards.grant_reward(participant, amount, &context);
                rewarded += 1;
            }
        }
        let top_name = top
            .and_then(|id| session.roster().iter().find(|p| p.id == id))
            .map(|p| p.name.clone());
        self.host.broadcaster.announce_victory(top_name.as_deref());
        self.host.effects.play(EffectCue::Victory);
        self.finalize(EncounterOutcome::Victory {
            top_contributor: top,
            reward_per_participant: amount,
            rewarded,
        })
    }

    fn finish_failure(&mut self, cause: FailureCause) -> TickStatus {
        self.host.broadcaster.announce_failure();
        self.host.effects.play(EffectCue::Failure);
        self.finalize(EncounterOutcome::Failure { cause })
    }

    /// Teardown: retire every living minion and collapse the session into
    /// its summary. The session is gone afterwards.
    fn finalize(&mut self, outcome: EncounterOutcome) -> TickStatus {
        let Some(mut session) = self.session.take() else {
            return TickStatus::Finished(outcome);
        };
        let arena = self.host.arena.as_ref();
        let retired = self
            .minions
            .retire_where(session.minions(), arena, |_| true);
        if !retired.is_empty() {
            session.mark_minions(&retired, MinionStatus::Retired);
            session.push_event(
                EventKind::MinionsRetired,
                json!({ "reason": "teardown", "count": retired.len() }),
            );
        }
        let kind = match outcome {
            EncounterOutcome::Victory { .. } => EventKind::Victory,
            EncounterOutcome::Failure { .. } => EventKind::Failure,
            EncounterOutcome::Cancelled => EventKind::Cancelled,
        };
        session.push_event(kind, serde_json::to_value(&outcome).unwrap_or_default());
        info!(
            "{} encounter finished after {} ticks in {} phase: {outcome:?}",
            self.boss,
            session.ticks(),
            session.phase()
        );
        self.summary = Some(session.into_summary(outcome.clone()));
        TickStatus::Finished(outcome)
    }
}

/// Shared handle to a scheduled encounter.
#[derive(Clone)]
pub struct EncounterHandle {
    monitor: Rc<RefCell<CombatMonitor>>,
    ticker: CancelHandle,
}

impl EncounterHandle {
    #[must_use]
    pub fn boss(&self) -> BossId {
        self.monitor.borrow().boss()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.monitor.borrow().is_finished()
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.monitor.borrow().phase()
    }

    #[must_use]
    pub fn outcome(&self) -> Option<EncounterOutcome> {
        self.monitor.borrow().outcome()
    }

    #[must_use]
    pub fn summary(&self) -> Option<EncounterSummary> {
        self.monitor.borrow().summary().cloned()
    }

    /// Run `f` against the live session, if there still is one.
    pub fn with_session<T>(&self, f: impl FnOnce(&EncounterSession) -> T) -> Option<T> {
        self.monitor.borrow().session().map(f)
    }

    /// Stop the tick loop and tear the fight down without a result.
    pub fn cancel(&self) -> bool {
        self.ticker.cancel();
        self.monitor.borrow_mut().cancel()
    }
}

/// Begin a fight and register its tick loop on `scheduler`.
///
/// # Errors
///
/// Returns [`SetupError`] when the fight cannot start; nothing is scheduled in that case.
pub fn start_combat<S: Scheduler + ?Sized>(
    scheduler: &mut S,
    host: HostServices,
    config: EncounterConfig,
    request: CombatRequest,
) -> Result<EncounterHandle, SetupError> {
    let interval: Duration = config.tick_interval();
    let monitor = Rc::new(RefCell::new(CombatMonitor::begin(host, config, request)?));
    let ticking = Rc::clone(&monitor);
    let ticker = scheduler.schedule_periodic(
        interval,
        Box::new(move || match ticking.borrow_mut().tick() {
            TickStatus::Running => TickControl::Continue,
            TickStatus::Finished(_) => TickControl::Stop,
        }),
    );
    Ok(EncounterHandle { monitor, ticker })
}
