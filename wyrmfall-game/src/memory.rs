//! In-memory host implementations.
//!
//! `MemoryArena` is a small but complete world: a boss with health and a
//! position, participants that can drift out of presence, and a registry of
//! summoned helpers. The recording collaborators capture everything the
//! encounter announces, grants or renders. Integration tests and the
//! simulation harness both drive encounters through these types.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use crate::host::{
    Arena, BossHealth, BossId, BossModifier, Broadcaster, EffectCue, EffectsPlayer, EntityHandle,
    Location, MinionKind, Participant, ParticipantId, Presence, RewardContext, RewardGranter,
    StatusEffect,
};
use crate::monitor::HostServices;
use crate::scheduler::ManualClock;

#[derive(Debug, Clone)]
struct BossEntry {
    health: BossHealth,
    location: Location,
    anchors: Vec<Location>,
    modifiers: Vec<BossModifier>,
    hits: Vec<ParticipantId>,
}

#[derive(Debug, Clone)]
struct ParticipantEntry {
    presence: Presence,
    location: Location,
    damage_taken: f64,
    statuses: Vec<(StatusEffect, Duration)>,
}

#[derive(Debug, Clone)]
struct MinionEntry {
    kind: MinionKind,
    alive: bool,
}

#[derive(Debug, Default)]
struct World {
    bosses: HashMap<BossId, BossEntry>,
    participants: HashMap<ParticipantId, ParticipantEntry>,
    minions: HashMap<EntityHandle, MinionEntry>,
    next_handle: u64,
    spawned: usize,
    removed: Vec<EntityHandle>,
    knockbacks: usize,
    refuse_spawns: bool,
    reject_effects: bool,
    resist_knockback: bool,
}

/// Single-threaded world backed by `RefCell`.
#[derive(Debug, Default)]
pub struct MemoryArena {
    world: RefCell<World>,
}

impl MemoryArena {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_boss(&self, boss: BossId, health: BossHealth, location: Location) {
        self.world.borrow_mut().bosses.insert(
            boss,
            BossEntry {
                health,
                location,
                anchors: Vec::new(),
                modifiers: Vec::new(),
                hits: Vec::new(),
            },
        );
    }

    /// Drop the boss from the world without killing it, as an unloaded chunk would.
    pub fn remove_boss(&self, boss: BossId) {
        self.world.borrow_mut().bosses.remove(&boss);
    }

    pub fn set_anchor_sites(&self, boss: BossId, sites: Vec<Location>) {
        if let Some(entry) = self.world.borrow_mut().bosses.get_mut(&boss) {
            entry.anchors = sites;
        }
    }

    /// Set current health to `fraction` of the maximum.
    pub fn set_boss_fraction(&self, boss: BossId, fraction: f64) {
        if let Some(entry) = self.world.borrow_mut().bosses.get_mut(&boss) {
            entry.health.current = entry.health.max * fraction.clamp(0.0, 1.0);
        }
    }

    pub fn damage_boss(&self, boss: BossId, amount: f64) {
        if let Some(entry) = self.world.borrow_mut().bosses.get_mut(&boss) {
            entry.health.current = (entry.health.current - amount.max(0.0)).max(0.0);
        }
    }

    pub fn kill_boss(&self, boss: BossId) {
        self.set_boss_fraction(boss, 0.0);
    }

    #[must_use]
    pub fn boss_modifiers(&self, boss: BossId) -> Vec<BossModifier> {
        self.world
            .borrow()
            .bosses
            .get(&boss)
            .map(|entry| entry.modifiers.clone())
            .unwrap_or_default()
    }

    /// Queue a hit on the boss, returned by the next `drain_hits`.
    pub fn record_hit(&self, boss: BossId, participant: ParticipantId) {
        if let Some(entry) = self.world.borrow_mut().bosses.get_mut(&boss) {
            entry.hits.push(participant);
        }
    }

    pub fn add_participant(&self, participant: ParticipantId, location: Location) {
        self.world.borrow_mut().participants.insert(
            participant,
            ParticipantEntry {
                presence: Presence::Present,
                location,
                damage_taken: 0.0,
                statuses: Vec::new(),
            },
        );
    }

    /// Register every participant in a ring around `center`.
    pub fn add_participants(&self, participants: &[Participant], center: Location, radius: f64) {
        for (slot, participant) in participants.iter().enumerate() {
            let at = center.ring_point(radius, slot, participants.len());
            self.add_participant(participant.id, at);
        }
    }

    pub fn set_presence(&self, participant: ParticipantId, presence: Presence) {
        if let Some(entry) = self.world.borrow_mut().participants.get_mut(&participant) {
            entry.presence = presence;
        }
    }

    pub fn move_participant(&self, participant: ParticipantId, to: Location) {
        if let Some(entry) = self.world.borrow_mut().participants.get_mut(&participant) {
            entry.location = to;
        }
    }

    #[must_use]
    pub fn damage_taken(&self, participant: ParticipantId) -> f64 {
        self.world
            .borrow()
            .participants
            .get(&participant)
            .map_or(0.0, |entry| entry.damage_taken)
    }

    #[must_use]
    pub fn statuses(&self, participant: ParticipantId) -> Vec<(StatusEffect, Duration)> {
        self.world
            .borrow()
            .participants
            .get(&participant)
            .map(|entry| entry.statuses.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn knockbacks(&self) -> usize {
        self.world.borrow().knockbacks
    }

    /// Kill a helper in the world, as a participant would.
    pub fn slay(&self, handle: EntityHandle) {
        if let Some(entry) = self.world.borrow_mut().minions.get_mut(&handle) {
            entry.alive = false;
        }
    }

    #[must_use]
    pub fn living_minions(&self) -> usize {
        self.world
            .borrow()
            .minions
            .values()
            .filter(|m| m.alive)
            .count()
    }

    #[must_use]
    pub fn living_of_kind(&self, kind: MinionKind) -> Vec<EntityHandle> {
        let world = self.world.borrow();
        let mut handles: Vec<EntityHandle> = world
            .minions
            .iter()
            .filter(|(_, m)| m.alive && m.kind == kind)
            .map(|(handle, _)| *handle)
            .collect();
        handles.sort();
        handles
    }

    #[must_use]
    pub fn spawned_count(&self) -> usize {
        self.world.borrow().spawned
    }

    /// Handles removed through [`Arena::remove_entity`], in removal order.
    #[must_use]
    pub fn removed_handles(&self) -> Vec<EntityHandle> {
        self.world.borrow().removed.clone()
    }

    pub fn set_refuse_spawns(&self, refuse: bool) {
        self.world.borrow_mut().refuse_spawns = refuse;
    }

    /// Make every participant-facing effect fail.
    pub fn set_reject_effects(&self, reject: bool) {
        self.world.borrow_mut().reject_effects = reject;
    }

    /// Make knockbacks fail while damage and statuses still land.
    pub fn set_resist_knockback(&self, resist: bool) {
        self.world.borrow_mut().resist_knockback = resist;
    }

    fn affect_participant(
        &self,
        participant: ParticipantId,
        apply: impl FnOnce(&mut ParticipantEntry),
    ) -> bool {
        let mut world = self.world.borrow_mut();
        if world.reject_effects {
            return false;
        }
        match world.participants.get_mut(&participant) {
            Some(entry) if entry.presence.is_present() => {
                apply(entry);
                true
            }
            _ => false,
        }
    }
}

impl Arena for MemoryArena {
    fn boss_health(&self, boss: BossId) -> Option<BossHealth> {
        self.world.borrow().bosses.get(&boss).map(|entry| entry.health)
    }

    fn set_boss_health(&self, boss: BossId, health: BossHealth) -> bool {
        match self.world.borrow_mut().bosses.get_mut(&boss) {
            Some(entry) => {
                entry.health = health;
                true
            }
            None => false,
        }
    }

    fn heal_boss(&self, boss: BossId, amount: f64) -> bool {
        match self.world.borrow_mut().bosses.get_mut(&boss) {
            Some(entry) if !entry.health.is_depleted() => {
                entry.health.current = (entry.health.current + amount).min(entry.health.max);
                true
            }
            _ => false,
        }
    }

    fn boss_location(&self, boss: BossId) -> Option<Location> {
        self.world.borrow().bosses.get(&boss).map(|entry| entry.location)
    }

    fn apply_boss_modifier(&self, boss: BossId, modifier: BossModifier) {
        if let Some(entry) = self.world.borrow_mut().bosses.get_mut(&boss) {
            entry.modifiers.push(modifier);
        }
    }

    fn anchor_sites(&self, boss: BossId) -> Vec<Location> {
        self.world
            .borrow()
            .bosses
            .get(&boss)
            .map(|entry| entry.anchors.clone())
            .unwrap_or_default()
    }

    fn presence(&self, participant: ParticipantId) -> Presence {
        self.world
            .borrow()
            .participants
            .get(&participant)
            .map_or(Presence::Offline, |entry| entry.presence)
    }

    fn participant_location(&self, participant: ParticipantId) -> Option<Location> {
        self.world
            .borrow()
            .participants
            .get(&participant)
            .map(|entry| entry.location)
    }

    fn drain_hits(&self, boss: BossId) -> Vec<ParticipantId> {
        self.world
            .borrow_mut()
            .bosses
            .get_mut(&boss)
            .map(|entry| std::mem::take(&mut entry.hits))
            .unwrap_or_default()
    }

    fn spawn_minion(&self, kind: MinionKind, _at: Location) -> Option<EntityHandle> {
        let mut world = self.world.borrow_mut();
        if world.refuse_spawns {
            return None;
        }
        world.next_handle += 1;
        let handle = EntityHandle(world.next_handle);
        world.minions.insert(handle, MinionEntry { kind, alive: true });
        world.spawned += 1;
        Some(handle)
    }

    fn is_alive(&self, handle: EntityHandle) -> bool {
        self.world
            .borrow()
            .minions
            .get(&handle)
            .is_some_and(|m| m.alive)
    }

    fn remove_entity(&self, handle: EntityHandle) -> bool {
        let mut world = self.world.borrow_mut();
        let removed = match world.minions.get_mut(&handle) {
            Some(entry) if entry.alive => {
                entry.alive = false;
                true
            }
            _ => false,
        };
        if removed {
            world.removed.push(handle);
        }
        removed
    }

    fn damage_participant(&self, participant: ParticipantId, amount: f64) -> bool {
        self.affect_participant(participant, |entry| entry.damage_taken += amount)
    }

    fn knock_back(&self, participant: ParticipantId, from: Location, strength: f64) -> bool {
        if self.world.borrow().resist_knockback {
            return false;
        }
        let applied = self.affect_participant(participant, |entry| {
            let dx = entry.location.x - from.x;
            let dz = entry.location.z - from.z;
            let len = dx.hypot(dz);
            if len > f64::EPSILON {
                entry.location.x += dx / len * strength;
                entry.location.z += dz / len * strength;
            }
        });
        if applied {
            self.world.borrow_mut().knockbacks += 1;
        }
        applied
    }

    fn apply_status(
        &self,
        participant: ParticipantId,
        status: StatusEffect,
        duration: Duration,
    ) -> bool {
        self.affect_participant(participant, |entry| entry.statuses.push((status, duration)))
    }
}

/// Captures every announcement.
#[derive(Debug, Default)]
pub struct RecordingBroadcaster {
    phases: RefCell<Vec<String>>,
    victories: RefCell<Vec<Option<String>>>,
    failures: RefCell<u32>,
}

impl RecordingBroadcaster {
    #[must_use]
    pub fn phase_announcements(&self) -> Vec<String> {
        self.phases.borrow().clone()
    }

    #[must_use]
    pub fn victory_announcements(&self) -> Vec<Option<String>> {
        self.victories.borrow().clone()
    }

    #[must_use]
    pub fn failure_announcements(&self) -> u32 {
        *self.failures.borrow()
    }
}

impl Broadcaster for RecordingBroadcaster {
    fn announce_phase_transition(&self, name: &str) {
        self.phases.borrow_mut().push(name.to_string());
    }

    fn announce_victory(&self, top_contributor: Option<&str>) {
        self.victories
            .borrow_mut()
            .push(top_contributor.map(str::to_string));
    }

    fn announce_failure(&self) {
        *self.failures.borrow_mut() += 1;
    }
}

/// One reward handed out.
#[derive(Debug, Clone, PartialEq)]
pub struct Grant {
    pub participant: ParticipantId,
    pub amount: u32,
    pub context: RewardContext,
}

#[derive(Debug, Default)]
pub struct RecordingRewards {
    grants: RefCell<Vec<Grant>>,
}

impl RecordingRewards {
    #[must_use]
    pub fn grants(&self) -> Vec<Grant> {
        self.grants.borrow().clone()
    }
}

impl RewardGranter for RecordingRewards {
    fn grant_reward(&self, participant: &Participant, amount: u32, context: &RewardContext) {
        self.grants.borrow_mut().push(Grant {
            participant: participant.id,
            amount,
            context: context.clone(),
        });
    }
}

#[derive(Debug, Default)]
pub struct RecordingEffects {
    cues: RefCell<Vec<EffectCue>>,
}

impl RecordingEffects {
    #[must_use]
    pub fn cues(&self) -> Vec<EffectCue> {
        self.cues.borrow().clone()
    }
}

impl EffectsPlayer for RecordingEffects {
    fn play(&self, cue: EffectCue) {
        self.cues.borrow_mut().push(cue);
    }
}

/// A complete in-memory host sharing one manual clock.
#[derive(Debug, Clone, Default)]
pub struct MemoryHost {
    pub arena: Rc<MemoryArena>,
    pub broadcaster: Rc<RecordingBroadcaster>,
    pub rewards: Rc<RecordingRewards>,
    pub effects: Rc<RecordingEffects>,
    pub clock: ManualClock,
}

impl MemoryHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Collaborator bundle for a monitor or director.
    #[must_use]
    pub fn services(&self) -> HostServices {
        HostServices {
            arena: self.arena.clone(),
            broadcaster: self.broadcaster.clone(),
            rewards: self.rewards.clone(),
            effects: self.effects.clone(),
            clock: Rc::new(self.clock.clone()),
        }
    }
}
