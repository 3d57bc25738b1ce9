//! Helper creature lifecycle: spawn on phase entry, sweep the fallen, retire the rest.
use log::warn;
use serde::{Deserialize, Serialize};

use crate::constants::{
    AERIAL_SPAWN_BASE, AERIAL_SPAWN_DIVISOR, ANCHOR_RING_RADIUS, CRYSTAL_SPAWN_BASE,
    CRYSTAL_SPAWN_DIVISOR, ENRAGED_SPAWN_BASE, ENRAGED_SPAWN_DIVISOR, GROUND_SPAWN_BASE,
    GROUND_SPAWN_DIVISOR, MINION_RING_RADIUS,
};
use crate::host::{Arena, BossId, EntityHandle, Location, MinionKind};
use crate::numbers::usize_to_u32;
use crate::phase::Phase;

/// `base + participants / participant_divisor` helpers per phase entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnRule {
    pub base: u32,
    pub participant_divisor: u32,
}

impl SpawnRule {
    #[must_use]
    pub const fn new(base: u32, participant_divisor: u32) -> Self {
        Self {
            base,
            participant_divisor,
        }
    }

    #[must_use]
    pub fn count_for(&self, participants: usize) -> u32 {
        let divisor = self.participant_divisor.max(1);
        self.base.saturating_add(usize_to_u32(participants) / divisor)
    }
}

/// Spawn rules keyed by phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnRules {
    pub crystal: SpawnRule,
    pub aerial: SpawnRule,
    pub ground: SpawnRule,
    pub enraged: SpawnRule,
}

impl Default for SpawnRules {
    fn default() -> Self {
        Self {
            crystal: SpawnRule::new(CRYSTAL_SPAWN_BASE, CRYSTAL_SPAWN_DIVISOR),
            aerial: SpawnRule::new(AERIAL_SPAWN_BASE, AERIAL_SPAWN_DIVISOR),
            ground: SpawnRule::new(GROUND_SPAWN_BASE, GROUND_SPAWN_DIVISOR),
            enraged: SpawnRule::new(ENRAGED_SPAWN_BASE, ENRAGED_SPAWN_DIVISOR),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MinionStatus {
    Alive,
    /// Died in the world on its own.
    Slain,
    /// Force-removed by the encounter.
    Retired,
}

/// Tracking entry for one summoned helper.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinionRecord {
    pub handle: EntityHandle,
    pub kind: MinionKind,
    pub phase: Phase,
    pub site: Location,
    pub status: MinionStatus,
}

impl MinionRecord {
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        matches!(self.status, MinionStatus::Alive)
    }

    #[must_use]
    pub const fn is_anchor(&self) -> bool {
        matches!(self.kind, MinionKind::AnchorCrystal)
    }
}

/// One phase-entry spawn: the sites used, how many helpers were asked for
/// and the records of those the host actually spawned.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnWave {
    pub sites: Vec<Location>,
    pub requested: u32,
    pub records: Vec<MinionRecord>,
}

/// Stateless manager; the records live on the session.
#[derive(Debug, Clone)]
pub struct MinionLifecycleManager {
    rules: SpawnRules,
}

impl MinionLifecycleManager {
    #[must_use]
    pub const fn new(rules: SpawnRules) -> Self {
        Self { rules }
    }

    #[must_use]
    pub fn count_for(&self, phase: Phase, participants: usize) -> u32 {
        phase.spawn_rule(&self.rules).count_for(participants)
    }

    /// Sites for a phase's spawn wave. The crystal phase prefers the world's
    /// anchor sites and falls back to a wide ring around the boss.
    #[must_use]
    pub fn spawn_sites(&self, phase: Phase, boss: BossId, arena: &dyn Arena) -> Vec<Location> {
        if phase == Phase::Crystal {
            let anchors = arena.anchor_sites(boss);
            if !anchors.is_empty() {
                return anchors;
            }
        }
        let Some(center) = arena.boss_location(boss) else {
            return Vec::new();
        };
        let (radius, slots) = if phase == Phase::Crystal {
            (ANCHOR_RING_RADIUS, 8)
        } else {
            (MINION_RING_RADIUS, 6)
        };
        (0..slots)
            .map(|slot| center.ring_point(radius, slot, slots))
            .collect()
    }

    /// Spawn the phase-entry wave.
    #[must_use]
    pub fn spawn_for_phase(
        &self,
        phase: Phase,
        boss: BossId,
        participants: usize,
        arena: &dyn Arena,
    ) -> SpawnWave {
        let requested = self.count_for(phase, participants);
        let sites = self.spawn_sites(phase, boss, arena);
        let records = Self::spawn(phase, phase.minion_kind(), requested, &sites, arena);
        SpawnWave {
            sites,
            requested,
            records,
        }
    }

    /// Spawn `count` helpers of `kind` tagged with `phase`, cycling through `sites`.
    #[must_use]
    pub fn spawn(
        phase: Phase,
        kind: MinionKind,
        count: u32,
        sites: &[Location],
        arena: &dyn Arena,
    ) -> Vec<MinionRecord> {
        if sites.is_empty() {
            if count > 0 {
                warn!("no spawn sites for {count} {kind:?} in {phase} phase");
            }
            return Vec::new();
        }
        let mut spawned = Vec::new();
        for (site, _) in sites.iter().cycle().zip(0..count) {
            match arena.spawn_minion(kind, *site) {
                Some(handle) => spawned.push(MinionRecord {
                    handle,
                    kind,
                    phase,
                    site: *site,
                    status: MinionStatus::Alive,
                }),
                None => warn!("host refused to spawn {kind:?} at {site:?}"),
            }
        }
        spawned
    }

    /// Summon `count` helpers on the minion ring around `center`.
    #[must_use]
    pub fn spawn_around(
        phase: Phase,
        kind: MinionKind,
        count: u32,
        center: Location,
        arena: &dyn Arena,
    ) -> Vec<MinionRecord> {
        let sites: Vec<Location> = (0..6)
            .map(|slot| center.ring_point(MINION_RING_RADIUS, slot, 6))
            .collect();
        Self::spawn(phase, kind, count, &sites, arena)
    }

    /// Handles of records still marked alive whose entity is gone.
    #[must_use]
    pub fn sweep_fallen(&self, records: &[MinionRecord], arena: &dyn Arena) -> Vec<EntityHandle> {
        records
            .iter()
            .filter(|record| record.is_alive() && !arena.is_alive(record.handle))
            .map(|record| record.handle)
            .collect()
    }

    /// Force-remove every living record matching `filter`; returns what was retired.
    pub fn retire_where(
        &self,
        records: &[MinionRecord],
        arena: &dyn Arena,
        filter: impl Fn(&MinionRecord) -> bool,
    ) -> Vec<EntityHandle> {
        let mut retired = Vec::new();
        for record in records.iter().filter(|r| r.is_alive() && filter(*r)) {
            if !arena.remove_entity(record.handle) {
                warn!("minion {:?} was already gone when retired", record.handle);
            }
            retired.push(record.handle);
        }
        retired
    }

    /// True once at least one anchor was raised and none remain standing.
    #[must_use]
    pub fn anchors_cleared(&self, records: &[MinionRecord]) -> bool {
        let mut anchors = records.iter().filter(|r| r.is_anchor()).peekable();
        anchors.peek().is_some() && anchors.all(|r| !r.is_alive())
    }

    /// Sites of anchors still standing.
    #[must_use]
    pub fn live_anchor_sites(&self, records: &[MinionRecord]) -> Vec<Location> {
        records
            .iter()
            .filter(|r| r.is_anchor() && r.is_alive())
            .map(|r| r.site)
            .collect()
    }
}
