//! The per-fight state record and the summary it collapses into.
use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ability::LingeringZone;
use crate::events::{EncounterEvent, EventId, EventKind};
use crate::host::{BossId, EntityHandle, Location, Participant, ParticipantId};
use crate::minions::{MinionRecord, MinionStatus};
use crate::phase::Phase;
use crate::scaling::ScaledStats;

/// Mutable record of one in-progress fight.
///
/// Readers get plain getters. Every mutator is crate-private and called only
/// by the combat monitor, which makes the monitor the single writer.
#[derive(Debug, Clone)]
pub struct EncounterSession {
    boss: BossId,
    phase: Phase,
    roster: Vec<Participant>,
    participants: Vec<Participant>,
    contributions: HashMap<ParticipantId, u32>,
    anchors: Vec<Location>,
    minions: Vec<MinionRecord>,
    zones: Vec<LingeringZone>,
    phase_transitions: u32,
    enraged: bool,
    started_at: Duration,
    elapsed: Duration,
    ticks: u64,
    event_seq: u16,
    health_multiplier: f64,
    damage_multiplier: f64,
    max_health: f64,
    events: Vec<EncounterEvent>,
}

impl EncounterSession {
    pub(crate) fn new(
        boss: BossId,
        participants: Vec<Participant>,
        started_at: Duration,
        health_multiplier: f64,
        stats: &ScaledStats,
    ) -> Self {
        Self {
            boss,
            phase: Phase::Crystal,
            roster: participants.clone(),
            participants,
            contributions: HashMap::new(),
            anchors: Vec::new(),
            minions: Vec::new(),
            zones: Vec::new(),
            phase_transitions: 0,
            enraged: false,
            started_at,
            elapsed: Duration::ZERO,
            ticks: 0,
            event_seq: 0,
            health_multiplier,
            damage_multiplier: stats.damage_multiplier,
            max_health: stats.max_health,
            events: Vec::new(),
        }
    }

    #[must_use]
    pub const fn boss(&self) -> BossId {
        self.boss
    }

    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Everyone registered at start, in registration order.
    #[must_use]
    pub fn roster(&self) -> &[Participant] {
        &self.roster
    }

    /// Participants still engaged after pruning.
    #[must_use]
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    #[must_use]
    pub const fn contributions(&self) -> &HashMap<ParticipantId, u32> {
        &self.contributions
    }

    #[must_use]
    pub fn anchors(&self) -> &[Location] {
        &self.anchors
    }

    #[must_use]
    pub fn minions(&self) -> &[MinionRecord] {
        &self.minions
    }

    #[must_use]
    pub fn zones(&self) -> &[LingeringZone] {
        &self.zones
    }

    #[must_use]
    pub const fn phase_transitions(&self) -> u32 {
        self.phase_transitions
    }

    #[must_use]
    pub const fn is_enraged(&self) -> bool {
        self.enraged
    }

    /// Clock reading when the fight began.
    #[must_use]
    pub const fn started_at(&self) -> Duration {
        self.started_at
    }

    /// Elapsed time as of the current tick.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    #[must_use]
    pub const fn health_multiplier(&self) -> f64 {
        self.health_multiplier
    }

    #[must_use]
    pub const fn damage_multiplier(&self) -> f64 {
        self.damage_multiplier
    }

    /// Boss maximum health after scaling.
    #[must_use]
    pub const fn max_health(&self) -> f64 {
        self.max_health
    }

    #[must_use]
    pub fn events(&self) -> &[EncounterEvent] {
        &self.events
    }

    #[must_use]
    pub fn living_minions(&self) -> usize {
        self.minions.iter().filter(|m| m.is_alive()).count()
    }

    pub(crate) fn begin_tick(&mut self, elapsed: Duration) {
        self.ticks += 1;
        self.elapsed = elapsed;
        self.event_seq = 0;
    }

    /// Move forward to `to`. Returns `false` (and changes nothing) unless `to`
    /// is later than the current phase.
    pub(crate) fn advance_phase(&mut self, to: Phase) -> bool {
        if to <= self.phase {
            return false;
        }
        self.phase = to;
        self.phase_transitions = self.phase_transitions.saturating_add(1);
        if to == Phase::Enraged {
            self.enraged = true;
        }
        true
    }

    /// Drop participants failing `keep`; returns who was removed.
    pub(crate) fn prune(&mut self, keep: impl Fn(&Participant) -> bool) -> Vec<Participant> {
        let (kept, removed): (Vec<_>, Vec<_>) =
            self.participants.drain(..).partition(|p| keep(p));
        self.participants = kept;
        removed
    }

    /// Count hits from engaged participants; hits from anyone else are ignored.
    pub(crate) fn record_hits(&mut self, hits: &[ParticipantId]) {
        for hit in hits {
            if self.participants.iter().any(|p| p.id == *hit) {
                *self.contributions.entry(*hit).or_insert(0) += 1;
            }
        }
    }

    pub(crate) fn set_anchors(&mut self, anchors: Vec<Location>) {
        self.anchors = anchors;
    }

    pub(crate) fn push_minions(&mut self, records: impl IntoIterator<Item = MinionRecord>) {
        self.minions.extend(records);
    }

    pub(crate) fn mark_minions(&mut self, handles: &[EntityHandle], status: MinionStatus) {
        for record in &mut self.minions {
            if record.is_alive() && handles.contains(&record.handle) {
                record.status = status;
            }
        }
    }

    pub(crate) fn open_zone(&mut self, zone: LingeringZone) {
        if zone.remaining_ticks > 0 {
            self.zones.push(zone);
        }
    }

    /// Count every zone down by one tick and drop the expired ones.
    pub(crate) fn decay_zones(&mut self) {
        for zone in &mut self.zones {
            zone.remaining_ticks = zone.remaining_ticks.saturating_sub(1);
        }
        self.zones.retain(|zone| zone.remaining_ticks > 0);
    }

    pub(crate) fn push_event(&mut self, kind: EventKind, payload: serde_json::Value) {
        let id = EventId::new(self.ticks, self.event_seq);
        self.event_seq = self.event_seq.saturating_add(1);
        self.events
            .push(EncounterEvent::new(id, kind, self.elapsed.as_secs(), payload));
    }

    /// Consume the session into its summary.
    pub(crate) fn into_summary(self, outcome: EncounterOutcome) -> EncounterSummary {
        let mut contributions: Vec<(ParticipantId, u32)> = self
            .roster
            .iter()
            .map(|p| (p.id, self.contributions.get(&p.id).copied().unwrap_or(0)))
            .collect();
        contributions.sort_by(|a, b| b.1.cmp(&a.1));
        let count = |status: MinionStatus| {
            self.minions
                .iter()
                .filter(|m| m.status == status)
                .count()
        };
        EncounterSummary {
            boss: self.boss,
            outcome,
            final_phase: self.phase,
            phase_transitions: self.phase_transitions,
            enraged: self.enraged,
            ticks: self.ticks,
            duration_secs: self.elapsed.as_secs(),
            contributions,
            minions_spawned: self.minions.len(),
            minions_slain: count(MinionStatus::Slain),
            minions_retired: count(MinionStatus::Retired),
            events: self.events,
        }
    }
}

/// Why a fight ended without a victory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCause {
    /// No participant remained present.
    ParticipantsLost,
    /// The boss handle stopped resolving without the boss dying.
    BossLost,
}

/// Terminal state of a fight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EncounterOutcome {
    Victory {
        top_contributor: Option<ParticipantId>,
        reward_per_participant: u32,
        rewarded: usize,
    },
    Failure {
        cause: FailureCause,
    },
    /// Stopped from outside; neither rewarded nor announced.
    Cancelled,
}

impl EncounterOutcome {
    #[must_use]
    pub const fn is_victory(&self) -> bool {
        matches!(self, Self::Victory { .. })
    }
}

/// Immutable record of a finished fight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterSummary {
    pub boss: BossId,
    pub outcome: EncounterOutcome,
    pub final_phase: Phase,
    pub phase_transitions: u32,
    pub enraged: bool,
    pub ticks: u64,
    pub duration_secs: u64,
    /// Hit counts for the whole roster, highest first, ties in registration order.
    pub contributions: Vec<(ParticipantId, u32)>,
    pub minions_spawned: usize,
    pub minions_slain: usize,
    pub minions_retired: usize,
    pub events: Vec<EncounterEvent>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MinionKind;

    fn session() -> EncounterSession {
        let stats = ScaledStats {
            max_health: 400.0,
            current_health: 400.0,
            damage_multiplier: 1.2,
            participant_count: 3,
        };
        let participants = vec![
            Participant::new(1, "ash"),
            Participant::new(2, "birch"),
            Participant::new(3, "cedar"),
        ];
        EncounterSession::new(BossId(9), participants, Duration::from_secs(5), 2.0, &stats)
    }

    #[test]
    fn phase_only_moves_forward_and_enrage_sticks() {
        let mut s = session();
        assert!(!s.advance_phase(Phase::Crystal));
        assert!(s.advance_phase(Phase::Ground));
        assert!(!s.advance_phase(Phase::Aerial));
        assert_eq!(s.phase(), Phase::Ground);
        assert!(!s.is_enraged());
        assert!(s.advance_phase(Phase::Enraged));
        assert!(s.is_enraged());
        assert!(!s.advance_phase(Phase::Enraged));
        assert!(s.is_enraged());
        assert_eq!(s.phase_transitions(), 2);
    }

    #[test]
    fn pruned_participants_stop_contributing() {
        let mut s = session();
        s.record_hits(&[ParticipantId(2), ParticipantId(2), ParticipantId(3)]);
        let removed = s.prune(|p| p.id != ParticipantId(3));
        assert_eq!(removed.len(), 1);
        s.record_hits(&[ParticipantId(3), ParticipantId(42)]);
        assert_eq!(s.contributions().get(&ParticipantId(2)), Some(&2));
        assert_eq!(s.contributions().get(&ParticipantId(3)), Some(&1));
        assert_eq!(s.contributions().get(&ParticipantId(42)), None);
        assert_eq!(s.roster().len(), 3);
        assert_eq!(s.participants().len(), 2);
    }

    #[test]
    fn zones_expire_after_their_ticks() {
        let mut s = session();
        s.open_zone(LingeringZone {
            center: Location::default(),
            radius: 4.0,
            damage_per_tick: 1.0,
            remaining_ticks: 2,
        });
        s.decay_zones();
        assert_eq!(s.zones().len(), 1);
        s.decay_zones();
        assert!(s.zones().is_empty());
    }

    #[test]
    fn summary_counts_minions_and_ranks_roster() {
        let mut s = session();
        let record = |handle: u64| MinionRecord {
            handle: EntityHandle(handle),
            kind: MinionKind::Skyling,
            phase: Phase::Aerial,
            site: Location::default(),
            status: MinionStatus::Alive,
        };
        s.push_minions([record(1), record(2), record(3)]);
        s.mark_minions(&[EntityHandle(1)], MinionStatus::Slain);
        s.mark_minions(&[EntityHandle(1), EntityHandle(2)], MinionStatus::Retired);
        s.record_hits(&[ParticipantId(3)]);
        s.begin_tick(Duration::from_secs(12));
        s.push_event(EventKind::Cancelled, serde_json::Value::Null);

        let summary = s.into_summary(EncounterOutcome::Cancelled);
        assert_eq!(summary.minions_spawned, 3);
        assert_eq!(summary.minions_slain, 1);
        assert_eq!(summary.minions_retired, 1);
        assert_eq!(summary.contributions[0], (ParticipantId(3), 1));
        assert_eq!(summary.contributions[1], (ParticipantId(1), 0));
        assert_eq!(summary.duration_secs, 12);
        assert_eq!(summary.events[0].id, EventId::new(1, 0));
    }
}
