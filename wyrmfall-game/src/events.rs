//! Structured events recorded by the combat monitor.
//!
//! The event log is the encounter's audit trail. Hosts may render it, persist
//! it, or ignore it; the monitor never reads it back to make decisions.

use serde::{Deserialize, Serialize};

use crate::constants::{
    EVENT_ABILITY_CAST, EVENT_ABILITY_FIZZLED, EVENT_CANCELLED, EVENT_ENRAGED, EVENT_FAILURE,
    EVENT_MINIONS_RETIRED, EVENT_MINIONS_SPAWNED, EVENT_PARTICIPANTS_PRUNED, EVENT_PHASE_CHANGED,
    EVENT_VICTORY,
};

/// Stable identifier for a single event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId {
    /// Tick during which the event occurred; 0 for setup.
    pub tick: u64,
    /// Sequence number within the tick.
    pub seq: u16,
}

impl EventId {
    #[must_use]
    pub const fn new(tick: u64, seq: u16) -> Self {
        Self { tick, seq }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    PhaseChanged,
    Enraged,
    AbilityCast,
    AbilityFizzled,
    MinionsSpawned,
    MinionsRetired,
    ParticipantsPruned,
    Victory,
    Failure,
    Cancelled,
}

impl EventKind {
    /// Dotted key for log sinks and presentation layers.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::PhaseChanged => EVENT_PHASE_CHANGED,
            Self::Enraged => EVENT_ENRAGED,
            Self::AbilityCast => EVENT_ABILITY_CAST,
            Self::AbilityFizzled => EVENT_ABILITY_FIZZLED,
            Self::MinionsSpawned => EVENT_MINIONS_SPAWNED,
            Self::MinionsRetired => EVENT_MINIONS_RETIRED,
            Self::ParticipantsPruned => EVENT_PARTICIPANTS_PRUNED,
            Self::Victory => EVENT_VICTORY,
            Self::Failure => EVENT_FAILURE,
            Self::Cancelled => EVENT_CANCELLED,
        }
    }

    #[must_use]
    pub const fn severity(self) -> EventSeverity {
        match self {
            Self::AbilityCast
            | Self::AbilityFizzled
            | Self::MinionsSpawned
            | Self::MinionsRetired => EventSeverity::Info,
            Self::PhaseChanged | Self::ParticipantsPruned | Self::Cancelled => {
                EventSeverity::Warning
            }
            Self::Enraged | Self::Victory | Self::Failure => EventSeverity::Critical,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSeverity {
    Info,
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterEvent {
    pub id: EventId,
    pub kind: EventKind,
    pub severity: EventSeverity,
    /// Seconds since the encounter started.
    pub elapsed_secs: u64,
    /// Optional structured payload for debugging and downstream rendering.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub payload: serde_json::Value,
}

impl EncounterEvent {
    #[must_use]
    pub const fn new(
        id: EventId,
        kind: EventKind,
        elapsed_secs: u64,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            id,
            kind,
            severity: kind.severity(),
            elapsed_secs,
            payload,
        }
    }

    #[must_use]
    pub const fn key(&self) -> &'static str {
        self.kind.key()
    }
}
