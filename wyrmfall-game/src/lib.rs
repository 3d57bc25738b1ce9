//! Wyrmfall Encounter Engine
//!
//! Platform-agnostic core logic for phased boss encounters: a single boss fought
//! by a group of participants, escalating through ordered phases as its health
//! drops, summoning and retiring helpers, and resolving to a rewarded victory
//! or an unrewarded failure.
//!
//! The crate never touches a live game world. Every world interaction goes
//! through the collaborator traits in [`host`], and time advances only through
//! a [`scheduler::Scheduler`] supplied by the host.

pub mod ability;
pub mod config;
pub mod constants;
pub mod director;
pub mod events;
pub mod host;
pub mod memory;
pub mod minions;
pub mod monitor;
pub mod numbers;
pub mod phase;
pub mod reward;
pub mod rng;
pub mod scaling;
pub mod scheduler;
pub mod session;

// Re-export commonly used types
pub use ability::{
    Ability, AbilityError, AbilityOutcome, AbilityScheduler, AbilitySlot, AbilityTuning,
    CastContext, LingeringZone,
};
pub use config::{EncounterConfig, EncounterConfigError};
pub use director::EncounterDirector;
pub use events::{EncounterEvent, EventId, EventKind, EventSeverity};
pub use host::{
    Arena, BossHealth, BossId, BossModifier, Broadcaster, EffectCue, EffectsPlayer, EntityHandle,
    Location, MinionKind, Participant, ParticipantId, Presence, RewardContext, RewardGranter,
    StatusEffect,
};
pub use minions::{
    MinionLifecycleManager, MinionRecord, MinionStatus, SpawnRule, SpawnRules, SpawnWave,
};
pub use monitor::{
    CombatMonitor, CombatRequest, EncounterHandle, HostServices, SetupError, TickStatus,
    start_combat,
};
pub use phase::{
    Phase, PhaseCleanup, PhaseController, PhaseThresholds, PhaseTransition, TransitionCause,
};
pub use reward::{RewardCalculator, RewardTuning};
pub use rng::EncounterRng;
pub use scaling::{Multipliers, ScaledStats, ScalingCalculator, ScalingConfig, ScalingInput};
#[cfg(feature = "async")]
pub use scheduler::{LocalIntervalScheduler, TokioClock};
pub use scheduler::{
    CancelHandle, Clock, ManualClock, ManualScheduler, PeriodicTask, Scheduler, SystemClock,
    TickControl,
};
pub use session::{EncounterOutcome, EncounterSession, EncounterSummary, FailureCause};
