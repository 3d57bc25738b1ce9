//! Centralized balance and tuning constants for Wyrmfall encounter logic.
//!
//! These values back the hard-coded fallback configuration and the static
//! ability tables. The bundled `assets/encounter.json` mirrors them; keeping
//! both in one place means a balance change is a reviewed code change.

// Event keys ---------------------------------------------------------------
pub(crate) const EVENT_PHASE_CHANGED: &str = "encounter.phase.changed";
pub(crate) const EVENT_ENRAGED: &str = "encounter.enraged";
pub(crate) const EVENT_ABILITY_CAST: &str = "encounter.ability.cast";
pub(crate) const EVENT_ABILITY_FIZZLED: &str = "encounter.ability.fizzled";
pub(crate) const EVENT_MINIONS_SPAWNED: &str = "encounter.minions.spawned";
pub(crate) const EVENT_MINIONS_RETIRED: &str = "encounter.minions.retired";
pub(crate) const EVENT_PARTICIPANTS_PRUNED: &str = "encounter.participants.pruned";
pub(crate) const EVENT_VICTORY: &str = "encounter.victory";
pub(crate) const EVENT_FAILURE: &str = "encounter.failure";
pub(crate) const EVENT_CANCELLED: &str = "encounter.cancelled";

// Loop timing --------------------------------------------------------------
pub(crate) const TICK_INTERVAL_MS: u64 = 1_000;
pub(crate) const ENRAGE_AFTER_SECS: u64 = 600;

// Phase thresholds (boss health fraction) ------------------------------------
pub(crate) const AERIAL_HEALTH_THRESHOLD: f64 = 0.75;
pub(crate) const GROUND_HEALTH_THRESHOLD: f64 = 0.50;
pub(crate) const ENRAGED_HEALTH_THRESHOLD: f64 = 0.25;

// Per-tick ability trigger probabilities -----------------------------------
pub(crate) const CHANCE_REGEN_NEAR_ANCHOR: f64 = 0.10;
pub(crate) const CHANCE_ANCHOR_BEAM: f64 = 0.05;
pub(crate) const CHANCE_AREA_BARRAGE: f64 = 0.15;
pub(crate) const CHANCE_KNOCKBACK_GUST: f64 = 0.10;
pub(crate) const CHANCE_MELEE_SWEEP: f64 = 0.20;
pub(crate) const CHANCE_LINGERING_BREATH: f64 = 0.15;
pub(crate) const CHANCE_CALL_BROOD: f64 = 0.05;
pub(crate) const CHANCE_ENRAGED_ANY: f64 = 0.25;
pub(crate) const CHANCE_FEAR_ROAR: f64 = 0.10;

// Ability payloads ---------------------------------------------------------
pub(crate) const ANCHOR_REGEN_FRACTION: f64 = 0.02;
pub(crate) const ANCHOR_BEAM_DAMAGE: f64 = 6.0;
pub(crate) const AREA_BARRAGE_DAMAGE: f64 = 4.0;
pub(crate) const KNOCKBACK_GUST_DAMAGE: f64 = 2.0;
pub(crate) const KNOCKBACK_GUST_STRENGTH: f64 = 1.5;
pub(crate) const MELEE_SWEEP_DAMAGE: f64 = 8.0;
pub(crate) const MELEE_SWEEP_STRENGTH: f64 = 1.0;
pub(crate) const MELEE_SWEEP_REACH: f64 = 8.0;
pub(crate) const BREATH_DAMAGE_PER_TICK: f64 = 3.0;
pub(crate) const BREATH_RADIUS: f64 = 6.0;
pub(crate) const BREATH_DURATION_TICKS: u32 = 5;
pub(crate) const FEAR_ROAR_DURATION_SECS: u64 = 4;
pub(crate) const CALL_BROOD_BASE: u32 = 1;

// Minion spawn rules (base + participants / divisor) -------------------------
pub(crate) const CRYSTAL_SPAWN_BASE: u32 = 2;
pub(crate) const CRYSTAL_SPAWN_DIVISOR: u32 = 1;
pub(crate) const AERIAL_SPAWN_BASE: u32 = 1;
pub(crate) const AERIAL_SPAWN_DIVISOR: u32 = 2;
pub(crate) const GROUND_SPAWN_BASE: u32 = 2;
pub(crate) const GROUND_SPAWN_DIVISOR: u32 = 2;
pub(crate) const ENRAGED_SPAWN_BASE: u32 = 3;
pub(crate) const ENRAGED_SPAWN_DIVISOR: u32 = 1;
pub(crate) const ANCHOR_RING_RADIUS: f64 = 24.0;
pub(crate) const MINION_RING_RADIUS: f64 = 10.0;

// Rewards ------------------------------------------------------------------
pub(crate) const REWARD_BASE: u32 = 10;
pub(crate) const REWARD_BONUS_PER_TRANSITION: u32 = 5;

// Group scaling ------------------------------------------------------------
pub(crate) const HEALTH_PER_EXTRA_PARTICIPANT: f64 = 0.25;
pub(crate) const DAMAGE_PER_EXTRA_PARTICIPANT: f64 = 0.05;
pub(crate) const MAX_HEALTH_MULTIPLIER: f64 = 8.0;
pub(crate) const MAX_DAMAGE_MULTIPLIER: f64 = 2.0;
