//! Host-level registry of running encounters, one per boss.
use std::collections::HashMap;

use log::{debug, info};

use crate::config::EncounterConfig;
use crate::host::{BossId, Participant};
use crate::monitor::{CombatRequest, EncounterHandle, HostServices, SetupError, start_combat};
use crate::scaling::ScalingCalculator;
use crate::scheduler::Scheduler;

/// Starts encounters on a shared scheduler and refuses to engage a boss twice.
pub struct EncounterDirector<S: Scheduler> {
    scheduler: S,
    host: HostServices,
    config: EncounterConfig,
    encounters: HashMap<BossId, EncounterHandle>,
    next_seed: u64,
}

impl<S: Scheduler> EncounterDirector<S> {
    #[must_use]
    pub fn new(scheduler: S, host: HostServices, config: EncounterConfig, seed: u64) -> Self {
        Self {
            scheduler,
            host,
            config,
            encounters: HashMap::new(),
            next_seed: seed,
        }
    }

    /// Start a fight with explicit multipliers.
    ///
    /// # Errors
    ///
    /// [`SetupError::AlreadyEngaged`] while an earlier fight against the same
    /// boss is still running, or any error [`start_combat`] reports.
    pub fn start_combat(
        &mut self,
        boss: BossId,
        participants: Vec<Participant>,
        health_multiplier: f64,
        damage_multiplier: f64,
    ) -> Result<EncounterHandle, SetupError> {
        self.reap_finished();
        if self.is_engaged(boss) {
            return Err(SetupError::AlreadyEngaged(boss));
        }
        let seed = self.next_seed;
        let request = CombatRequest::new(boss, participants, health_multiplier, damage_multiplier)
            .with_seed(seed);
        let handle = start_combat(
            &mut self.scheduler,
            self.host.clone(),
            self.config.clone(),
            request,
        )?;
        self.next_seed = self.next_seed.wrapping_add(1);
        self.encounters.insert(boss, handle.clone());
        Ok(handle)
    }

    /// Start a fight with multipliers derived from the group size.
    ///
    /// # Errors
    ///
    /// Same as [`EncounterDirector::start_combat`].
    pub fn start_scaled(
        &mut self,
        boss: BossId,
        participants: Vec<Participant>,
    ) -> Result<EncounterHandle, SetupError> {
        let multipliers =
            ScalingCalculator::recommended_multipliers(participants.len(), &self.config.scaling);
        self.start_combat(boss, participants, multipliers.health, multipliers.damage)
    }

    /// Forget fights that have ended. Returns how many handles were dropped.
    pub fn reap_finished(&mut self) -> usize {
        let before = self.encounters.len();
        self.encounters.retain(|_, handle| !handle.is_finished());
        let reaped = before - self.encounters.len();
        if reaped > 0 {
            debug!("reaped {reaped} finished encounters");
        }
        reaped
    }

    #[must_use]
    pub fn is_engaged(&self, boss: BossId) -> bool {
        self.encounters
            .get(&boss)
            .is_some_and(|handle| !handle.is_finished())
    }

    #[must_use]
    pub fn encounter(&self, boss: BossId) -> Option<&EncounterHandle> {
        self.encounters.get(&boss)
    }

    /// Bosses with a fight still running.
    #[must_use]
    pub fn engaged(&self) -> Vec<BossId> {
        let mut bosses: Vec<BossId> = self
            .encounters
            .iter()
            .filter(|(_, handle)| !handle.is_finished())
            .map(|(boss, _)| *boss)
            .collect();
        bosses.sort();
        bosses
    }

    /// Cancel every running fight. Returns how many were cancelled.
    pub fn shutdown(&mut self) -> usize {
        let cancelled = self
            .encounters
            .values()
            .filter(|handle| handle.cancel())
            .count();
        if cancelled > 0 {
            info!("shutdown cancelled {cancelled} encounters");
        }
        self.encounters.clear();
        cancelled
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }
}
