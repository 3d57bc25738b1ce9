//! Victory payout arithmetic.
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::constants::{REWARD_BASE, REWARD_BONUS_PER_TRANSITION};
use crate::host::{Participant, ParticipantId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardTuning {
    #[serde(default = "RewardTuning::default_base")]
    pub base: u32,
    #[serde(default = "RewardTuning::default_bonus")]
    pub bonus_per_transition: u32,
}

impl RewardTuning {
    const fn default_base() -> u32 {
        REWARD_BASE
    }

    const fn default_bonus() -> u32 {
        REWARD_BONUS_PER_TRANSITION
    }
}

impl Default for RewardTuning {
    fn default() -> Self {
        Self {
            base: Self::default_base(),
            bonus_per_transition: Self::default_bonus(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RewardCalculator {
    tuning: RewardTuning,
}

impl RewardCalculator {
    #[must_use]
    pub const fn new(tuning: RewardTuning) -> Self {
        Self { tuning }
    }

    /// `base + bonus_per_transition * phase_transitions`, saturating.
    #[must_use]
    pub const fn amount(&self, phase_transitions: u32) -> u32 {
        self.tuning
            .base
            .saturating_add(self.tuning.bonus_per_transition.saturating_mul(phase_transitions))
    }

    /// Highest hit count over `roster`. Ties go to whoever registered first;
    /// nobody is named when no hits were recorded.
    #[must_use]
    pub fn top_contributor(
        roster: &[Participant],
        contributions: &HashMap<ParticipantId, u32>,
    ) -> Option<ParticipantId> {
        let mut best: Option<(ParticipantId, u32)> = None;
        for participant in roster {
            let hits = contributions.get(&participant.id).copied().unwrap_or(0);
            if hits > best.map_or(0, |(_, top)| top) {
                best = Some((participant.id, hits));
            }
        }
        best.map(|(id, _)| id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Vec<Participant> {
        vec![
            Participant::new(1, "ash"),
            Participant::new(2, "birch"),
            Participant::new(3, "cedar"),
        ]
    }

    #[test]
    fn amount_counts_transitions() {
        let calc = RewardCalculator::new(RewardTuning::default());
        assert_eq!(calc.amount(0), 10);
        assert_eq!(calc.amount(3), 25);
        assert_eq!(calc.amount(u32::MAX), u32::MAX);
    }

    #[test]
    fn top_contributor_prefers_earliest_on_tie() {
        let roster = roster();
        let contributions = HashMap::from([(ParticipantId(2), 4), (ParticipantId(3), 4)]);
        assert_eq!(
            RewardCalculator::top_contributor(&roster, &contributions),
            Some(ParticipantId(2))
        );
    }

    #[test]
    fn no_hits_means_no_top_contributor() {
        assert_eq!(RewardCalculator::top_contributor(&roster(), &HashMap::new()), None);
        let stranger = HashMap::from([(ParticipantId(99), 12)]);
        assert_eq!(RewardCalculator::top_contributor(&roster(), &stranger), None);
    }
}
