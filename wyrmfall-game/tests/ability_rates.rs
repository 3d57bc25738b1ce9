use std::collections::HashMap;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use wyrmfall_game::{Ability, AbilityScheduler, AbilityTuning, Phase};

const SAMPLE_SIZE: usize = 20_000;
const TOLERANCE: f64 = 0.01;

fn sample(phase: Phase, seed: u64) -> HashMap<Option<Ability>, usize> {
    let scheduler = AbilityScheduler::new(AbilityTuning::default());
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut counts = HashMap::new();
    for _ in 0..SAMPLE_SIZE {
        *counts.entry(scheduler.roll(phase, &mut rng)).or_insert(0) += 1;
    }
    counts
}

fn rate(counts: &HashMap<Option<Ability>, usize>, key: Option<Ability>) -> f64 {
    let hits = counts.get(&key).copied().unwrap_or(0);
    f64::from(u32::try_from(hits).expect("count fits"))
        / f64::from(u32::try_from(SAMPLE_SIZE).expect("sample size fits"))
}

#[test]
fn crystal_rates_track_table() {
    let counts = sample(Phase::Crystal, 0xC0FFEE);
    // Independent slots, uniform pick when both fire.
    let regen = 0.10 * 0.95 + 0.10 * 0.05 / 2.0;
    let beam = 0.05 * 0.90 + 0.10 * 0.05 / 2.0;
    let observed_regen = rate(&counts, Some(Ability::RegenNearAnchor));
    let observed_beam = rate(&counts, Some(Ability::AnchorBeam));
    assert!(
        (observed_regen - regen).abs() <= TOLERANCE,
        "regen rate drifted: observed {observed_regen:.4}"
    );
    assert!(
        (observed_beam - beam).abs() <= TOLERANCE,
        "beam rate drifted: observed {observed_beam:.4}"
    );
    assert_eq!(counts.len(), 3, "unexpected abilities: {counts:?}");
}

#[test]
fn ground_phase_fires_about_a_third_of_ticks() {
    let counts = sample(Phase::Ground, 0xBEEF);
    let quiet = 0.80 * 0.85 * 0.95;
    let observed_quiet = rate(&counts, None);
    assert!(
        (observed_quiet - quiet).abs() <= TOLERANCE,
        "quiet rate drifted: observed {observed_quiet:.4}"
    );
    assert!(counts.contains_key(&Some(Ability::CallBrood)));
    assert!(!counts.contains_key(&Some(Ability::AreaBarrage)));
}

#[test]
fn enraged_pool_and_fear_roar_split() {
    let counts = sample(Phase::Enraged, 0xF00D);
    let fear = 0.10 * 0.75 + 0.25 * 0.10 / 2.0;
    let pooled = 0.25 * 0.90 + 0.25 * 0.10 / 2.0;
    let observed_fear = rate(&counts, Some(Ability::FearRoar));
    let observed_pool: f64 = counts
        .keys()
        .filter(|k| k.is_some_and(|a| a != Ability::FearRoar))
        .map(|k| rate(&counts, *k))
        .sum();
    assert!(
        (observed_fear - fear).abs() <= TOLERANCE,
        "fear rate drifted: observed {observed_fear:.4}"
    );
    assert!(
        (observed_pool - pooled).abs() <= TOLERANCE,
        "pool rate drifted: observed {observed_pool:.4}"
    );
    // Every earlier ability shows up in the enraged pool, roughly evenly.
    for ability in [
        Ability::RegenNearAnchor,
        Ability::AnchorBeam,
        Ability::AreaBarrage,
        Ability::KnockbackGust,
        Ability::MeleeSweep,
        Ability::LingeringBreath,
        Ability::CallBrood,
    ] {
        let observed = rate(&counts, Some(ability));
        assert!(
            (observed - pooled / 7.0).abs() <= TOLERANCE,
            "{ability} rate drifted: observed {observed:.4}"
        );
    }
}
