use anyhow::Result;
use chrono::{SecondsFormat, Utc};
use colored::Colorize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::time::Duration;

use crate::simulation::EncounterRecord;
use wyrmfall_game::Phase;

/// Roll-up across every simulated fight.
#[derive(Debug, Clone, Serialize)]
pub struct RunAggregate {
    pub runs: usize,
    pub victories: usize,
    pub outcomes: BTreeMap<String, usize>,
    pub final_phases: BTreeMap<String, usize>,
    pub enraged_runs: usize,
    pub mean_ticks: f64,
    pub mean_transitions: f64,
    pub total_rewards: u64,
    pub violations: usize,
}

impl RunAggregate {
    #[must_use]
    pub fn victory_rate(&self) -> f64 {
        ratio(self.victories, self.runs)
    }

    #[must_use]
    pub fn enrage_rate(&self) -> f64 {
        ratio(self.enraged_runs, self.runs)
    }
}

#[allow(clippy::cast_precision_loss)]
fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

#[must_use]
pub fn aggregate(records: &[EncounterRecord]) -> RunAggregate {
    let mut outcomes = BTreeMap::new();
    let mut final_phases = BTreeMap::new();
    for record in records {
        *outcomes.entry(record.outcome.clone()).or_insert(0) += 1;
        *final_phases
            .entry(record.final_phase.key().to_string())
            .or_insert(0) += 1;
    }
    let ticks: u64 = records.iter().map(|r| r.ticks).sum();
    let transitions: u64 = records.iter().map(|r| u64::from(r.phase_transitions)).sum();
    #[allow(clippy::cast_precision_loss)]
    let mean = |total: u64| {
        if records.is_empty() {
            0.0
        } else {
            total as f64 / records.len() as f64
        }
    };
    RunAggregate {
        runs: records.len(),
        victories: records.iter().filter(|r| r.is_victory()).count(),
        outcomes,
        final_phases,
        enraged_runs: records.iter().filter(|r| r.enraged).count(),
        mean_ticks: mean(ticks),
        mean_transitions: mean(transitions),
        total_rewards: records.iter().map(|r| r.reward_total).sum(),
        violations: records.iter().map(|r| r.violations.len()).sum(),
    }
}

pub fn generate_console_report(
    out: &mut dyn Write,
    records: &[EncounterRecord],
    summary: &RunAggregate,
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Encounter Simulation Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "==============================".cyan())?;
    writeln!(out, "Runs: {}", summary.runs)?;
    writeln!(
        out,
        "Victories: {} ({:.1}%)",
        summary.victories.to_string().green(),
        summary.victory_rate() * 100.0
    )?;
    for (outcome, count) in &summary.outcomes {
        writeln!(out, "   {outcome:12} {count}")?;
    }
    writeln!(out, "Enraged: {:.1}%", summary.enrage_rate() * 100.0)?;
    writeln!(out, "Mean ticks: {:.1}", summary.mean_ticks)?;
    writeln!(out, "Mean transitions: {:.2}", summary.mean_transitions)?;
    writeln!(out, "Rewards granted: {}", summary.total_rewards)?;
    writeln!(out, "Wall time: {total_duration:?}")?;
    writeln!(out)?;

    writeln!(out, "{}", "🐉 Final phases".bright_yellow().bold())?;
    for phase in Phase::ALL {
        let count = summary.final_phases.get(phase.key()).copied().unwrap_or(0);
        writeln!(out, "   {:10} {count}", phase.display_name())?;
    }
    writeln!(out)?;

    if summary.violations == 0 {
        writeln!(out, "{}", "✅ No invariant violations".green())?;
    } else {
        writeln!(
            out,
            "{}",
            format!("❌ {} invariant violations", summary.violations).red()
        )?;
        for record in records.iter().filter(|r| !r.passed()) {
            writeln!(out, "   seed {}:", record.seed)?;
            for violation in &record.violations {
                writeln!(out, "     • {}", violation.red())?;
            }
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: String,
    summary: &'a RunAggregate,
    runs: &'a [EncounterRecord],
}

pub fn generate_json_report(
    out: &mut dyn Write,
    records: &[EncounterRecord],
    summary: &RunAggregate,
) -> Result<()> {
    let report = JsonReport {
        generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        summary,
        runs: records,
    };
    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)?;
    Ok(())
}

pub fn generate_markdown_report(
    out: &mut dyn Write,
    records: &[EncounterRecord],
    summary: &RunAggregate,
) -> Result<()> {
    writeln!(out, "# Wyrmfall Encounter Simulation\n")?;
    writeln!(
        out,
        "_Generated {}_\n",
        Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
    )?;
    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Runs**: {}", summary.runs)?;
    writeln!(
        out,
        "- **Victory rate**: {:.1}%",
        summary.victory_rate() * 100.0
    )?;
    writeln!(out, "- **Enrage rate**: {:.1}%", summary.enrage_rate() * 100.0)?;
    writeln!(out, "- **Mean ticks**: {:.1}", summary.mean_ticks)?;
    writeln!(out, "- **Invariant violations**: {}\n", summary.violations)?;

    writeln!(out, "## Runs\n")?;
    writeln!(
        out,
        "| Seed | Outcome | Final phase | Transitions | Ticks | Rewards | Status |"
    )?;
    writeln!(out, "|---|---|---|---|---|---|---|")?;
    for record in records {
        let status = if record.passed() { "✅" } else { "❌" };
        writeln!(
            out,
            "| {} | {} | {} | {} | {} | {} | {status} |",
            record.seed,
            record.outcome,
            record.final_phase,
            record.phase_transitions,
            record.ticks,
            record.reward_total
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(seed: u64, outcome: &str, phase: Phase) -> EncounterRecord {
        EncounterRecord {
            seed,
            outcome: outcome.to_string(),
            final_phase: phase,
            phase_transitions: 2,
            enraged: phase == Phase::Enraged,
            ticks: 40,
            duration_secs: 40,
            participants_left: 3,
            reward_total: if outcome == "victory" { 60 } else { 0 },
            minions_spawned: 10,
            minions_slain: 4,
            violations: Vec::new(),
        }
    }

    #[test]
    fn aggregate_counts_outcomes_and_phases() {
        let records = vec![
            record(1, "victory", Phase::Ground),
            record(2, "victory", Phase::Enraged),
            record(3, "wiped", Phase::Enraged),
        ];
        let summary = aggregate(&records);
        assert_eq!(summary.runs, 3);
        assert_eq!(summary.victories, 2);
        assert_eq!(summary.outcomes.get("wiped"), Some(&1));
        assert_eq!(summary.final_phases.get("enraged"), Some(&2));
        assert!((summary.mean_ticks - 40.0).abs() < f64::EPSILON);
        assert_eq!(summary.total_rewards, 120);
    }

    #[test]
    fn empty_aggregate_has_zero_rates() {
        let summary = aggregate(&[]);
        assert!(summary.victory_rate().abs() < f64::EPSILON);
        assert!(summary.mean_ticks.abs() < f64::EPSILON);
    }

    #[test]
    fn markdown_lists_every_run() {
        let records = vec![record(5, "victory", Phase::Aerial)];
        let mut buf = Vec::new();
        generate_markdown_report(&mut buf, &records, &aggregate(&records)).expect("render");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.contains("| 5 | victory | aerial | 2 | 40 | 60 | ✅ |"));
    }

    #[test]
    fn json_report_carries_summary_and_runs() {
        let records = vec![record(8, "boss-lost", Phase::Crystal)];
        let mut buf = Vec::new();
        generate_json_report(&mut buf, &records, &aggregate(&records)).expect("render");
        let value: serde_json::Value = serde_json::from_slice(&buf).expect("json");
        assert_eq!(value["summary"]["runs"], 1);
        assert_eq!(value["runs"][0]["final_phase"], "crystal");
    }
}
