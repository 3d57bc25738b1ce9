mod reports;
mod simulation;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use simulation::{EncounterRecord, SimulationPlan, SimulationSession};
use wyrmfall_game::EncounterConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Console,
    Json,
    Markdown,
}

#[derive(Debug, Parser)]
#[command(name = "wyrmfall-tester", version = "0.1.0")]
#[command(about = "Headless QA for Wyrmfall encounters - seeded fights against an in-memory world")]
struct Args {
    /// Seeds to run (comma-separated)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Fights per seed; iteration i runs with seed + i
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Size of the raid group
    #[arg(long, default_value_t = 4)]
    participants: usize,

    /// Base boss health before scaling
    #[arg(long, default_value_t = 200.0)]
    boss_health: f64,

    /// Health multiplier (defaults to the group-size recommendation)
    #[arg(long)]
    health_multiplier: Option<f64>,

    /// Damage multiplier (defaults to the group-size recommendation)
    #[arg(long)]
    damage_multiplier: Option<f64>,

    /// Chance per tick that a participant lands a hit
    #[arg(long, default_value_t = 0.6)]
    hit_chance: f64,

    /// Boss damage per landed hit
    #[arg(long, default_value_t = 2.0)]
    damage_per_hit: f64,

    /// Chance per tick that a participant disconnects
    #[arg(long, default_value_t = 0.0)]
    dropout: f64,

    /// Chance per tick that the group shatters an anchor crystal
    #[arg(long, default_value_t = 0.05)]
    anchor_break: f64,

    /// Give up on a fight after this many ticks
    #[arg(long, default_value_t = 1_200)]
    max_ticks: u64,

    /// Encounter tuning file (JSON); built-in tuning when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.report == ReportFormat::Console {
        announce_banner();
    }

    let start_time = Instant::now();
    let config = load_config(&args)?;
    let seeds = parse_seeds(&args.seeds)?;
    let plan = build_plan(&args)?;
    let records = run_simulations(&args, plan, config, &seeds)?;
    write_reports(&args, &records, start_time)?;

    if records.iter().any(|r| !r.passed()) {
        std::process::exit(1);
    }

    Ok(())
}

fn announce_banner() {
    println!("{}", "🐉 Wyrmfall Encounter Tester".bright_cyan().bold());
    println!("{}", "================================".cyan());
}

fn load_config(args: &Args) -> Result<EncounterConfig> {
    let Some(path) = &args.config else {
        return Ok(EncounterConfig::load_from_static());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    EncounterConfig::from_json(&raw).with_context(|| format!("invalid tuning in {}", path.display()))
}

fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn parse_seeds(raw: &str) -> Result<Vec<u64>> {
    let seeds = split_csv(raw)
        .iter()
        .map(|token| {
            token
                .parse::<u64>()
                .with_context(|| format!("seed '{token}' is not an unsigned integer"))
        })
        .collect::<Result<Vec<_>>>()?;
    if seeds.is_empty() {
        bail!("at least one seed is required");
    }
    Ok(seeds)
}

fn build_plan(args: &Args) -> Result<SimulationPlan> {
    if args.participants == 0 {
        bail!("--participants must be at least 1");
    }
    for (flag, chance) in [
        ("--hit-chance", args.hit_chance),
        ("--dropout", args.dropout),
        ("--anchor-break", args.anchor_break),
    ] {
        if !(0.0..=1.0).contains(&chance) {
            bail!("{flag} must be within [0, 1] (got {chance})");
        }
    }
    Ok(SimulationPlan {
        participants: args.participants,
        boss_health: args.boss_health,
        health_multiplier: args.health_multiplier,
        damage_multiplier: args.damage_multiplier,
        hit_chance: args.hit_chance,
        damage_per_hit: args.damage_per_hit,
        dropout_chance: args.dropout,
        anchor_break_chance: args.anchor_break,
        max_ticks: args.max_ticks,
    })
}

fn run_simulations(
    args: &Args,
    plan: SimulationPlan,
    config: EncounterConfig,
    seeds: &[u64],
) -> Result<Vec<EncounterRecord>> {
    let session = SimulationSession::new(plan, config, args.verbose);
    let mut records = Vec::with_capacity(seeds.len() * args.iterations);
    for &seed in seeds {
        for i in 0..args.iterations {
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));
            let record = session
                .run(iteration_seed)
                .with_context(|| format!("simulation failed for seed {iteration_seed}"))?;
            if args.verbose && args.report == ReportFormat::Console {
                let status = if record.passed() { "✅" } else { "❌" };
                println!(
                    "{status} [seed {}] {} - {} after {} ticks",
                    iteration_seed,
                    record.outcome.bright_white(),
                    record.final_phase,
                    record.ticks
                );
            }
            records.push(record);
        }
    }
    Ok(records)
}

fn write_reports(args: &Args, records: &[EncounterRecord], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;
    let summary = reports::aggregate(records);

    match args.report {
        ReportFormat::Json => {
            reports::generate_json_report(&mut output_target, records, &summary)?;
        }
        ReportFormat::Markdown => {
            reports::generate_markdown_report(&mut output_target, records, &summary)?;
        }
        ReportFormat::Console => {
            reports::generate_console_report(
                &mut output_target,
                records,
                &summary,
                start_time.elapsed(),
            )?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}
