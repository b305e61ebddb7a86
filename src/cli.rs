use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::combat::{entropy_seed, run_conflict, DiceKind, ForceState, PolicyFactory, RuleSet};
use crate::config::SweepConfig;
use crate::error::{Result, RisikoError};
use crate::parallel::{CancellationToken, WorkerPool};
use crate::sweep::{run_sweep, write_csv_tables, SweepStatistics};

const USAGE: &str = "usage: risiko <sweep|battle>";
const SWEEP_USAGE: &str = "usage: risiko sweep [trials] [max_units] [--seed N] [--workers N] \
[--timeout-secs N] [--out DIR] [--json]";
const BATTLE_USAGE: &str = "usage: risiko battle <attackers> <defenders> [seed]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Sweep,
    Battle,
}

pub fn parse_command(args: &[String]) -> Option<Command> {
    match args.get(1).map(String::as_str) {
        Some("sweep") => Some(Command::Sweep),
        Some("battle") => Some(Command::Battle),
        _ => None,
    }
}

pub fn run_with_args(args: &[String]) -> i32 {
    match parse_command(args) {
        Some(Command::Sweep) => handle_sweep(args),
        Some(Command::Battle) => handle_battle(args),
        None => {
            eprintln!("{USAGE}");
            2
        }
    }
}

#[derive(Debug, Default)]
struct SweepArgs {
    positionals: Vec<String>,
    seed: Option<String>,
    workers: Option<String>,
    timeout_secs: Option<String>,
    out: Option<PathBuf>,
    json: bool,
}

fn parse_sweep_args(rest: &[String]) -> std::result::Result<SweepArgs, String> {
    fn value<'a>(
        it: &mut impl Iterator<Item = &'a String>,
        flag: &str,
    ) -> std::result::Result<String, String> {
        it.next()
            .cloned()
            .ok_or_else(|| format!("missing value for {flag}"))
    }

    let mut out = SweepArgs::default();
    let mut it = rest.iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--json" => out.json = true,
            "--seed" => out.seed = Some(value(&mut it, "--seed")?),
            "--workers" => out.workers = Some(value(&mut it, "--workers")?),
            "--timeout-secs" => out.timeout_secs = Some(value(&mut it, "--timeout-secs")?),
            "--out" => out.out = Some(PathBuf::from(value(&mut it, "--out")?)),
            flag if flag.starts_with("--") => return Err(format!("unknown flag '{flag}'")),
            _ => out.positionals.push(arg.clone()),
        }
    }
    Ok(out)
}

fn sweep_config(parsed: &SweepArgs) -> Result<SweepConfig> {
    let mut config = SweepConfig::from_env()?;
    config.trials_per_cell =
        parse_u32_arg(parsed.positionals.first(), "trials", config.trials_per_cell);
    config.max_units = parse_u32_arg(parsed.positionals.get(1), "max_units", config.max_units);
    config.seed = parse_u64_arg(parsed.seed.as_ref(), "seed", config.seed);
    let workers = parse_u64_arg(parsed.workers.as_ref(), "workers", config.pool.workers as u64);
    config.pool = WorkerPool::with_workers(workers as usize);
    if parsed.timeout_secs.is_some() {
        let secs = parse_u64_arg(parsed.timeout_secs.as_ref(), "timeout-secs", 0);
        config.timeout = (secs > 0).then(|| Duration::from_secs(secs));
    }
    Ok(config)
}

/// Run the sweep on a private runtime; Ctrl-C cancels it and keeps the partial results.
fn execute_sweep(config: &SweepConfig) -> Result<(SweepStatistics, bool)> {
    let attacker = PolicyFactory::maximal_attacker(DiceKind::Fair);
    let defender = PolicyFactory::maximal_defender(DiceKind::Fair);
    let cancel = CancellationToken::new();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async {
        let interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, stopping sweep");
                interrupt.cancel();
            }
        });
        let statistics = run_sweep(config, &attacker, &defender, &cancel).await?;
        Ok::<_, RisikoError>((statistics, cancel.is_cancelled()))
    })
}

fn handle_sweep(args: &[String]) -> i32 {
    let parsed = match parse_sweep_args(args.get(2..).unwrap_or_default()) {
        Ok(parsed) => parsed,
        Err(err) => {
            eprintln!("{err}\n{SWEEP_USAGE}");
            return 2;
        }
    };
    let config = match sweep_config(&parsed) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("invalid configuration: {err}");
            return 2;
        }
    };

    let (statistics, interrupted) = match execute_sweep(&config) {
        Ok(result) => result,
        Err(err) => {
            error!(%err, "sweep failed");
            eprintln!("sweep failed: {err}");
            return 1;
        }
    };
    let complete = statistics.total_trials() == config.expected_trials();
    if interrupted || !complete {
        eprintln!(
            "partial results: {} of {} trials",
            statistics.total_trials(),
            config.expected_trials()
        );
    }

    if parsed.json {
        match serde_json::to_string_pretty(&statistics.reports()) {
            Ok(payload) => println!("{payload}"),
            Err(err) => {
                eprintln!("failed to serialize sweep statistics: {err}");
                return 1;
            }
        }
        return 0;
    }

    let dir = parsed.out.unwrap_or_else(|| PathBuf::from("."));
    match write_csv_tables(&statistics, config.max_units, config.rules, &dir) {
        Ok(paths) => {
            for path in paths {
                println!("wrote {}", path.display());
            }
            0
        }
        Err(err) => {
            eprintln!("failed to write CSV tables: {err}");
            1
        }
    }
}

#[derive(Debug, Serialize)]
struct BattleReport {
    seed: u64,
    initial: ForceState,
    final_state: ForceState,
    attacker_won: bool,
}

fn handle_battle(args: &[String]) -> i32 {
    let units = |index: usize| args.get(index).and_then(|raw| raw.parse::<u32>().ok());
    let (Some(attackers), Some(defenders)) = (units(2), units(3)) else {
        eprintln!("{BATTLE_USAGE}");
        return 2;
    };
    let seed = match args.get(4) {
        Some(_) => parse_u64_arg(args.get(4), "seed", 0),
        None => match entropy_seed() {
            Ok(seed) => seed,
            Err(err) => {
                eprintln!("battle failed: {err}");
                return 1;
            }
        },
    };

    let initial = ForceState::new(attackers, defenders);
    let result = run_conflict(
        initial,
        &PolicyFactory::maximal_attacker(DiceKind::Fair),
        &PolicyFactory::maximal_defender(DiceKind::Fair),
        seed,
    );
    let final_state = match result {
        Ok(state) => state,
        Err(err) => {
            eprintln!("battle failed: {err}");
            return 1;
        }
    };
    info!(%initial, %final_state, "battle finished");

    let report = BattleReport {
        seed,
        initial,
        final_state,
        attacker_won: RuleSet::STANDARD.attacker_won(final_state),
    };
    match serde_json::to_string_pretty(&report) {
        Ok(payload) => {
            println!("{payload}");
            0
        }
        Err(err) => {
            eprintln!("failed to serialize battle result: {err}");
            1
        }
    }
}

fn parse_u32_arg(raw: Option<&String>, name: &str, default: u32) -> u32 {
    raw.and_then(|value| value.parse::<u32>().ok())
        .unwrap_or_else(|| {
            if let Some(value) = raw {
                eprintln!("invalid {name} '{value}', defaulting to {default}");
            }
            default
        })
}

fn parse_u64_arg(raw: Option<&String>, name: &str, default: u64) -> u64 {
    raw.and_then(|value| value.parse::<u64>().ok())
        .unwrap_or_else(|| {
            if let Some(value) = raw {
                eprintln!("invalid {name} '{value}', defaulting to {default}");
            }
            default
        })
}
