//! Run one sweep on a single worker and one on the full pool, then print timings and speedup.
//!
//! Usage: cargo run --release --bin benchmark_parallel_speedup [trials] [max_units]

use std::time::Instant;

use risiko::combat::{DiceKind, PolicyFactory};
use risiko::config::SweepConfig;
use risiko::parallel::CancellationToken;
use risiko::sweep::run_sweep_blocking;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let trials = args.get(1).and_then(|v| v.parse().ok()).unwrap_or(1_000u32);
    let max_units = args.get(2).and_then(|v| v.parse().ok()).unwrap_or(20u32);
    let seed = 12345u64;

    let attacker = PolicyFactory::maximal_attacker(DiceKind::Fair);
    let defender = PolicyFactory::maximal_defender(DiceKind::Fair);
    let cancel = CancellationToken::new();
    let config = SweepConfig::new(trials, max_units).with_seed(seed);
    let total = config.expected_trials();

    println!(
        "Sweep: {} cells x {} trials (max_units={}, workers={})",
        config.cell_count(),
        trials,
        max_units,
        config.pool.thread_count()
    );
    println!();

    let sequential = config.clone().with_workers(1);
    let t0 = Instant::now();
    let results_seq = run_sweep_blocking(&sequential, &attacker, &defender, &cancel)
        .expect("sequential sweep failed");
    let elapsed_seq = t0.elapsed();
    let seq_ms = elapsed_seq.as_secs_f64() * 1000.0;
    println!(
        "Sequential:  {:.2} ms  ({:.1} trials/s)",
        seq_ms,
        total as f64 / elapsed_seq.as_secs_f64()
    );

    let t0 = Instant::now();
    let results_par =
        run_sweep_blocking(&config, &attacker, &defender, &cancel).expect("parallel sweep failed");
    let elapsed_par = t0.elapsed();
    let par_ms = elapsed_par.as_secs_f64() * 1000.0;
    println!(
        "Parallel:    {:.2} ms  ({:.1} trials/s)",
        par_ms,
        total as f64 / elapsed_par.as_secs_f64()
    );

    println!();
    println!("Speedup:     {:.2}x faster (parallel vs sequential)", seq_ms / par_ms);

    assert_eq!(results_seq, results_par, "sequential and parallel statistics differ");
    println!("(Results match sequential vs parallel)");
}
