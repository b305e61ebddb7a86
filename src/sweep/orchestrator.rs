//! Fan trials out over the worker pool and fold their outcomes into [SweepStatistics].
//!
//! Workers push every finished trial through a bounded channel; a single aggregation loop
//! owns the statistics, so nothing on the write side needs a lock. The loop stops on the
//! last expected outcome, on the first trial error, on cancellation or on timeout, and in
//! every case raises the halt flag so workers drop whatever they have not started yet.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::combat::{
    run_conflict_with_rules, stream_seed, ForceState, PolicyFactory, RuleSet, TrialOutcome,
};
use crate::config::SweepConfig;
use crate::error::{RisikoError, Result};
use crate::parallel::{trial_jobs, CancellationToken, Progress, TrialJob};
use crate::sweep::statistics::SweepStatistics;

type TrialMessage = Result<TrialOutcome>;

/// Every starting state of the sweep, defenders in the outer loop as the report tables
/// are laid out.
pub fn sweep_cells(config: &SweepConfig) -> Vec<ForceState> {
    config
        .defender_range()
        .flat_map(|defenders| {
            config
                .attacker_range()
                .map(move |attackers| ForceState::new(attackers, defenders))
        })
        .collect()
}

/// Seed of one trial's dice streams. Depends only on the sweep seed, the cell and the trial
/// index, so results do not depend on which worker ran the trial.
pub fn trial_seed(base: u64, initial: ForceState, trial: usize) -> u64 {
    stream_seed(
        base,
        &[
            u64::from(initial.attackers),
            u64::from(initial.defenders),
            trial as u64,
        ],
    )
}

/// Everything a worker needs besides the job itself.
struct JobContext {
    attacker: PolicyFactory,
    defender: PolicyFactory,
    rules: RuleSet,
    seed: u64,
    halt: Arc<AtomicBool>,
    cancel: CancellationToken,
}

impl JobContext {
    fn should_stop(&self) -> bool {
        self.halt.load(Ordering::Relaxed) || self.cancel.is_cancelled()
    }

    fn run_trial(&self, initial: ForceState, trial: usize) -> TrialMessage {
        let seed = trial_seed(self.seed, initial, trial);
        run_conflict_with_rules(initial, &self.attacker, &self.defender, seed, self.rules)
            .map(|final_state| TrialOutcome {
                initial,
                final_state,
            })
            .map_err(|err| RisikoError::trial_failure(initial, err))
    }

    fn run_job(&self, job: TrialJob, sink: &mut mpsc::Sender<TrialMessage>) {
        for trial in job.start..job.end {
            if self.should_stop() {
                debug!(initial = %job.initial, trial, "job halted");
                return;
            }
            let message = self.run_trial(job.initial, trial);
            let failed = message.is_err();
            // A closed channel means the aggregator has already returned.
            if sink.blocking_send(message).is_err() || failed {
                return;
            }
        }
        debug!(initial = %job.initial, trials = job.len(), "job finished");
    }
}

/// Raises the halt flag when the aggregator goes away, however it leaves.
struct HaltOnDrop(Arc<AtomicBool>);

impl Drop for HaltOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

fn spawn_workers(
    config: &SweepConfig,
    jobs: Vec<TrialJob>,
    context: JobContext,
    sink: mpsc::Sender<TrialMessage>,
) -> JoinHandle<Result<()>> {
    let pool = config.pool;
    tokio::task::spawn_blocking(move || {
        pool.install(|| {
            jobs.into_par_iter()
                .for_each_with(sink, |sink, job| context.run_job(job, sink));
        })
    })
}

async fn join_workers(workers: JoinHandle<Result<()>>) -> Result<()> {
    match workers.await {
        Ok(result) => result,
        Err(err) if err.is_panic() => Err(RisikoError::WorkerFailed(format!(
            "a trial worker panicked: {err}"
        ))),
        Err(err) => Err(RisikoError::WorkerFailed(err.to_string())),
    }
}

/// The channel closed before the last expected outcome. Workers only give up early when the
/// token fired after the aggregator last looked at it; anything else is a lost worker.
fn workers_gone(
    statistics: SweepStatistics,
    progress: &Progress,
    cancelled: bool,
) -> Result<SweepStatistics> {
    if cancelled {
        warn!(done = progress.done(), "sweep cancelled, returning partial statistics");
        return Ok(statistics);
    }
    Err(RisikoError::WorkerFailed(format!(
        "workers stopped after {} of {} trials",
        progress.done(),
        progress.total()
    )))
}

async fn deadline_reached(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}

/// Run `config.trials_per_cell` trials for every cell and aggregate them.
///
/// Returns the complete statistics, the first trial error wrapped in
/// [RisikoError::TrialFailure], or, when `cancel` fires or the configured timeout elapses,
/// whatever was aggregated up to that point.
pub async fn run_sweep(
    config: &SweepConfig,
    attacker: &PolicyFactory,
    defender: &PolicyFactory,
    cancel: &CancellationToken,
) -> Result<SweepStatistics> {
    config.validate()?;

    let mut statistics = SweepStatistics::default();
    let expected = config.expected_trials();
    if expected == 0 {
        info!(
            max_units = config.max_units,
            trials_per_cell = config.trials_per_cell,
            "empty sweep, nothing to simulate"
        );
        return Ok(statistics);
    }

    let cells = sweep_cells(config);
    let jobs = trial_jobs(
        &cells,
        config.trials_per_cell as usize,
        config.chunks_per_cell,
    );
    info!(
        cells = cells.len(),
        jobs = jobs.len(),
        trials = expected,
        workers = config.pool.thread_count(),
        seed = config.seed,
        "starting sweep"
    );

    let halt = Arc::new(AtomicBool::new(false));
    let _halt_guard = HaltOnDrop(Arc::clone(&halt));
    let (sink, mut outcomes) = mpsc::channel(config.channel_capacity);
    let context = JobContext {
        attacker: attacker.clone(),
        defender: defender.clone(),
        rules: config.rules,
        seed: config.seed,
        halt: Arc::clone(&halt),
        cancel: cancel.clone(),
    };
    let workers = spawn_workers(config, jobs, context, sink);

    let cancelled = cancel.cancelled();
    tokio::pin!(cancelled);
    let timed_out = deadline_reached(config.timeout.map(|timeout| Instant::now() + timeout));
    tokio::pin!(timed_out);
    let mut progress = Progress::new(expected);

    loop {
        tokio::select! {
            biased;
            _ = &mut cancelled => {
                warn!(done = progress.done(), total = expected, "sweep cancelled, returning partial statistics");
                return Ok(statistics);
            }
            _ = &mut timed_out => {
                warn!(done = progress.done(), total = expected, "sweep timed out, returning partial statistics");
                return Ok(statistics);
            }
            message = outcomes.recv() => match message {
                Some(Ok(outcome)) => {
                    statistics.record(outcome, config.rules);
                    progress.advance();
                    if progress.is_complete() {
                        break;
                    }
                }
                Some(Err(err)) => {
                    error!(%err, "trial failed, aborting sweep");
                    return Err(err);
                }
                None => {
                    join_workers(workers).await?;
                    return workers_gone(statistics, &progress, cancel.is_cancelled());
                }
            }
        }
    }

    halt.store(true, Ordering::Relaxed);
    join_workers(workers).await?;
    info!(cells = statistics.len(), trials = statistics.total_trials(), "sweep finished");
    Ok(statistics)
}

/// [run_sweep] on a private Tokio runtime, for callers without one.
pub fn run_sweep_blocking(
    config: &SweepConfig,
    attacker: &PolicyFactory,
    defender: &PolicyFactory,
    cancel: &CancellationToken,
) -> Result<SweepStatistics> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run_sweep(config, attacker, defender, cancel))
}
