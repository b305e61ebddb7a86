//! Sweep configuration: defaults, environment overrides and validation.

use std::env;
use std::time::Duration;

use tracing::warn;

use crate::combat::{entropy_seed, RuleSet};
use crate::error::{RisikoError, Result};
use crate::parallel::WorkerPool;

pub const DEFAULT_TRIALS_PER_CELL: u32 = 10_000;
pub const DEFAULT_MAX_UNITS: u32 = 20;
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;
pub const DEFAULT_CHUNKS_PER_CELL: usize = 4;

pub const MAX_TRIALS_PER_CELL: u32 = 10_000_000;
pub const MAX_UNITS_PER_SIDE: u32 = 500;

pub const ENV_TRIALS: &str = "RISIKO_TRIALS";
pub const ENV_MAX_UNITS: &str = "RISIKO_MAX_UNITS";
pub const ENV_SEED: &str = "RISIKO_SEED";
pub const ENV_WORKERS: &str = "RISIKO_WORKERS";
pub const ENV_TIMEOUT_SECS: &str = "RISIKO_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq)]
pub struct SweepConfig {
    pub trials_per_cell: u32,
    /// Largest starting force on either side; cells run from 1 (defenders) or the minimum
    /// attack commitment (attackers) up to this value.
    pub max_units: u32,
    /// Base seed every trial stream is derived from.
    pub seed: u64,
    pub rules: RuleSet,
    pub pool: WorkerPool,
    /// Stop and return partial statistics after this long.
    pub timeout: Option<Duration>,
    pub channel_capacity: usize,
    pub chunks_per_cell: usize,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            trials_per_cell: DEFAULT_TRIALS_PER_CELL,
            max_units: DEFAULT_MAX_UNITS,
            seed: 0,
            rules: RuleSet::STANDARD,
            pool: WorkerPool::default_workers(),
            timeout: None,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            chunks_per_cell: DEFAULT_CHUNKS_PER_CELL,
        }
    }
}

impl SweepConfig {
    pub fn new(trials_per_cell: u32, max_units: u32) -> Self {
        Self {
            trials_per_cell,
            max_units,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.pool = WorkerPool::with_workers(workers);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Defaults, a fresh OS seed, then any `RISIKO_*` variables that parse.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default().with_seed(entropy_seed()?);
        if let Some(trials) = env_value::<u32>(ENV_TRIALS) {
            config.trials_per_cell = trials;
        }
        if let Some(max_units) = env_value::<u32>(ENV_MAX_UNITS) {
            config.max_units = max_units;
        }
        if let Some(seed) = env_value::<u64>(ENV_SEED) {
            config.seed = seed;
        }
        if let Some(workers) = env_value::<usize>(ENV_WORKERS) {
            config.pool = WorkerPool::with_workers(workers);
        }
        if let Some(secs) = env_value::<u64>(ENV_TIMEOUT_SECS) {
            config.timeout = Some(Duration::from_secs(secs));
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.trials_per_cell > MAX_TRIALS_PER_CELL {
            return Err(RisikoError::InvalidConfig(format!(
                "trials_per_cell {} exceeds the limit of {MAX_TRIALS_PER_CELL}",
                self.trials_per_cell
            )));
        }
        if self.max_units > MAX_UNITS_PER_SIDE {
            return Err(RisikoError::InvalidConfig(format!(
                "max_units {} exceeds the limit of {MAX_UNITS_PER_SIDE}",
                self.max_units
            )));
        }
        if self.channel_capacity == 0 {
            return Err(RisikoError::InvalidConfig(
                "channel_capacity must be at least 1".to_string(),
            ));
        }
        if self.chunks_per_cell == 0 {
            return Err(RisikoError::InvalidConfig(
                "chunks_per_cell must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn attacker_range(&self) -> std::ops::RangeInclusive<u32> {
        self.rules.min_attack_commitment..=self.max_units
    }

    pub fn defender_range(&self) -> std::ops::RangeInclusive<u32> {
        1..=self.max_units
    }

    pub fn cell_count(&self) -> u64 {
        self.attacker_range().count() as u64 * self.defender_range().count() as u64
    }

    pub fn expected_trials(&self) -> u64 {
        self.cell_count() * u64::from(self.trials_per_cell)
    }
}

fn env_value<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("ignoring {name}='{raw}': not a valid number");
            None
        }
    }
}
