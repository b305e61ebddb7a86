use thiserror::Error;

use crate::combat::{ForceState, Role};

#[derive(Error, Debug)]
pub enum RisikoError {
    #[error("invalid dice count {0}: cannot roll a negative number of dice")]
    InvalidCount(i32),

    #[error("invalid die face {0}: faces run from 1 to 6")]
    InvalidFace(u8),

    #[error("scripted dice need at least one face")]
    EmptyScript,

    #[error("{role} cannot commit dice with {units} unit(s)")]
    InsufficientForce { role: Role, units: u32 },

    #[error("{role} committed {requested} dice with only {units} unit(s)")]
    OverCommitment {
        role: Role,
        requested: i32,
        units: u32,
    },

    #[error("{role} dice source threw {rolled} dice when {requested} were committed")]
    DiceMismatch {
        role: Role,
        requested: i32,
        rolled: usize,
    },

    #[error("round at {state} compared no dice")]
    StalledRound { state: ForceState },

    #[error("trial starting at {initial} failed: {source}")]
    TrialFailure {
        initial: ForceState,
        #[source]
        source: Box<RisikoError>,
    },

    #[error("invalid sweep configuration: {0}")]
    InvalidConfig(String),

    #[error("worker pool error: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("trial workers failed: {0}")]
    WorkerFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl RisikoError {
    /// Wrap a conflict error with the initial state of the trial that raised it.
    pub fn trial_failure(initial: ForceState, source: RisikoError) -> Self {
        Self::TrialFailure {
            initial,
            source: Box::new(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, RisikoError>;
