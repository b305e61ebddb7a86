//! Batch distribution for parallel sweeps.
//!
//! A sweep is cut into jobs: one job is a contiguous range of trial indices for one cell.
//! Several jobs per cell let large cells spread over all workers.

use crate::combat::ForceState;

/// Split `total` items into up to `num_batches` ranges `[start, end)`.
/// Batches are as equal in size as possible; later batches may be smaller.
///
/// # Example
/// ```
/// # use risiko::parallel::batch_ranges;
/// let ranges = batch_ranges(100, 4);
/// assert_eq!(ranges, vec![(0, 25), (25, 50), (50, 75), (75, 100)]);
/// ```
pub fn batch_ranges(total: usize, num_batches: usize) -> Vec<(usize, usize)> {
    if total == 0 || num_batches == 0 {
        return Vec::new();
    }
    let num_batches = num_batches.min(total);
    let base = total / num_batches;
    let remainder = total % num_batches;
    let mut ranges = Vec::with_capacity(num_batches);
    let mut start = 0;
    for i in 0..num_batches {
        let size = base + if i < remainder { 1 } else { 0 };
        let end = start + size;
        ranges.push((start, end));
        start = end;
    }
    ranges
}

/// A run of trials for one starting state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialJob {
    pub initial: ForceState,
    pub start: usize,
    pub end: usize,
}

impl TrialJob {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Jobs covering `trials_per_cell` trials for each initial state, `chunks_per_cell` jobs
/// at most per state.
pub fn trial_jobs(
    cells: &[ForceState],
    trials_per_cell: usize,
    chunks_per_cell: usize,
) -> Vec<TrialJob> {
    let ranges = batch_ranges(trials_per_cell, chunks_per_cell);
    cells
        .iter()
        .flat_map(|initial| {
            ranges.iter().map(move |&(start, end)| TrialJob {
                initial: *initial,
                start,
                end,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uneven_trial_counts_front_load_the_remainder() {
        assert_eq!(batch_ranges(10, 4), vec![(0, 3), (3, 6), (6, 8), (8, 10)]);
        assert_eq!(batch_ranges(7, 7).len(), 7);
    }

    #[test]
    fn never_emits_empty_chunks() {
        assert_eq!(batch_ranges(2, 4), vec![(0, 1), (1, 2)]);
        assert!(batch_ranges(0, 4).is_empty());
        assert!(batch_ranges(5, 0).is_empty());
    }

    #[test]
    fn trial_jobs_cover_every_trial_once() {
        let cells = [ForceState::new(2, 1), ForceState::new(3, 1)];
        let jobs = trial_jobs(&cells, 10, 3);
        assert_eq!(jobs.len(), 6);
        for cell in cells {
            let covered: usize = jobs
                .iter()
                .filter(|job| job.initial == cell)
                .map(TrialJob::len)
                .sum();
            assert_eq!(covered, 10);
        }
        assert!(jobs.iter().all(|job| !job.is_empty()));
    }

    #[test]
    fn no_trials_means_no_jobs() {
        assert!(trial_jobs(&[ForceState::new(2, 2)], 0, 4).is_empty());
    }
}
