//! Progress accounting for the aggregator. Logs every time another tenth of the work
//! is done so long sweeps show signs of life without flooding the log.

use tracing::info;

const REPORT_STEPS: u64 = 10;

#[derive(Debug, Clone)]
pub struct Progress {
    done: u64,
    total: u64,
    reported_step: u64,
}

impl Progress {
    pub fn new(total: u64) -> Self {
        Self {
            done: 0,
            total,
            reported_step: 0,
        }
    }

    pub fn done(&self) -> u64 {
        self.done
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn is_complete(&self) -> bool {
        self.done >= self.total
    }

    /// Count one finished unit, logging when a new tenth is crossed.
    pub fn advance(&mut self) {
        self.done += 1;
        if self.total == 0 {
            return;
        }
        let step = self.done * REPORT_STEPS / self.total;
        if step > self.reported_step {
            self.reported_step = step;
            let percent = step * 100 / REPORT_STEPS;
            info!(done = self.done, total = self.total, "sweep {percent}% complete");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steps_crossed(progress: &mut Progress, units: usize) -> Vec<u64> {
        (0..units)
            .filter_map(|_| {
                let before = progress.reported_step;
                progress.advance();
                (progress.reported_step > before).then_some(progress.reported_step)
            })
            .collect()
    }

    #[test]
    fn reports_each_tenth_once() {
        let mut progress = Progress::new(20);
        assert_eq!(steps_crossed(&mut progress, 20), (1..=10).collect::<Vec<_>>());
        assert!(progress.is_complete());
        assert_eq!(progress.done(), 20);
    }

    #[test]
    fn small_totals_skip_intermediate_steps() {
        let mut progress = Progress::new(3);
        assert_eq!(steps_crossed(&mut progress, 3), vec![3, 6, 10]);
    }

    #[test]
    fn zero_total_never_reports() {
        let mut progress = Progress::new(0);
        progress.advance();
        assert_eq!(progress.reported_step, 0);
        assert!(progress.is_complete());
    }
}
