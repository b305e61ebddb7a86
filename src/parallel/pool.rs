//! Rayon thread pool configuration for sweep workloads.
//!
//! Use [WorkerPool::install] to run trials with a fixed number of threads, or rely on
//! Rayon's default (all CPU cores).

use rayon::ThreadPoolBuilder;

use crate::error::Result;

/// Configures how many worker threads run trials.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerPool {
    /// Number of worker threads. If 0, use Rayon default (num_cpus).
    pub workers: usize,
}

impl WorkerPool {
    /// Use all available CPU cores (Rayon default).
    pub fn default_workers() -> Self {
        Self::default()
    }

    /// Use exactly `n` worker threads.
    pub fn with_workers(n: usize) -> Self {
        Self { workers: n }
    }

    /// Threads that will actually run work.
    pub fn thread_count(&self) -> usize {
        if self.workers == 0 {
            rayon::current_num_threads()
        } else {
            self.workers
        }
    }

    /// Run a closure on a thread pool with this worker count. If [workers](WorkerPool::workers)
    /// is 0, uses the global Rayon pool. Otherwise builds a dedicated pool for the call.
    pub fn install<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        if self.workers == 0 {
            Ok(f())
        } else {
            let pool = ThreadPoolBuilder::new()
                .num_threads(self.workers)
                .thread_name(|index| format!("risiko-worker-{index}"))
                .build()?;
            Ok(pool.install(f))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;

    #[test]
    fn dedicated_pool_uses_requested_threads() {
        let pool = WorkerPool::with_workers(2);
        let threads = pool.install(rayon::current_num_threads).unwrap();
        assert_eq!(threads, 2);
        assert_eq!(pool.thread_count(), 2);
    }

    #[test]
    fn default_pool_runs_parallel_iterators() {
        let total: u64 = WorkerPool::default_workers()
            .install(|| (1..=100_u64).into_par_iter().sum())
            .unwrap();
        assert_eq!(total, 5050);
    }
}
