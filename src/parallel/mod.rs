pub mod batch;
pub mod cancel;
pub mod pool;
pub mod progress;

pub use batch::{batch_ranges, trial_jobs, TrialJob};
pub use cancel::CancellationToken;
pub use pool::WorkerPool;
pub use progress::Progress;
