pub mod export_csv;
pub mod orchestrator;
pub mod statistics;

pub use export_csv::{
    attackers_left_table, expected_attackers_left_table, victory_table, write_csv_tables, Table,
};
pub use orchestrator::{run_sweep, run_sweep_blocking, sweep_cells, trial_seed};
pub use statistics::{CellReport, SweepStatistic, SweepStatistics};
