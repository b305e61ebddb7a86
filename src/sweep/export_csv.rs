//! CSV tables of a finished sweep: one row per defender count, one column per attacker count.
//!
//! Three tables are produced:
//! - victory percentage (share of trials the attacker won),
//! - attackers left when the attacker won,
//! - expected attackers left as a share of the initial attack force.
//!
//! Cells without data (cancelled sweeps, or no wins for the second table) are left empty.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::combat::{ForceState, RuleSet};
use crate::error::Result;
use crate::sweep::statistics::{SweepStatistic, SweepStatistics};

pub const VICTORY_FILE: &str = "victory_percentage.csv";
pub const ATTACKERS_LEFT_FILE: &str = "attackers_left.csv";
pub const EXPECTED_ATTACKERS_LEFT_FILE: &str = "expected_attackers_left_percentage.csv";

const CORNER_HEADER: &str = "nUnits";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(&self.header)?;
        for row in &self.rows {
            csv_writer.write_record(row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

fn build_table<F>(
    statistics: &SweepStatistics,
    max_units: u32,
    rules: RuleSet,
    metric: F,
) -> Table
where
    F: Fn(ForceState, &SweepStatistic) -> Option<f64>,
{
    let attackers = rules.min_attack_commitment..=max_units;
    let header = std::iter::once(CORNER_HEADER.to_string())
        .chain(attackers.clone().map(|a| a.to_string()))
        .collect();

    let rows = (1..=max_units)
        .map(|defenders| {
            std::iter::once(defenders.to_string())
                .chain(attackers.clone().map(|attackers| {
                    statistics
                        .get(attackers, defenders)
                        .and_then(|stat| metric(ForceState::new(attackers, defenders), stat))
                        .map(|value| format!("{value:.6}"))
                        .unwrap_or_default()
                }))
                .collect()
        })
        .collect();

    Table { header, rows }
}

pub fn victory_table(statistics: &SweepStatistics, max_units: u32, rules: RuleSet) -> Table {
    build_table(statistics, max_units, rules, |_, stat| stat.win_rate())
}

pub fn attackers_left_table(statistics: &SweepStatistics, max_units: u32, rules: RuleSet) -> Table {
    build_table(statistics, max_units, rules, |_, stat| {
        stat.attackers_left_when_won()
    })
}

pub fn expected_attackers_left_table(
    statistics: &SweepStatistics,
    max_units: u32,
    rules: RuleSet,
) -> Table {
    build_table(statistics, max_units, rules, |initial, stat| {
        stat.expected_attackers_left_ratio(initial.attackers)
    })
}

/// Write all three tables into `dir` (created if missing) and return the written paths.
pub fn write_csv_tables(
    statistics: &SweepStatistics,
    max_units: u32,
    rules: RuleSet,
    dir: &Path,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let tables = [
        (VICTORY_FILE, victory_table(statistics, max_units, rules)),
        (ATTACKERS_LEFT_FILE, attackers_left_table(statistics, max_units, rules)),
        (
            EXPECTED_ATTACKERS_LEFT_FILE,
            expected_attackers_left_table(statistics, max_units, rules),
        ),
    ];

    let mut written = Vec::with_capacity(tables.len());
    for (name, table) in tables {
        let path = dir.join(name);
        table.write_to(File::create(&path)?)?;
        written.push(path);
    }
    info!(dir = %dir.display(), files = written.len(), "CSV tables written");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::TrialOutcome;

    fn sample() -> SweepStatistics {
        let mut stats = SweepStatistics::default();
        let rules = RuleSet::STANDARD;
        let record = |stats: &mut SweepStatistics, a, d, fa, fd| {
            stats.record(
                TrialOutcome {
                    initial: ForceState::new(a, d),
                    final_state: ForceState::new(fa, fd),
                },
                rules,
            )
        };
        record(&mut stats, 2, 1, 2, 0);
        record(&mut stats, 2, 1, 1, 1);
        record(&mut stats, 3, 1, 3, 0);
        record(&mut stats, 3, 2, 1, 1);
        stats
    }

    #[test]
    fn victory_table_has_one_column_per_attacker_count() {
        let table = victory_table(&sample(), 3, RuleSet::STANDARD);
        assert_eq!(table.header, vec!["nUnits", "2", "3"]);
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[0], vec!["1", "0.500000", "1.000000"]);
        assert_eq!(table.rows[1], vec!["2", "", "0.000000"]);
        assert_eq!(table.rows[2], vec!["3", "", ""]);
    }

    #[test]
    fn attackers_left_table_skips_cells_without_wins() {
        let table = attackers_left_table(&sample(), 3, RuleSet::STANDARD);
        assert_eq!(table.rows[0], vec!["1", "2.000000", "3.000000"]);
        assert_eq!(table.rows[1][2], "");
    }

    #[test]
    fn expected_table_divides_by_initial_force() {
        let table = expected_attackers_left_table(&sample(), 3, RuleSet::STANDARD);
        assert_eq!(table.rows[0], vec!["1", "0.750000", "1.000000"]);
        assert_eq!(table.rows[1][2], "0.333333");
    }

    #[test]
    fn tables_serialize_as_csv() {
        let mut buffer = Vec::new();
        victory_table(&sample(), 2, RuleSet::STANDARD)
            .write_to(&mut buffer)
            .unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text, "nUnits,2\n1,0.500000\n2,\n");
    }
}
