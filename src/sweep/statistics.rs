//! Per-cell aggregates of a sweep. Only the aggregator writes to these, one outcome at a time.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::combat::{ForceState, RuleSet, TrialOutcome};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepStatistic {
    pub trial_count: u64,
    pub attacker_win_count: u64,
    pub total_attacker_units_remaining: u64,
    /// Part of `total_attacker_units_remaining` coming from trials the attacker won.
    pub winning_attacker_units_remaining: u64,
}

impl SweepStatistic {
    pub fn record(&mut self, final_state: ForceState, rules: RuleSet) {
        let remaining = u64::from(final_state.attackers);
        self.trial_count += 1;
        self.total_attacker_units_remaining += remaining;
        if rules.attacker_won(final_state) {
            self.attacker_win_count += 1;
            self.winning_attacker_units_remaining += remaining;
        }
    }

    /// Share of trials the attacker won.
    pub fn win_rate(&self) -> Option<f64> {
        ratio(self.attacker_win_count, self.trial_count)
    }

    /// Mean attackers still standing in the trials the attacker won.
    pub fn attackers_left_when_won(&self) -> Option<f64> {
        ratio(self.winning_attacker_units_remaining, self.attacker_win_count)
    }

    /// Mean share of the starting attack force that survives, wins and losses alike.
    pub fn expected_attackers_left_ratio(&self, initial_attackers: u32) -> Option<f64> {
        ratio(
            self.total_attacker_units_remaining,
            self.trial_count * u64::from(initial_attackers),
        )
    }
}

fn ratio(numerator: u64, denominator: u64) -> Option<f64> {
    if denominator == 0 {
        None
    } else {
        Some(numerator as f64 / denominator as f64)
    }
}

/// All cells of a sweep keyed by their initial force state, in (attackers, defenders) order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepStatistics {
    cells: BTreeMap<ForceState, SweepStatistic>,
}

impl SweepStatistics {
    pub fn record(&mut self, outcome: TrialOutcome, rules: RuleSet) {
        self.cells
            .entry(outcome.initial)
            .or_default()
            .record(outcome.final_state, rules);
    }

    pub fn get(&self, attackers: u32, defenders: u32) -> Option<&SweepStatistic> {
        self.cells.get(&ForceState::new(attackers, defenders))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ForceState, &SweepStatistic)> {
        self.cells.iter()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn total_trials(&self) -> u64 {
        self.cells.values().map(|cell| cell.trial_count).sum()
    }

    pub fn reports(&self) -> Vec<CellReport> {
        self.iter()
            .map(|(initial, stat)| CellReport::new(*initial, stat))
            .collect()
    }
}

/// Flat, serializable view of one cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellReport {
    pub attackers: u32,
    pub defenders: u32,
    pub trials: u64,
    pub attacker_wins: u64,
    pub total_attacker_units_remaining: u64,
    pub win_rate: Option<f64>,
    pub attackers_left_when_won: Option<f64>,
    pub expected_attackers_left_ratio: Option<f64>,
}

impl CellReport {
    pub fn new(initial: ForceState, stat: &SweepStatistic) -> Self {
        Self {
            attackers: initial.attackers,
            defenders: initial.defenders,
            trials: stat.trial_count,
            attacker_wins: stat.attacker_win_count,
            total_attacker_units_remaining: stat.total_attacker_units_remaining,
            win_rate: stat.win_rate(),
            attackers_left_when_won: stat.attackers_left_when_won(),
            expected_attackers_left_ratio: stat.expected_attackers_left_ratio(initial.attackers),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(initial: (u32, u32), final_state: (u32, u32)) -> TrialOutcome {
        TrialOutcome {
            initial: ForceState::new(initial.0, initial.1),
            final_state: ForceState::new(final_state.0, final_state.1),
        }
    }

    #[test]
    fn records_wins_and_remaining_units() {
        let mut stats = SweepStatistics::default();
        let rules = RuleSet::STANDARD;
        stats.record(outcome((5, 2), (4, 0)), rules);
        stats.record(outcome((5, 2), (1, 2)), rules);
        stats.record(outcome((5, 2), (2, 0)), rules);

        let cell = stats.get(5, 2).expect("cell should exist");
        assert_eq!(cell.trial_count, 3);
        assert_eq!(cell.attacker_win_count, 2);
        assert_eq!(cell.total_attacker_units_remaining, 7);
        assert_eq!(cell.winning_attacker_units_remaining, 6);
        assert_eq!(cell.attackers_left_when_won(), Some(3.0));
        assert!((cell.win_rate().unwrap() - 2.0 / 3.0).abs() < 1e-12);
        assert!((cell.expected_attackers_left_ratio(5).unwrap() - 7.0 / 15.0).abs() < 1e-12);
    }

    #[test]
    fn cells_are_kept_apart() {
        let mut stats = SweepStatistics::default();
        stats.record(outcome((2, 1), (2, 0)), RuleSet::STANDARD);
        stats.record(outcome((3, 1), (1, 1)), RuleSet::STANDARD);
        assert_eq!(stats.len(), 2);
        assert_eq!(stats.total_trials(), 2);
        assert_eq!(stats.get(3, 1).unwrap().attacker_win_count, 0);
        assert!(stats.get(3, 2).is_none());
    }

    #[test]
    fn empty_cell_has_no_rates() {
        let stat = SweepStatistic::default();
        assert_eq!(stat.win_rate(), None);
        assert_eq!(stat.attackers_left_when_won(), None);
        assert_eq!(stat.expected_attackers_left_ratio(4), None);
    }

    #[test]
    fn reports_follow_attacker_then_defender_order() {
        let mut stats = SweepStatistics::default();
        stats.record(outcome((3, 1), (3, 0)), RuleSet::STANDARD);
        stats.record(outcome((2, 2), (1, 2)), RuleSet::STANDARD);
        let reports = stats.reports();
        assert_eq!((reports[0].attackers, reports[0].defenders), (2, 2));
        assert_eq!((reports[1].attackers, reports[1].defenders), (3, 1));
        assert_eq!(reports[1].win_rate, Some(1.0));
    }
}
