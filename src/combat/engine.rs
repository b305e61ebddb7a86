//! Round resolution and the conflict loop.
//!
//! A conflict runs rounds until the attacker can no longer commit dice or the defender is
//! wiped out. Each round both policies see the current [ForceState], propose a die count,
//! their dice sources throw, and [resolve_round] turns the throws into losses.

use std::fmt;

use serde::Serialize;

use crate::combat::dice::{DiceSet, DiceSource};
use crate::combat::policy::{DecisionPolicy, PolicyFactory};
use crate::combat::rng::stream_seed;
use crate::error::{RisikoError, Result};

/// Most dice either side may throw in one round.
pub const RULE_MAX_DICE: u32 = 3;
/// Fewest units an attacker needs to launch an attack (one unit always stays behind).
pub const RULE_MIN_ATTACK: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Role {
    Attacker,
    Defender,
}

impl Role {
    fn stream_id(self) -> u64 {
        match self {
            Self::Attacker => 0,
            Self::Defender => 1,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attacker => f.write_str("attacker"),
            Self::Defender => f.write_str("defender"),
        }
    }
}

/// Remaining units on both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
pub struct ForceState {
    pub attackers: u32,
    pub defenders: u32,
}

impl ForceState {
    pub const fn new(attackers: u32, defenders: u32) -> Self {
        Self {
            attackers,
            defenders,
        }
    }

    pub fn units(self, role: Role) -> u32 {
        match role {
            Role::Attacker => self.attackers,
            Role::Defender => self.defenders,
        }
    }

    /// State after applying one round of losses. Losses never exceed the dice compared,
    /// and [fight] only compares throws no larger than each side's units.
    pub fn after(self, outcome: RoundOutcome) -> Self {
        Self {
            attackers: self.attackers - outcome.attacker_loss,
            defenders: self.defenders - outcome.defender_loss,
        }
    }
}

impl fmt::Display for ForceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} vs {}", self.attackers, self.defenders)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RoundOutcome {
    pub attacker_loss: u32,
    pub defender_loss: u32,
}

impl RoundOutcome {
    pub fn total(self) -> u32 {
        self.attacker_loss + self.defender_loss
    }
}

/// The rule variant in force for a conflict or a sweep.
///
/// Only the standard variant exists: an attack needs [RULE_MIN_ATTACK] units, and the
/// attacker wins when it still holds that many units at the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleSet {
    pub min_attack_commitment: u32,
}

impl RuleSet {
    pub const STANDARD: Self = Self {
        min_attack_commitment: RULE_MIN_ATTACK,
    };

    pub fn is_terminal(self, state: ForceState) -> bool {
        state.attackers < self.min_attack_commitment || state.defenders == 0
    }

    pub fn attacker_won(self, state: ForceState) -> bool {
        state.attackers >= self.min_attack_commitment
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// First and last state of one finished trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrialOutcome {
    pub initial: ForceState,
    pub final_state: ForceState,
}

/// Compare two throws pairwise, highest against highest. Ties go to the defender and
/// surplus dice on the larger side have no effect.
pub fn resolve_round(attacker: &DiceSet, defender: &DiceSet) -> RoundOutcome {
    let attacker_faces = attacker.descending();
    let defender_faces = defender.descending();

    attacker_faces
        .iter()
        .zip(defender_faces.iter())
        .fold(RoundOutcome::default(), |mut outcome, (att, def)| {
            if att > def {
                outcome.defender_loss += 1;
            } else {
                outcome.attacker_loss += 1;
            }
            outcome
        })
}

/// One side of a trial: how it decides and how it throws.
pub struct Combatant {
    pub policy: Box<dyn DecisionPolicy>,
    pub dice: Box<dyn DiceSource>,
}

impl Combatant {
    pub fn new(policy: Box<dyn DecisionPolicy>, dice: Box<dyn DiceSource>) -> Self {
        Self { policy, dice }
    }

    fn throw(&mut self, role: Role, state: ForceState) -> Result<DiceSet> {
        let requested = self.policy.propose_dice_count()?;
        let units = state.units(role);
        if requested > 0 && requested as u32 > units {
            return Err(RisikoError::OverCommitment {
                role,
                requested,
                units,
            });
        }
        let throws = self.dice.roll(requested)?;
        if throws.count() != requested as usize {
            return Err(RisikoError::DiceMismatch {
                role,
                requested,
                rolled: throws.count(),
            });
        }
        Ok(throws)
    }
}

impl fmt::Debug for Combatant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Combatant").finish_non_exhaustive()
    }
}

/// Run rounds until `rules` say the conflict is over and return the final state.
pub fn fight(
    initial: ForceState,
    attacker: &mut Combatant,
    defender: &mut Combatant,
    rules: RuleSet,
) -> Result<ForceState> {
    let mut state = initial;
    while !rules.is_terminal(state) {
        attacker.policy.update_state(state);
        defender.policy.update_state(state);

        let attacker_throws = attacker.throw(Role::Attacker, state)?;
        let defender_throws = defender.throw(Role::Defender, state)?;

        let outcome = resolve_round(&attacker_throws, &defender_throws);
        if outcome.total() == 0 {
            return Err(RisikoError::StalledRound { state });
        }
        state = state.after(outcome);
    }
    Ok(state)
}

/// Single trial under the standard rules with fresh policies from both factories.
pub fn run_conflict(
    initial: ForceState,
    attacker: &PolicyFactory,
    defender: &PolicyFactory,
    seed: u64,
) -> Result<ForceState> {
    run_conflict_with_rules(initial, attacker, defender, seed, RuleSet::STANDARD)
}

pub fn run_conflict_with_rules(
    initial: ForceState,
    attacker: &PolicyFactory,
    defender: &PolicyFactory,
    seed: u64,
    rules: RuleSet,
) -> Result<ForceState> {
    let mut attacker = attacker.build(stream_seed(seed, &[Role::Attacker.stream_id()]))?;
    let mut defender = defender.build(stream_seed(seed, &[Role::Defender.stream_id()]))?;
    fight(initial, &mut attacker, &mut defender, rules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::dice::DiceKind;

    fn dice(faces: &[u8]) -> DiceSet {
        DiceSet::from_faces(faces.to_vec())
    }

    #[test]
    fn ties_go_to_the_defender() {
        let outcome = resolve_round(&dice(&[4]), &dice(&[4]));
        assert_eq!(
            outcome,
            RoundOutcome {
                attacker_loss: 1,
                defender_loss: 0
            }
        );
    }

    #[test]
    fn resolver_sorts_unordered_throws() {
        let outcome = resolve_round(&dice(&[1, 4, 6]), &dice(&[1, 5, 5]));
        assert_eq!(outcome.attacker_loss, 2);
        assert_eq!(outcome.defender_loss, 1);
    }

    #[test]
    fn empty_throw_compares_nothing() {
        let outcome = resolve_round(&DiceSet::empty(), &dice(&[6, 6]));
        assert_eq!(outcome.total(), 0);
    }

    #[test]
    fn terminal_states_follow_the_standard_rules() {
        let rules = RuleSet::STANDARD;
        assert!(rules.is_terminal(ForceState::new(1, 5)));
        assert!(rules.is_terminal(ForceState::new(9, 0)));
        assert!(!rules.is_terminal(ForceState::new(2, 1)));
        assert!(rules.attacker_won(ForceState::new(2, 0)));
        assert!(!rules.attacker_won(ForceState::new(1, 3)));
    }

    #[test]
    fn terminal_initial_state_is_returned_untouched() {
        let attacker = PolicyFactory::maximal_attacker(DiceKind::Fair);
        let defender = PolicyFactory::maximal_defender(DiceKind::Fair);
        let state = ForceState::new(1, 4);
        assert_eq!(run_conflict(state, &attacker, &defender, 3).unwrap(), state);
    }

    #[test]
    fn same_seed_replays_the_same_conflict() {
        let attacker = PolicyFactory::maximal_attacker(DiceKind::Fair);
        let defender = PolicyFactory::maximal_defender(DiceKind::Fair);
        let start = ForceState::new(12, 9);
        let first = run_conflict(start, &attacker, &defender, 77).unwrap();
        let second = run_conflict(start, &attacker, &defender, 77).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn force_state_displays_both_sides() {
        assert_eq!(ForceState::new(3, 7).to_string(), "3 vs 7");
        assert_eq!(Role::Defender.to_string(), "defender");
    }
}
