//! Decision policies: how many dice a side commits in the current round.

use std::fmt;
use std::sync::Arc;

use crate::combat::dice::DiceKind;
use crate::combat::engine::{Combatant, ForceState, Role, RULE_MAX_DICE, RULE_MIN_ATTACK};
use crate::error::{RisikoError, Result};

/// A side's strategy. The loop calls [DecisionPolicy::update_state] before every
/// [DecisionPolicy::propose_dice_count]; policies keep nothing else between rounds.
pub trait DecisionPolicy: Send {
    fn update_state(&mut self, state: ForceState);
    fn propose_dice_count(&self) -> Result<i32>;
}

///////////////////////////////////////////////////////////////////////////////
// Maximal: always commit as many dice as the rules allow
///////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, Default)]
pub struct MaximalAttacker {
    state: ForceState,
}

impl DecisionPolicy for MaximalAttacker {
    fn update_state(&mut self, state: ForceState) {
        self.state = state;
    }

    fn propose_dice_count(&self) -> Result<i32> {
        max_attack_dice(self.state.attackers)
    }
}

fn max_attack_dice(units: u32) -> Result<i32> {
    if units < RULE_MIN_ATTACK {
        return Err(RisikoError::InsufficientForce {
            role: Role::Attacker,
            units,
        });
    }
    Ok((units - 1).min(RULE_MAX_DICE) as i32)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MaximalDefender {
    state: ForceState,
}

impl DecisionPolicy for MaximalDefender {
    fn update_state(&mut self, state: ForceState) {
        self.state = state;
    }

    fn propose_dice_count(&self) -> Result<i32> {
        max_defence_dice(self.state.defenders)
    }
}

fn max_defence_dice(units: u32) -> Result<i32> {
    if units == 0 {
        return Err(RisikoError::InsufficientForce {
            role: Role::Defender,
            units,
        });
    }
    Ok(units.min(RULE_MAX_DICE) as i32)
}

///////////////////////////////////////////////////////////////////////////////
// Minimal: commit a single die per round
///////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, Default)]
pub struct MinimalAttacker {
    state: ForceState,
}

impl DecisionPolicy for MinimalAttacker {
    fn update_state(&mut self, state: ForceState) {
        self.state = state;
    }

    fn propose_dice_count(&self) -> Result<i32> {
        max_attack_dice(self.state.attackers).map(|_| 1)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MinimalDefender {
    state: ForceState,
}

impl DecisionPolicy for MinimalDefender {
    fn update_state(&mut self, state: ForceState) {
        self.state = state;
    }

    fn propose_dice_count(&self) -> Result<i32> {
        max_defence_dice(self.state.defenders).map(|_| 1)
    }
}

///////////////////////////////////////////////////////////////////////////////
// Factories
///////////////////////////////////////////////////////////////////////////////

pub type CustomPolicy = Arc<dyn Fn() -> Box<dyn DecisionPolicy> + Send + Sync>;

#[derive(Clone)]
pub enum PolicyKind {
    MaximalAttacker,
    MaximalDefender,
    MinimalAttacker,
    MinimalDefender,
    Custom(CustomPolicy),
}

impl PolicyKind {
    fn instantiate(&self) -> Box<dyn DecisionPolicy> {
        match self {
            Self::MaximalAttacker => Box::<MaximalAttacker>::default(),
            Self::MaximalDefender => Box::<MaximalDefender>::default(),
            Self::MinimalAttacker => Box::<MinimalAttacker>::default(),
            Self::MinimalDefender => Box::<MinimalDefender>::default(),
            Self::Custom(make) => make(),
        }
    }
}

impl fmt::Debug for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MaximalAttacker => f.write_str("MaximalAttacker"),
            Self::MaximalDefender => f.write_str("MaximalDefender"),
            Self::MinimalAttacker => f.write_str("MinimalAttacker"),
            Self::MinimalDefender => f.write_str("MinimalDefender"),
            Self::Custom(_) => f.write_str("Custom"),
        }
    }
}

/// Hands out a fresh policy and dice source for every trial, so no state leaks between
/// trials. Cheap to clone and safe to share across worker threads.
#[derive(Debug, Clone)]
pub struct PolicyFactory {
    pub kind: PolicyKind,
    pub dice: DiceKind,
}

impl PolicyFactory {
    pub fn new(kind: PolicyKind, dice: DiceKind) -> Self {
        Self { kind, dice }
    }

    pub fn maximal_attacker(dice: DiceKind) -> Self {
        Self::new(PolicyKind::MaximalAttacker, dice)
    }

    pub fn maximal_defender(dice: DiceKind) -> Self {
        Self::new(PolicyKind::MaximalDefender, dice)
    }

    pub fn minimal_attacker(dice: DiceKind) -> Self {
        Self::new(PolicyKind::MinimalAttacker, dice)
    }

    pub fn minimal_defender(dice: DiceKind) -> Self {
        Self::new(PolicyKind::MinimalDefender, dice)
    }

    pub fn custom<F>(make: F, dice: DiceKind) -> Self
    where
        F: Fn() -> Box<dyn DecisionPolicy> + Send + Sync + 'static,
    {
        Self::new(PolicyKind::Custom(Arc::new(make)), dice)
    }

    /// `seed` feeds the dice stream of this combatant only. Fails when the dice
    /// configuration is invalid.
    pub fn build(&self, seed: u64) -> Result<Combatant> {
        Ok(Combatant::new(self.kind.instantiate(), self.dice.build(seed)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proposal(policy: &mut dyn DecisionPolicy, state: ForceState) -> Result<i32> {
        policy.update_state(state);
        policy.propose_dice_count()
    }

    #[test]
    fn maximal_attacker_keeps_one_unit_home() {
        let mut policy = MaximalAttacker::default();
        let cases = [(2, 1), (3, 2), (4, 3), (1000, 3)];
        for (units, want) in cases {
            let got = proposal(&mut policy, ForceState::new(units, 1)).unwrap();
            assert_eq!(got, want, "{units} attackers");
        }
    }

    #[test]
    fn maximal_attacker_refuses_single_unit() {
        let mut policy = MaximalAttacker::default();
        let err = proposal(&mut policy, ForceState::new(1, 1)).unwrap_err();
        assert!(matches!(
            err,
            RisikoError::InsufficientForce {
                role: Role::Attacker,
                units: 1
            }
        ));
    }

    #[test]
    fn maximal_defender_caps_at_three() {
        let mut policy = MaximalDefender::default();
        let cases = [(1, 1), (2, 2), (3, 3), (4, 3), (1000, 3)];
        for (units, want) in cases {
            let got = proposal(&mut policy, ForceState::new(2, units)).unwrap();
            assert_eq!(got, want, "{units} defenders");
        }
    }

    #[test]
    fn maximal_defender_refuses_empty_territory() {
        let mut policy = MaximalDefender::default();
        assert!(proposal(&mut policy, ForceState::new(5, 0)).is_err());
    }

    #[test]
    fn minimal_policies_commit_one_die() {
        let mut attacker = MinimalAttacker::default();
        let mut defender = MinimalDefender::default();
        assert_eq!(proposal(&mut attacker, ForceState::new(9, 9)).unwrap(), 1);
        assert_eq!(proposal(&mut defender, ForceState::new(9, 9)).unwrap(), 1);
        assert!(proposal(&mut attacker, ForceState::new(1, 9)).is_err());
        assert!(proposal(&mut defender, ForceState::new(9, 0)).is_err());
    }

    #[test]
    fn factory_builds_independent_policies() {
        let factory = PolicyFactory::maximal_attacker(DiceKind::Loaded(6));
        let mut first = factory.build(1).unwrap();
        let second = factory.build(1).unwrap();
        first.policy.update_state(ForceState::new(10, 1));
        assert_eq!(first.policy.propose_dice_count().unwrap(), 3);
        assert!(second.policy.propose_dice_count().is_err());
    }

    #[test]
    fn factory_rejects_invalid_dice() {
        let factory = PolicyFactory::maximal_defender(DiceKind::Scripted(vec![2, 0]));
        assert!(matches!(factory.build(1), Err(RisikoError::InvalidFace(0))));
    }
}
