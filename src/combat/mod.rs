pub mod dice;
pub mod engine;
pub mod policy;
pub mod rng;

pub use dice::{DiceKind, DiceSet, DiceSource, FairDice, LoadedDice, ScriptedDice, DIE_FACES};
pub use engine::{
    fight, resolve_round, run_conflict, run_conflict_with_rules, Combatant, ForceState, Role,
    RoundOutcome, RuleSet, TrialOutcome, RULE_MAX_DICE, RULE_MIN_ATTACK,
};
pub use policy::{
    CustomPolicy, DecisionPolicy, MaximalAttacker, MaximalDefender, MinimalAttacker,
    MinimalDefender, PolicyFactory, PolicyKind,
};
pub use rng::{entropy_seed, stream_seed, Rng};
