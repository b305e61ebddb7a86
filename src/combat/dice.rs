//! Dice sources. A source turns a requested die count into a [DiceSet] sorted in descending
//! order; fair sources draw from their own [Rng], loaded and scripted ones are deterministic.

use crate::combat::rng::Rng;
use crate::error::{RisikoError, Result};

pub const DIE_FACES: u8 = 6;

/// Faces thrown by one side in one round.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DiceSet {
    faces: Vec<u8>,
}

impl DiceSet {
    /// Keeps the faces in the given order.
    pub fn from_faces(faces: Vec<u8>) -> Self {
        Self { faces }
    }

    /// Sorts the faces highest first.
    pub fn sorted_from(mut faces: Vec<u8>) -> Self {
        faces.sort_unstable_by(|a, b| b.cmp(a));
        Self { faces }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.faces.len()
    }

    pub fn faces(&self) -> &[u8] {
        &self.faces
    }

    /// Copy of the faces, highest first.
    pub fn descending(&self) -> Vec<u8> {
        let mut faces = self.faces.clone();
        faces.sort_unstable_by(|a, b| b.cmp(a));
        faces
    }
}

/// Anything that can throw dice for one side of a trial.
pub trait DiceSource: Send {
    fn roll(&mut self, count: i32) -> Result<DiceSet>;
}

fn checked_count(count: i32) -> Result<usize> {
    usize::try_from(count).map_err(|_| RisikoError::InvalidCount(count))
}

fn checked_face(face: u8) -> Result<u8> {
    if (1..=DIE_FACES).contains(&face) {
        Ok(face)
    } else {
        Err(RisikoError::InvalidFace(face))
    }
}

/// Uniform six-sided dice backed by a per-trial stream.
#[derive(Debug, Clone)]
pub struct FairDice {
    rng: Rng,
}

impl FairDice {
    pub fn new(seed: u64) -> Self {
        Self { rng: Rng::new(seed) }
    }
}

impl DiceSource for FairDice {
    fn roll(&mut self, count: i32) -> Result<DiceSet> {
        let count = checked_count(count)?;
        let faces = (0..count).map(|_| self.rng.roll_face()).collect();
        Ok(DiceSet::sorted_from(faces))
    }
}

/// Dice that always show the same face.
#[derive(Debug, Clone, Copy)]
pub struct LoadedDice {
    face: u8,
}

impl LoadedDice {
    /// Fails with [RisikoError::InvalidFace] unless `face` is in `1..=6`.
    pub fn new(face: u8) -> Result<Self> {
        Ok(Self {
            face: checked_face(face)?,
        })
    }
}

impl DiceSource for LoadedDice {
    fn roll(&mut self, count: i32) -> Result<DiceSet> {
        let count = checked_count(count)?;
        Ok(DiceSet::from_faces(vec![self.face; count]))
    }
}

/// Replays a fixed face sequence, wrapping around when it runs out.
#[derive(Debug, Clone)]
pub struct ScriptedDice {
    script: Vec<u8>,
    cursor: usize,
}

impl ScriptedDice {
    /// Every face must be in `1..=6` and the script must not be empty.
    pub fn new(script: Vec<u8>) -> Result<Self> {
        if script.is_empty() {
            return Err(RisikoError::EmptyScript);
        }
        let script = script
            .into_iter()
            .map(checked_face)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { script, cursor: 0 })
    }
}

impl DiceSource for ScriptedDice {
    fn roll(&mut self, count: i32) -> Result<DiceSet> {
        let count = checked_count(count)?;
        let mut faces = Vec::with_capacity(count);
        for _ in 0..count {
            faces.push(self.script[self.cursor]);
            self.cursor = (self.cursor + 1) % self.script.len();
        }
        Ok(DiceSet::sorted_from(faces))
    }
}

/// Which dice a policy factory hands out to each trial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiceKind {
    Fair,
    Loaded(u8),
    Scripted(Vec<u8>),
}

impl DiceKind {
    /// Build a fresh source. `seed` only matters for fair dice.
    pub fn build(&self, seed: u64) -> Result<Box<dyn DiceSource>> {
        Ok(match self {
            Self::Fair => Box::new(FairDice::new(seed)),
            Self::Loaded(face) => Box::new(LoadedDice::new(*face)?),
            Self::Scripted(script) => Box::new(ScriptedDice::new(script.clone())?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_descending(faces: &[u8]) -> bool {
        faces.windows(2).all(|pair| pair[0] >= pair[1])
    }

    #[test]
    fn fair_dice_count_matches_request() {
        let mut dice = FairDice::new(3);
        for count in -10..=10 {
            match dice.roll(count) {
                Ok(set) => {
                    assert!(count >= 0);
                    assert_eq!(set.count(), count as usize);
                }
                Err(err) => {
                    assert!(count < 0, "unexpected error for {count}: {err}");
                    assert!(matches!(err, RisikoError::InvalidCount(c) if c == count));
                }
            }
        }
    }

    #[test]
    fn fair_dice_are_sorted_descending() {
        let mut dice = FairDice::new(11);
        for count in 0..=10 {
            let set = dice.roll(count).expect("non-negative count");
            assert!(is_descending(set.faces()), "not sorted: {:?}", set.faces());
        }
    }

    #[test]
    fn zero_dice_is_empty() {
        assert_eq!(LoadedDice::new(6).unwrap().roll(0).unwrap(), DiceSet::empty());
        assert_eq!(FairDice::new(1).roll(0).unwrap().count(), 0);
    }

    #[test]
    fn loaded_dice_repeat_their_face() {
        let mut dice = LoadedDice::new(4).unwrap();
        assert_eq!(dice.roll(3).unwrap().faces(), &[4, 4, 4]);
        assert!(dice.roll(-1).is_err());
    }

    #[test]
    fn scripted_dice_cycle_through_the_script() {
        let mut dice = ScriptedDice::new(vec![2, 5, 3]).unwrap();
        assert_eq!(dice.roll(2).unwrap().faces(), &[5, 2]);
        assert_eq!(dice.roll(2).unwrap().faces(), &[3, 2]);
        assert_eq!(dice.roll(1).unwrap().faces(), &[5]);
    }

    #[test]
    fn faces_off_the_die_are_rejected() {
        assert!(matches!(LoadedDice::new(0), Err(RisikoError::InvalidFace(0))));
        assert!(matches!(LoadedDice::new(7), Err(RisikoError::InvalidFace(7))));
        assert!(matches!(
            ScriptedDice::new(vec![3, 9, 1]),
            Err(RisikoError::InvalidFace(9))
        ));
        assert!(matches!(ScriptedDice::new(Vec::new()), Err(RisikoError::EmptyScript)));
        assert!(DiceKind::Loaded(0).build(1).is_err());
        assert!(DiceKind::Scripted(vec![1, 6]).build(1).is_ok());
    }

    #[test]
    fn descending_copy_leaves_original_order() {
        let set = DiceSet::from_faces(vec![1, 6, 3]);
        assert_eq!(set.descending(), vec![6, 3, 1]);
        assert_eq!(set.faces(), &[1, 6, 3]);
    }
}
