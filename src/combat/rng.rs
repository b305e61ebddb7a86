//! Fast PRNG for dice rolls. Uses SplitMix64 for throughput and good statistical quality.
//! Deterministic: same seed produces the same sequence. Not cryptographically secure.
//!
//! Every trial owns its own [Rng]; streams are derived from a sweep seed with [stream_seed]
//! so no generator is ever shared between threads.

use crate::error::{RisikoError, Result};

const SPLITMIX64_GOLDEN: u64 = 0x9e3779b97f4a7c15;
const SPLITMIX64_M1: u64 = 0xbf58476d1ce4e5b9;
const SPLITMIX64_M2: u64 = 0x94d049bb133111eb;

#[derive(Debug, Clone, Copy)]
pub struct Rng {
    state: u64,
}

impl Rng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(SPLITMIX64_GOLDEN);
        mix(self.state)
    }

    /// Uniform value in `0..bound`. Rejection sampling keeps it free of modulo bias.
    #[inline]
    pub fn below(&mut self, bound: u64) -> u64 {
        debug_assert!(bound > 0);
        let zone = u64::MAX - u64::MAX % bound;
        loop {
            let value = self.next_u64();
            if value < zone {
                return value % bound;
            }
        }
    }

    /// One fair six-sided die.
    #[inline]
    pub fn roll_face(&mut self) -> u8 {
        self.below(6) as u8 + 1
    }
}

#[inline]
fn mix(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(SPLITMIX64_M1);
    z = (z ^ (z >> 27)).wrapping_mul(SPLITMIX64_M2);
    z ^ (z >> 31)
}

/// Derive an independent stream seed from a base seed and a path of identifiers
/// (cell coordinates, trial index, side...).
pub fn stream_seed(base: u64, parts: &[u64]) -> u64 {
    parts.iter().fold(mix(base), |acc, part| {
        mix(acc ^ part.wrapping_add(1).wrapping_mul(SPLITMIX64_GOLDEN))
    })
}

/// A fresh 64-bit seed from the OS.
pub fn entropy_seed() -> Result<u64> {
    let mut bytes = [0_u8; 8];
    getrandom::getrandom(&mut bytes).map_err(|err| {
        RisikoError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("entropy source unavailable: {err}"),
        ))
    })?;
    Ok(u64::from_le_bytes(bytes))
}
