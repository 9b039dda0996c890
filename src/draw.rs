//! Draw pool and pre-generated draw order
//!
//! The entire order of calls for a round is generated up front, before
//! the first number is ever broadcast. This removes any mid-round risk of
//! exhausting the pool or producing a duplicate call, and makes the full
//! sequence of a round inspectable ahead of time, which is what ticket
//! assignment and the tests rely on.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Source of uniform random indices for the draw process
///
/// The generator is an explicit dependency rather than ambient state so
/// that rounds can be reproduced exactly from a seed.
pub trait Rng {
    /// Returns a uniformly random index in `0..bound`
    ///
    /// `bound` is always at least 1 when called by this crate.
    fn pick(&mut self, bound: usize) -> usize;
}

/// Production random source backed by [`fastrand::Rng`]
#[derive(Debug, Clone)]
pub struct FastrandRng(fastrand::Rng);

impl FastrandRng {
    /// Creates a generator seeded from entropy
    pub fn new() -> Self {
        Self(fastrand::Rng::new())
    }

    /// Creates a generator with a fixed seed, for reproducible rounds
    pub fn with_seed(seed: u64) -> Self {
        Self(fastrand::Rng::with_seed(seed))
    }
}

impl Default for FastrandRng {
    /// Creates a generator seeded from entropy (same as `new()`)
    fn default() -> Self {
        Self::new()
    }
}

impl Rng for FastrandRng {
    fn pick(&mut self, bound: usize) -> usize {
        self.0.usize(..bound)
    }
}

/// Errors that can occur while building a draw order
#[derive(Error, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The requested range has its minimum above its maximum
    #[error("invalid draw range: {min} > {max}")]
    InvalidRange {
        /// Requested lower bound
        min: u32,
        /// Requested upper bound
        max: u32,
    },
}

/// The full pre-generated permutation of callable numbers for a round
///
/// Holds every integer in the inclusive range `[range_min, range_max]`
/// exactly once, in the order they will be called. Built once per round
/// and immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawOrder {
    /// Smallest callable number (inclusive)
    range_min: u32,
    /// Largest callable number (inclusive)
    range_max: u32,
    /// The permutation itself, in call order
    order: Vec<u32>,
}

impl DrawOrder {
    /// Generates a uniformly random permutation of `[min, max]`
    ///
    /// Uses a pick-without-replacement process: repeatedly selects a
    /// uniformly random element from the remaining undrawn values and
    /// appends it until the pool is exhausted.
    ///
    /// # Arguments
    ///
    /// * `min` - Smallest callable number (inclusive)
    /// * `max` - Largest callable number (inclusive)
    /// * `rng` - Random source for the selection
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRange`] if `min > max`.
    pub fn generate<R: Rng>(min: u32, max: u32, rng: &mut R) -> Result<Self, Error> {
        if min > max {
            return Err(Error::InvalidRange { min, max });
        }

        let mut remaining: Vec<u32> = (min..=max).collect();
        let mut order = Vec::with_capacity(remaining.len());

        while !remaining.is_empty() {
            let index = rng.pick(remaining.len());
            order.push(remaining.swap_remove(index));
        }

        Ok(Self {
            range_min: min,
            range_max: max,
            order,
        })
    }

    /// Returns the number at the given position in the call order
    pub fn get(&self, index: usize) -> Option<u32> {
        self.order.get(index).copied()
    }

    /// Returns the whole call order, first call first
    pub fn numbers(&self) -> &[u32] {
        &self.order
    }

    /// Returns the first `len` numbers of the call order
    ///
    /// Used by ticket assignment; `len` is clamped to the order length.
    pub fn prefix(&self, len: usize) -> &[u32] {
        &self.order[..len.min(self.order.len())]
    }

    /// Returns the total count of callable numbers
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns whether the order contains no numbers
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Returns the smallest callable number
    pub fn range_min(&self) -> u32 {
        self.range_min
    }

    /// Returns the largest callable number
    pub fn range_max(&self) -> u32 {
        self.range_max
    }
}
