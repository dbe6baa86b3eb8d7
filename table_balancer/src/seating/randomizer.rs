//! Seat randomization with an injectable, seedable source.
//!
//! Shuffles go through [`rand::seq::SliceRandom::shuffle`] (Fisher-Yates) with the
//! generator passed in explicitly, so seating and balancing are reproducible
//! from a seed.

use rand::{SeedableRng, rngs::StdRng};

/// Seat randomizer owning the generator used by seating and balancing
pub struct SeatRandomizer {
    /// Random number generator
    rng: StdRng,
}

impl SeatRandomizer {
    /// Create a randomizer seeded from the operating system
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Create a deterministic randomizer
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Seeded when a seed is configured, OS entropy otherwise
    pub fn from_seed(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::new, Self::seeded)
    }

    /// Borrow the underlying generator
    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}

impl Default for SeatRandomizer {
    fn default() -> Self {
        Self::new()
    }
}
