//! Deterministic random streams.
//!
//! Every draw made while advancing a generation comes from a
//! [`Xoshiro256PlusPlus`] stream whose seed is derived from the run seed, the
//! generation and a slot number. Streams for different slots are independent
//! of evaluation order, so parallel sampling gives the same result as
//! sequential sampling.

use rand::Rng;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

/// Slot reserved for per-generation draws such as picking mass migrants.
const GENERATION_SLOT: u64 = u64::MAX;

/// Run seed and sub-stream derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RngContext {
    seed: u64,
}

impl RngContext {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Draw a fresh seed from the thread RNG.
    pub fn from_entropy() -> Self {
        Self::new(rand::rng().random())
    }

    /// Use `seed` if given, otherwise draw one.
    pub fn from_optional_seed(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_entropy, Self::new)
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Stream for whole-generation draws.
    pub fn generation_rng(&self, generation: usize) -> Xoshiro256PlusPlus {
        self.stream(generation as u64, GENERATION_SLOT)
    }

    /// Stream for one offspring slot.
    pub fn offspring_rng(&self, generation: usize, slot: usize) -> Xoshiro256PlusPlus {
        self.stream(generation as u64, slot as u64)
    }

    fn stream(&self, generation: u64, slot: u64) -> Xoshiro256PlusPlus {
        let key = mix(mix(self.seed ^ mix(generation)) ^ slot);
        Xoshiro256PlusPlus::seed_from_u64(key)
    }
}

/// SplitMix64 finalizer.
fn mix(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
