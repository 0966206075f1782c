//! Deterministic RNG hierarchy.
//!
//! A master seed generates deterministic sub-seeds for each
//! `(strategy_id, stream, iteration)` tuple. Sub-seeds are derived via BLAKE3
//! hashing, independently of scheduling order, so a report is identical
//! whether the gates run sequentially or on separate threads.

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Deterministic RNG hierarchy.
///
/// Each gate draws from its own named stream, so adding or removing a gate
/// never shifts the random numbers another gate sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RngHierarchy {
    master_seed: u64,
}

impl RngHierarchy {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// Derive a deterministic sub-seed for `(strategy_id, stream, iteration)`.
    pub fn sub_seed(&self, strategy_id: &str, stream: &str, iteration: u64) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.master_seed.to_le_bytes());
        // Length prefixes keep ("ab", "c") and ("a", "bc") apart.
        hasher.update(&(strategy_id.len() as u64).to_le_bytes());
        hasher.update(strategy_id.as_bytes());
        hasher.update(&(stream.len() as u64).to_le_bytes());
        hasher.update(stream.as_bytes());
        hasher.update(&iteration.to_le_bytes());
        let hash = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(bytes)
    }

    /// Create a seeded StdRng for a stream.
    pub fn rng_for(&self, strategy_id: &str, stream: &str, iteration: u64) -> StdRng {
        StdRng::seed_from_u64(self.sub_seed(strategy_id, stream, iteration))
    }
}
