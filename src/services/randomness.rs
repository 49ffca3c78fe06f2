use rand::{rngs::StdRng, Rng, SeedableRng};

/// Source of the per-request RNG used for genre shuffling, pagination
/// offsets and tie-break jitter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Randomness {
    /// Fresh entropy for every request
    #[default]
    Entropy,
    /// Every request starts from the same seed
    Seeded(u64),
}

impl Randomness {
    pub fn from_seed(seed: Option<u64>) -> Self {
        seed.map(Randomness::Seeded).unwrap_or_default()
    }

    /// Root RNG for one request
    pub fn rng(&self) -> StdRng {
        match self {
            Randomness::Entropy => StdRng::from_entropy(),
            Randomness::Seeded(seed) => StdRng::seed_from_u64(*seed),
        }
    }
}

/// Derives independent child RNGs from a parent, one per concurrent task.
/// Draws happen up front so the outcome does not depend on task scheduling.
pub fn fork(parent: &mut StdRng, count: usize) -> Vec<StdRng> {
    (0..count)
        .map(|_| StdRng::seed_from_u64(parent.gen()))
        .collect()
}
