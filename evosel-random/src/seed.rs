//! Deterministic seed derivation.
//!
//! A master seed is expanded into per-(stream, ordinal) sub-seeds with BLAKE3.
//! Derivation is hash-based, so the sub-seed of a given ordinal does not
//! depend on which other ordinals were derived before it.

use crate::source::Random;

/// Expands one master seed into independent sub-seeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SeedHierarchy {
    master_seed: u64,
}

impl SeedHierarchy {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// Derive a deterministic sub-seed for `(stream, ordinal)`.
    pub fn sub_seed(&self, stream: &str, ordinal: u64) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.master_seed.to_le_bytes());
        hasher.update(stream.as_bytes());
        hasher.update(&ordinal.to_le_bytes());
        let hash = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(bytes)
    }

    /// A seeded [`Random`] for `(stream, ordinal)`.
    pub fn random_for(&self, stream: &str, ordinal: u64) -> Random {
        Random::seeded(self.sub_seed(stream, ordinal))
    }
}
