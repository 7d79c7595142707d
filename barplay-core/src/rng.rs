//! Deterministic seeds for synthetic data.
//!
//! A master seed is expanded into one sub-seed per `(symbol, timeframe)` via
//! BLAKE3, so returning to a symbol/timeframe pair reproduces the same chart
//! regardless of what was generated in between.

use crate::domain::Timeframe;

#[derive(Debug, Clone, Copy)]
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

    /// Derive the sub-seed for one dataset.
    pub fn dataset_seed(&self, symbol: &str, timeframe: Timeframe) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.master_seed.to_le_bytes());
        // Length prefix keeps ("A", "15m") apart from ("A1", "5m").
        hasher.update(&(symbol.len() as u64).to_le_bytes());
        hasher.update(symbol.as_bytes());
        hasher.update(timeframe.label().as_bytes());
        let hash = hasher.finalize();
        let mut word = [0u8; 8];
        word.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(word)
    }
}
