//! Deterministic random rolls for ability procs
//!
//! Skills such as "20% chance to freeze the victim" roll through the engine's
//! `GameRng`, so a seeded engine replays the same outcomes in tests.

use serde::{Deserialize, Serialize};

/// A seeded xorshift64 generator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameRng {
    state: u64,
}

impl GameRng {
    /// Create a new RNG with the given seed
    pub fn new(seed: u64) -> Self {
        // xorshift requires a non-zero state
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Generate the next raw u64 value
    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Generate a random f64 in range [0, 1)
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Roll against a percentage (0-100)
    ///
    /// `chance(0.0)` never succeeds and `chance(100.0)` always does.
    pub fn chance(&mut self, percent: f64) -> bool {
        self.next_f64() * 100.0 < percent
    }
}

impl Default for GameRng {
    fn default() -> Self {
        Self::new(12345)
    }
}
