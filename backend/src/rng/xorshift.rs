//! xorshift64* random number generator
//!
//! 64-bit state, 64-bit output, passes BigCrush. Same seed → same sequence,
//! which is what makes a simulated loan tape bit-reproducible.

use serde::{Deserialize, Serialize};

/// Deterministic random number generator using xorshift64*
///
/// # Example
/// ```
/// use loan_tape_core_rs::RngManager;
///
/// let mut rng = RngManager::new(12345);
/// let u = rng.next_f64();
/// assert!((0.0..1.0).contains(&u));
/// let offset = rng.range_inclusive(6, 18);
/// assert!((6..=18).contains(&offset));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngManager {
    state: u64,
}

impl RngManager {
    /// Create a new RNG with given seed
    ///
    /// A zero seed is mapped to 1 (xorshift cannot leave the all-zero state).
    pub fn new(seed: u64) -> Self {
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Generate next random u64 value
    pub fn next(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    /// Generate random value in range [min, max)
    ///
    /// # Panics
    /// Panics if min >= max
    pub fn range(&mut self, min: i64, max: i64) -> i64 {
        assert!(min < max, "min must be less than max");

        let value = self.next();
        let range_size = (max - min) as u64;
        min + (value % range_size) as i64
    }

    /// Generate random value in range [min, max]
    ///
    /// Used for inclusive month windows such as forced payoff offsets.
    ///
    /// # Panics
    /// Panics if min > max
    pub fn range_inclusive(&mut self, min: i64, max: i64) -> i64 {
        assert!(min <= max, "min must not exceed max");
        self.range(min, max + 1)
    }

    /// Get current RNG state (for replay)
    pub fn get_state(&self) -> u64 {
        self.state
    }

    /// Generate random f64 in range [0.0, 1.0)
    pub fn next_f64(&mut self) -> f64 {
        let value = self.next();
        // Top 53 bits → exact f64 mantissa
        (value >> 11) as f64 * (1.0 / ((1u64 << 53) as f64))
    }

    /// Fill a buffer with `n` uniform draws in [0.0, 1.0)
    ///
    /// Draws are consumed in buffer order, so a population-wide pass over the
    /// buffer sees exactly the sequence a loan-by-loan loop would.
    pub fn uniform_vec(&mut self, n: usize) -> Vec<f64> {
        (0..n).map(|_| self.next_f64()).collect()
    }

    /// Sample an index from a discrete distribution
    ///
    /// Uses one uniform draw against the running cumulative sum. Weights are
    /// expected to sum to 1; if rounding leaves the draw above the final
    /// cumulative value, the last index with positive weight is returned.
    ///
    /// Returns `None` when the weights are empty or all zero.
    pub fn sample_categorical(&mut self, weights: &[f64]) -> Option<usize> {
        let last_positive = weights.iter().rposition(|w| *w > 0.0)?;
        let u = self.next_f64();

        let mut cumulative = 0.0;
        for (idx, weight) in weights.iter().enumerate() {
            cumulative += weight;
            if u < cumulative {
                return Some(idx);
            }
        }

        Some(last_positive)
    }
}
