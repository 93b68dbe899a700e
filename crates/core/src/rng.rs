//! Deterministic pseudo-random source.
//!
//! [`Lrand48`] reproduces the 48-bit linear congruential recurrence of the
//! classic `srand48`/`lrand48` pair as it behaved on 32-bit machines: the state
//! is split into a 32-bit high word and a 16-bit low word and every product
//! wraps at 32 bits. Instances generated from the same seed are therefore
//! identical to the published reference instances on every platform.

const LOW_SEED: u32 = 0x330E;
const MUL_HIGH: u32 = 0xDEEC_E66D;
const MUL_CROSS: u32 = 0x5DEEC;
const MUL_LOW: u32 = 0xE66D;
const INCREMENT: u32 = 0xB;

/// Seeded legacy-compatible random number generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lrand48 {
    high: u32,
    low: u32,
}

impl Lrand48 {
    /// Creates a generator seeded with `seed`.
    pub fn new(seed: u32) -> Self {
        let mut rng = Self { high: 0, low: 0 };
        rng.seed(seed);
        rng
    }

    /// Resets the internal state.
    pub fn seed(&mut self, seed: u32) {
        self.high = seed;
        self.low = LOW_SEED;
    }

    /// Advances the state and returns the next value in `[0, 2^31)`.
    pub fn next_value(&mut self) -> u32 {
        self.high = self
            .high
            .wrapping_mul(MUL_HIGH)
            .wrapping_add(self.low.wrapping_mul(MUL_CROSS));
        self.low = self.low.wrapping_mul(MUL_LOW).wrapping_add(INCREMENT);
        // carry out of the low word
        self.high = self.high.wrapping_add(self.low >> 16);
        self.low &= 0xFFFF;
        self.high >> 1
    }

    /// Returns `next_value() % bound`.
    ///
    /// # Panics
    /// Panics if `bound` is zero.
    pub fn uniform(&mut self, bound: u32) -> u32 {
        assert!(bound > 0, "uniform bound must be positive");
        self.next_value() % bound
    }

    /// Returns a value in `[lo, hi]`, drawn as `uniform(hi - lo + 1) + lo`.
    ///
    /// # Panics
    /// Panics if `lo > hi` or the range spans the whole `u32` domain.
    pub fn range_inclusive(&mut self, lo: u32, hi: u32) -> u32 {
        assert!(lo <= hi, "empty range [{}, {}]", lo, hi);
        self.uniform(hi - lo + 1) + lo
    }
}

impl Iterator for Lrand48 {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        Some(self.next_value())
    }
}
