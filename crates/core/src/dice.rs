//! Seeded dice stream behind every random decision the engine makes.
//! This module exists so replays consume randomness in exactly one place.
//! It does not own any game rules; callers interpret the numbers.

use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::{Rng, SeedableRng};

pub struct DiceRng {
    rng: ChaCha8Rng,
}

impl DiceRng {
    pub fn seed_from_u64(seed: u64) -> Self {
        Self { rng: ChaCha8Rng::seed_from_u64(seed) }
    }

    /// Uniform draw in `[0, 1)`. All other helpers are defined over this.
    pub fn unit(&mut self) -> f64 {
        // 53 high bits, the full precision of an f64 mantissa.
        (self.rng.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    pub fn d20(&mut self) -> i32 {
        (self.unit() * 20.0) as i32 + 1
    }

    /// Index into a slice of `len` elements. `len` must be nonzero.
    pub fn pick(&mut self, len: usize) -> usize {
        debug_assert!(len > 0);
        (self.unit() * len as f64) as usize
    }

    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        let len = slice.len();
        for i in (1..len).rev() {
            let j = self.pick(i + 1);
            slice.swap(i, j);
        }
    }
}
