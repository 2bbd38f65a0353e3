//! Chaotic permutation sampling.
//!
//! A piecewise linear chaotic map with break point 0.15 is iterated
//! over a 256-bit fixed-point real; iterates falling into the
//! (0.1, 0.9) window select permutation slots. The map state is owned
//! by the sampler and advances with every draw, so consecutive draws
//! from one sampler never coincide, and two samplers seeded identically
//! reproduce the same sequence.

mod real;

pub use real::Real;

use rand::{CryptoRng, RngCore};

/// Largest permutation the sampler can draw: slot indices are bytes.
pub const MAX_PERMUTATION: usize = 256;

/// Seed length in bytes.
pub const SEED_SIZE: usize = 32;

/// Permutation sampler driven by a piecewise linear chaotic map.
pub struct ChaoticSampler {
    seed: Real,
    break_point: Real, // 0.15
    half: Real,
    window_low: Real,  // 0.1
    window_span: Real, // 0.8
}

impl ChaoticSampler {
    /// Seeds the map from 32 bytes of entropy. The bytes are rendered
    /// as concatenated decimal values and the digit string is read as
    /// the decimal fraction `0.digits` (equivalently: a decimal point
    /// after the fourth digit and a 10^-4 exponent).
    pub fn from_seed_bytes(bytes: &[u8; SEED_SIZE]) -> Self {
        let mut digits = Vec::with_capacity(3 * SEED_SIZE);
        for &b in bytes {
            if b >= 100 {
                digits.push(b / 100);
            }
            if b >= 10 {
                digits.push((b / 10) % 10);
            }
            digits.push(b % 10);
        }
        Self::with_seed(Real::from_fraction_digits(&digits))
    }

    /// Seeds the map from a cryptographic RNG.
    pub fn from_entropy<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut bytes = [0u8; SEED_SIZE];
        rng.fill_bytes(&mut bytes);
        Self::from_seed_bytes(&bytes)
    }

    fn with_seed(seed: Real) -> Self {
        Self {
            seed,
            break_point: Real::from_fraction_digits(&[1, 5]),
            half: Real::from_fraction_digits(&[5]),
            window_low: Real::from_fraction_digits(&[1]),
            window_span: Real::from_fraction_digits(&[8]),
        }
    }

    /// One application of the piecewise linear chaotic map:
    /// `x / p` on `[0, p]`, `(x - p) / (0.5 - p)` on `(p, 0.5]`, and
    /// reflection `x -> 1 - x` above one half.
    fn iterate(&self, x: Real) -> Real {
        let x = if x > self.half { x.one_minus() } else { x };
        if x <= self.break_point {
            x.div(&self.break_point)
        } else {
            x.sub(&self.break_point)
                .div(&self.half.sub(&self.break_point))
        }
    }

    /// Draws a random permutation of `0..out.len()` into `out`,
    /// advancing the map state. The length must be between 1 and 256.
    pub fn draw_permutation(&mut self, out: &mut [u8]) {
        let n = out.len();
        assert!(
            n >= 1 && n <= MAX_PERMUTATION,
            "permutation length must be 1..=256"
        );
        let slot = self.window_span.div_small(n as u64);
        let mut used = [false; MAX_PERMUTATION];
        let mut filled = 0;
        let mut x = self.seed;
        while filled < n {
            x = self.iterate(x);
            if x < self.window_low {
                // Below the selection window.
                continue;
            }
            // Floor quotient, truncated to a byte like the tables that
            // consume it, then range-checked.
            let index = usize::from(x.sub(&self.window_low).div_count(&slot) as u8);
            if index >= n || used[index] {
                continue;
            }
            // For n = 256 the range check above is vacuous (the byte
            // cast already bounds the index), so re-assert the slot
            // invariant before writing.
            debug_assert!(index < n);
            used[index] = true;
            out[filled] = index as u8;
            filled += 1;
        }
        self.seed = x;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: [u8; SEED_SIZE] = [
        0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C, 0x0D, 0x0E,
        0x0F, 0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17, 0x18, 0x19, 0x1A, 0x1B, 0x1C, 0x1D,
        0x1E, 0x1F,
    ];

    fn is_permutation(p: &[u8]) -> bool {
        let mut sorted: Vec<u8> = p.to_vec();
        sorted.sort_unstable();
        sorted.iter().enumerate().all(|(i, &v)| usize::from(v) == i)
    }

    #[test]
    fn nibble_draw_is_a_permutation() {
        let mut sampler = ChaoticSampler::from_seed_bytes(&SEED);
        let mut out = [0u8; 16];
        sampler.draw_permutation(&mut out);
        assert!(is_permutation(&out));
    }

    #[test]
    fn byte_draw_is_a_permutation() {
        let mut sampler = ChaoticSampler::from_seed_bytes(&SEED);
        let mut out = [0u8; 256];
        sampler.draw_permutation(&mut out);
        assert!(is_permutation(&out));
    }

    #[test]
    fn consecutive_draws_differ() {
        let mut sampler = ChaoticSampler::from_seed_bytes(&SEED);
        let mut first = [0u8; 16];
        let mut second = [0u8; 16];
        sampler.draw_permutation(&mut first);
        sampler.draw_permutation(&mut second);
        assert_ne!(first, second);
    }

    #[test]
    fn identical_seeds_reproduce_the_sequence() {
        let mut a = ChaoticSampler::from_seed_bytes(&SEED);
        let mut b = ChaoticSampler::from_seed_bytes(&SEED);
        for len in [16usize, 256, 16, 16, 256] {
            let mut pa = vec![0u8; len];
            let mut pb = vec![0u8; len];
            a.draw_permutation(&mut pa);
            b.draw_permutation(&mut pb);
            assert_eq!(pa, pb);
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut other = SEED;
        other[31] ^= 1;
        let mut a = ChaoticSampler::from_seed_bytes(&SEED);
        let mut b = ChaoticSampler::from_seed_bytes(&other);
        let mut pa = [0u8; 256];
        let mut pb = [0u8; 256];
        a.draw_permutation(&mut pa);
        b.draw_permutation(&mut pb);
        assert_ne!(pa, pb);
    }

    #[test]
    fn map_stays_inside_the_unit_interval() {
        let sampler = ChaoticSampler::from_seed_bytes(&SEED);
        let mut x = sampler.seed;
        for _ in 0..1000 {
            x = sampler.iterate(x);
        }
        // Nothing to assert beyond type invariants: Real is [0, 1) by
        // construction. The orbit must not collapse to a fixed point.
        assert!(!x.is_zero());
    }
}
