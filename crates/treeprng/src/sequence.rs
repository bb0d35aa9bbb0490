//! Hash-chained bit sequences
//!
//! A [`Sequence`] turns a spent node's hash context into an unbounded stream
//! of bits. Block `n` of the stream is
//! `H(base || BLOCK_TAG || canonical(n))` for `n = 1, 2, ...`, where `base` is
//! the node's context extended with `SEQUENCE_TAG`. Digests are read as
//! big-endian integers and stacked above the bits already buffered, and every
//! draw takes the lowest unconsumed bits.
//!
//! All higher-level operations consume bits from that one ordered stream, so
//! the order of draws on a sequence changes what each draw returns.

use num_bigint::BigUint;
use num_traits::{One, Zero};
use rand_core::RngCore;

use crate::canonical::canonical_bytes;
use crate::errors::{Result, TreeError};
use crate::hash::{HashAlgorithm, HashContext, BLOCK_TAG, SEQUENCE_TAG};
use crate::key::Key;

/// Bits in the mantissa of an `f64`, the width of one `uniform_float` draw
pub const FLOAT_BITS: u32 = 53;

const FLOAT_SCALE: f64 = (1u64 << FLOAT_BITS) as f64;

/// Deterministic bit stream detached from a spent node
///
/// Not `Clone`: two copies would hand out the same bits twice.
#[derive(Debug)]
pub struct Sequence {
    base: HashContext,
    reservoir: BigUint,
    reservoir_bits: usize,
    block_counter: u64,
}

impl Sequence {
    /// Seed a sequence from a node's hash context
    pub(crate) fn from_context(mut context: HashContext) -> Self {
        context.update(SEQUENCE_TAG);
        Self {
            base: context,
            reservoir: BigUint::zero(),
            reservoir_bits: 0,
            block_counter: 1,
        }
    }

    /// Hash algorithm generating the blocks
    pub fn hash_algorithm(&self) -> HashAlgorithm {
        self.base.algorithm()
    }

    /// Number of blocks hashed so far
    pub fn blocks_drawn(&self) -> u64 {
        self.block_counter - 1
    }

    /// Bits hashed but not yet consumed
    pub fn buffered_bits(&self) -> usize {
        self.reservoir_bits
    }

    fn extend(&mut self) {
        let mut block = self.base.clone();
        block.update_tagged(BLOCK_TAG, &canonical_bytes(&Key::from(self.block_counter)));
        let digest = block.finalize();

        self.reservoir |= BigUint::from_bytes_be(&digest) << self.reservoir_bits;
        self.reservoir_bits += digest.len() * 8;
        self.block_counter += 1;

        tracing::trace!(
            block = self.block_counter - 1,
            buffered_bits = self.reservoir_bits,
            "Extended sequence reservoir"
        );
    }

    /// Take the next `k` bits of the stream as an integer below `2^k`
    ///
    /// Drawing `k1` bits and then `k2` bits yields the same bits as one draw
    /// of `k1 + k2`: the first result holds the low `k1` bits.
    pub fn draw_bits(&mut self, k: usize) -> BigUint {
        if k == 0 {
            return BigUint::zero();
        }
        while self.reservoir_bits < k {
            self.extend();
        }
        let mask = (BigUint::one() << k) - 1u32;
        let value = &self.reservoir & &mask;
        self.reservoir >>= k;
        self.reservoir_bits -= k;
        value
    }

    fn draw_u64(&mut self, k: u32) -> u64 {
        debug_assert!(k <= 64);
        self.draw_bits(k as usize)
            .iter_u64_digits()
            .next()
            .unwrap_or(0)
    }

    fn draw_u128(&mut self, k: u32) -> u128 {
        debug_assert!(k <= 128);
        let drawn = self.draw_bits(k as usize);
        let mut digits = drawn.iter_u64_digits();
        let low = digits.next().unwrap_or(0);
        let high = digits.next().unwrap_or(0);
        (u128::from(high) << 64) | u128::from(low)
    }

    /// Uniform integer in `0..n` by rejection sampling, `n > 0`
    fn below_wide(&mut self, n: u128) -> u128 {
        debug_assert!(n > 0);
        let k = u128::BITS - n.leading_zeros();
        loop {
            let candidate = self.draw_u128(k);
            if candidate < n {
                return candidate;
            }
        }
    }

    /// Uniform float in `[0, 1)` from 53 bits
    pub fn uniform_float(&mut self) -> f64 {
        self.draw_u64(FLOAT_BITS) as f64 / FLOAT_SCALE
    }

    /// Uniform float between `a` and `b`
    pub fn uniform(&mut self, a: f64, b: f64) -> f64 {
        a + (b - a) * self.uniform_float()
    }

    /// Uniform integer in `0..n`
    pub fn below(&mut self, n: u64) -> Result<u64> {
        check_below(n)?;
        Ok(self.below_wide(u128::from(n)) as u64)
    }

    /// Uniform integer in `start..stop`
    pub fn randrange(&mut self, start: i64, stop: i64) -> Result<i64> {
        check_range(start, stop)?;
        let width = (i128::from(stop) - i128::from(start)) as u128;
        let offset = self.below_wide(width) as i128;
        Ok((i128::from(start) + offset) as i64)
    }

    /// Uniform integer in `low..=high`
    pub fn randint(&mut self, low: i64, high: i64) -> Result<i64> {
        check_inclusive_range(low, high)?;
        let width = (i128::from(high) - i128::from(low) + 1) as u128;
        let offset = self.below_wide(width) as i128;
        Ok((i128::from(low) + offset) as i64)
    }

    /// `true` with probability `p`; `p` outside `[0, 1]` saturates
    pub fn bernoulli(&mut self, p: f64) -> bool {
        self.uniform_float() < p
    }

    /// Uniformly chosen element, `None` for an empty slice
    ///
    /// No bits are consumed when `options` is empty.
    pub fn choice<'a, T>(&mut self, options: &'a [T]) -> Option<&'a T> {
        if options.is_empty() {
            return None;
        }
        let idx = self.below_wide(options.len() as u128) as usize;
        options.get(idx)
    }

    /// Fisher-Yates shuffle in place
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.below_wide((i + 1) as u128) as usize;
            items.swap(i, j);
        }
    }

    /// `k` distinct elements in selection order
    pub fn sample<T: Clone>(&mut self, population: &[T], k: usize) -> Result<Vec<T>> {
        check_sample(population.len(), k)?;
        let n = population.len();
        let mut pool: Vec<usize> = (0..n).collect();
        let mut picked = Vec::with_capacity(k);
        for i in 0..k {
            let j = self.below_wide((n - i) as u128) as usize;
            picked.push(population[pool[j]].clone());
            pool[j] = pool[n - i - 1];
        }
        Ok(picked)
    }

    /// Normally distributed float (Box-Muller)
    pub fn normal(&mut self, mu: f64, sigma: f64) -> Result<f64> {
        check_sigma(sigma)?;
        let u1 = self.uniform_float();
        let u2 = self.uniform_float();
        let radius = (-2.0 * (1.0 - u1).ln()).sqrt();
        Ok(mu + sigma * radius * (std::f64::consts::TAU * u2).cos())
    }

    /// Exponentially distributed float with rate `lambda`
    ///
    /// `lambda` must be positive.
    pub fn exponential(&mut self, lambda: f64) -> Result<f64> {
        check_rate(lambda)?;
        Ok(-(1.0 - self.uniform_float()).ln() / lambda)
    }

    /// Fill `dest` with one 8-bit draw per byte, in order
    pub fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.fill(dest);
    }

    fn fill(&mut self, dest: &mut [u8]) {
        for byte in dest {
            *byte = self.draw_u64(8) as u8;
        }
    }
}

impl RngCore for Sequence {
    fn next_u32(&mut self) -> u32 {
        self.draw_u64(32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.draw_u64(64)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.fill(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> std::result::Result<(), rand_core::Error> {
        self.fill(dest);
        Ok(())
    }
}

pub(crate) fn check_below(n: u64) -> Result<()> {
    if n == 0 {
        return Err(TreeError::invalid_argument("below(0) has no values to choose from"));
    }
    Ok(())
}

pub(crate) fn check_range(start: i64, stop: i64) -> Result<()> {
    if start >= stop {
        return Err(TreeError::invalid_argument(format!(
            "empty range for randrange({start}, {stop})"
        )));
    }
    Ok(())
}

pub(crate) fn check_inclusive_range(low: i64, high: i64) -> Result<()> {
    if low > high {
        return Err(TreeError::invalid_argument(format!(
            "empty range for randint({low}, {high})"
        )));
    }
    Ok(())
}

pub(crate) fn check_sigma(sigma: f64) -> Result<()> {
    if sigma.is_nan() || sigma < 0.0 {
        return Err(TreeError::invalid_argument(format!(
            "normal() needs a non-negative sigma, got {sigma}"
        )));
    }
    Ok(())
}

pub(crate) fn check_rate(lambda: f64) -> Result<()> {
    if lambda.is_nan() || lambda <= 0.0 {
        return Err(TreeError::invalid_argument(format!(
            "exponential() needs a positive rate, got {lambda}"
        )));
    }
    Ok(())
}

pub(crate) fn check_sample(population: usize, k: usize) -> Result<()> {
    if k > population {
        return Err(TreeError::invalid_argument(format!(
            "sample of {k} is larger than the population of {population}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn sequence(algorithm: HashAlgorithm, seed: &str) -> Sequence {
        let mut ctx = algorithm.new_context();
        ctx.update(seed.as_bytes());
        Sequence::from_context(ctx)
    }

    #[test]
    fn test_split_draws_match_single_draw() {
        for (k1, k2) in [(1, 1), (7, 300), (53, 53), (160, 1), (0, 17), (513, 2)] {
            let mut split = sequence(HashAlgorithm::Sha1, "split");
            let mut whole = sequence(HashAlgorithm::Sha1, "split");

            let low = split.draw_bits(k1);
            let high = split.draw_bits(k2);
            let joined = low | (high << k1);

            assert_eq!(joined, whole.draw_bits(k1 + k2), "k1={k1} k2={k2}");
        }
    }

    #[test]
    fn test_zero_bit_draw_hashes_nothing() {
        let mut seq = sequence(HashAlgorithm::Sha256, "zero");
        assert_eq!(seq.draw_bits(0), BigUint::zero());
        assert_eq!(seq.blocks_drawn(), 0);
    }

    #[test]
    fn test_blocks_follow_digest_width() {
        let mut seq = sequence(HashAlgorithm::Sha1, "width");
        seq.draw_bits(1);
        assert_eq!(seq.blocks_drawn(), 1);
        assert_eq!(seq.buffered_bits(), 159);

        seq.draw_bits(159);
        assert_eq!(seq.blocks_drawn(), 1);
        assert_eq!(seq.buffered_bits(), 0);

        seq.draw_bits(400);
        assert_eq!(seq.blocks_drawn(), 4);
        assert_eq!(seq.buffered_bits(), 80);
    }

    #[test]
    fn test_draws_stay_below_bound() {
        let mut seq = sequence(HashAlgorithm::Sha512, "bound");
        for k in [1usize, 5, 64, 65, 200] {
            let value = seq.draw_bits(k);
            assert!(value.bits() <= k as u64);
        }
    }

    #[test]
    fn test_first_block_is_not_reused() {
        let mut seq = sequence(HashAlgorithm::Sha1, "reuse");
        let first = seq.draw_bits(160);
        let second = seq.draw_bits(160);
        assert_ne!(first, second);
    }

    #[test]
    fn test_uniform_float_in_unit_interval() {
        let mut seq = sequence(HashAlgorithm::Blake3, "float");
        for _ in 0..1000 {
            let value = seq.uniform_float();
            assert!((0.0..1.0).contains(&value));
        }
    }

    #[test]
    fn test_below_and_ranges() {
        let mut seq = sequence(HashAlgorithm::Sha1, "ranges");
        for _ in 0..500 {
            assert!(seq.below(7).unwrap() < 7);
            let value = seq.randrange(-3, 4).unwrap();
            assert!((-3..4).contains(&value));
            let value = seq.randint(10, 12).unwrap();
            assert!((10..=12).contains(&value));
        }
        assert_eq!(seq.below(1).unwrap(), 0);
        assert_eq!(seq.randint(5, 5).unwrap(), 5);
    }

    #[test]
    fn test_full_width_randint() {
        let mut seq = sequence(HashAlgorithm::Sha256, "wide");
        for _ in 0..100 {
            seq.randint(i64::MIN, i64::MAX).unwrap();
        }
        let value = seq.randrange(i64::MIN, i64::MAX).unwrap();
        assert!(value < i64::MAX);
    }

    #[test]
    fn test_invalid_ranges_are_rejected() {
        let mut seq = sequence(HashAlgorithm::Sha1, "invalid");
        assert!(matches!(seq.below(0), Err(TreeError::InvalidArgument { .. })));
        assert!(matches!(seq.randrange(3, 3), Err(TreeError::InvalidArgument { .. })));
        assert!(matches!(seq.randint(4, 3), Err(TreeError::InvalidArgument { .. })));
        assert!(matches!(
            seq.sample(&[1, 2], 3),
            Err(TreeError::InvalidArgument { .. })
        ));
        assert!(matches!(seq.normal(0.0, -1.0), Err(TreeError::InvalidArgument { .. })));
        assert!(matches!(seq.normal(0.0, f64::NAN), Err(TreeError::InvalidArgument { .. })));
        assert!(matches!(seq.exponential(0.0), Err(TreeError::InvalidArgument { .. })));
        assert!(matches!(seq.exponential(-2.0), Err(TreeError::InvalidArgument { .. })));
        assert_eq!(seq.blocks_drawn(), 0);
    }

    #[test]
    fn test_wide_draws_keep_both_halves() {
        let mut wide = sequence(HashAlgorithm::Sha256, "wide");
        let mut replay = sequence(HashAlgorithm::Sha256, "wide");

        let value = wide.draw_u128(128);
        let expected = replay.draw_bits(128);
        assert_eq!(BigUint::from(value), expected);
        assert!(value >> 64 > 0);

        assert!(wide.below_wide(u128::MAX) < u128::MAX);
    }

    #[test]
    fn test_every_value_reachable() {
        let mut seq = sequence(HashAlgorithm::Sha1, "coverage");
        let mut seen = [false; 6];
        for _ in 0..200 {
            seen[seq.below(6).unwrap() as usize] = true;
        }
        assert!(seen.iter().all(|hit| *hit));
    }

    #[test]
    fn test_choice() {
        let mut seq = sequence(HashAlgorithm::Sha1, "choice");
        let empty: [u8; 0] = [];
        assert_eq!(seq.choice(&empty), None);
        assert_eq!(seq.blocks_drawn(), 0);

        let options = ["sam", "merry", "pippin"];
        let picked = seq.choice(&options).unwrap();
        assert!(options.contains(picked));
    }

    #[test]
    fn test_shuffle_is_permutation() {
        let mut seq = sequence(HashAlgorithm::Sha256, "shuffle");
        let mut items: Vec<u32> = (0..50).collect();
        seq.shuffle(&mut items);
        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..50).collect::<Vec<_>>());
        assert_ne!(items, sorted);
    }

    #[test]
    fn test_sample_is_distinct() {
        let mut seq = sequence(HashAlgorithm::Sha1, "sample");
        let population: Vec<u32> = (0..20).collect();
        let mut picked = seq.sample(&population, 20).unwrap();
        picked.sort_unstable();
        assert_eq!(picked, population);

        assert!(seq.sample(&population, 0).unwrap().is_empty());
    }

    #[test]
    fn test_distributions_are_finite() {
        let mut seq = sequence(HashAlgorithm::Sha1, "dist");
        for _ in 0..200 {
            assert!(seq.normal(0.0, 1.0).unwrap().is_finite());
            assert!(seq.exponential(2.0).unwrap() >= 0.0);
            let value = seq.uniform(-5.0, 5.0);
            assert!((-5.0..5.0).contains(&value));
        }
        assert!(!seq.bernoulli(0.0));
        assert!(seq.bernoulli(1.0));
    }

    #[test]
    fn test_fill_bytes_takes_eight_bits_each() {
        let mut bytes_seq = sequence(HashAlgorithm::Sha1, "bytes");
        let mut bits_seq = sequence(HashAlgorithm::Sha1, "bytes");

        let mut buf = [0u8; 5];
        bytes_seq.fill_bytes(&mut buf);
        let expected: Vec<u8> = (0..5)
            .map(|_| bits_seq.draw_bits(8).iter_u64_digits().next().unwrap_or(0) as u8)
            .collect();
        assert_eq!(buf.to_vec(), expected);
    }

    #[test]
    fn test_rng_core_matches_bit_draws() {
        let mut rng_seq = sequence(HashAlgorithm::Sha1, "rng");
        let mut bits_seq = sequence(HashAlgorithm::Sha1, "rng");

        let via_rng = rng_seq.next_u64();
        let via_bits = bits_seq.draw_bits(64).iter_u64_digits().next().unwrap_or(0);
        assert_eq!(via_rng, via_bits);

        let roll: u8 = rng_seq.gen_range(1..=6);
        assert!((1..=6).contains(&roll));
    }
}
