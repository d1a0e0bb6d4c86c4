//! Deterministic seed derivation and the per-link RNG.
//!
//! # Determinism strategy
//!
//! Every link owns its own `SmallRng`, seeded from a hash chain:
//!
//!   instance = hash(run_seed, hash_name(instance_name))
//!   channel  = hash(hash(instance, channel_index), CHANNEL_SALT)
//!   link     = hash(hash(hash(hash(channel, low_node), low_sector), high_node), high_sector)
//!
//! Links therefore never share RNG state, and the sequence a link draws
//! depends only on its own key and the order of its own advances.  That is
//! what makes the parallel precompute path bit-identical to the sequential
//! one: which thread advances a link does not matter.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

const SEED_MULTIPLIER: u64 = 98_385_721_723;
const INPUT_MULTIPLIER: u64 = 7_138_347_631;
const HASH_OFFSET: u64 = 924_713;

/// Smallest uniform value fed to the Box–Muller logarithm.
const MIN_UNIFORM: f64 = 1e-100;

/// Fold one input into a seed.
#[inline]
pub fn hash_seed(seed: u64, input: u64) -> u64 {
    SEED_MULTIPLIER
        .wrapping_mul(seed)
        .wrapping_add(INPUT_MULTIPLIER.wrapping_mul(input))
        .wrapping_add(HASH_OFFSET)
}

/// Fold every input into `seed`, left to right.
#[inline]
pub fn hash_seed_all(seed: u64, inputs: &[u64]) -> u64 {
    inputs.iter().fold(seed, |acc, &x| hash_seed(acc, x))
}

/// Stable string hash (djb2, multiplier 33) for naming model instances.
pub fn hash_name(name: &str) -> u64 {
    name.bytes()
        .fold(5381u64, |h, b| h.wrapping_mul(33).wrapping_add(b as u64))
}

// ── LinkRng ───────────────────────────────────────────────────────────────────

/// Per-link deterministic RNG.
///
/// Owned by exactly one link state; never shared across threads.
#[derive(Clone, Debug)]
pub struct LinkRng(SmallRng);

impl LinkRng {
    pub fn new(seed: u64) -> Self {
        LinkRng(SmallRng::seed_from_u64(seed))
    }

    /// Uniform sample in `[0, 1)`.
    #[inline]
    pub fn uniform(&mut self) -> f64 {
        self.0.r#gen::<f64>()
    }

    /// Two independent standard normal samples (Box–Muller).
    #[inline]
    pub fn gaussian_pair(&mut self) -> (f64, f64) {
        let u1 = self.uniform().max(MIN_UNIFORM);
        let u2 = self.uniform();
        let radius = (-2.0 * u1.ln()).sqrt();
        let angle = 2.0 * std::f64::consts::PI * u2;
        (radius * angle.cos(), radius * angle.sin())
    }
}
