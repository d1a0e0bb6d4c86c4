//! The Bell Doppler filter.
//!
//! A fixed 7th-order IIR filter designed for a normalized Doppler spread of
//! 1/300: fed white complex Gaussian noise at the fading sample rate, it
//! outputs samples whose spectrum follows the classic indoor "bell" Doppler
//! shape.  The filter runs in direct form II transposed, one state vector per
//! antenna pair.
//!
//! Only the in-phase part of the noise is scaled by 1/√2: the input has
//! variance 1/2 on the real axis and 1 on the imaginary axis (total power
//! 3/2), and the filter has close to unit power gain, so that split carries
//! through to every fading sample.

use std::f64::consts::FRAC_1_SQRT_2;

use num_complex::Complex64;
use tgn_core::LinkRng;

/// Doppler spread the filter coefficients were designed for, as a fraction
/// of the fading sample rate.
pub const NORMALIZED_DOPPLER_SPREAD: f64 = 1.0 / 300.0;

/// Samples discarded after a fresh state is created, to flush the transient.
pub const WARMUP_SAMPLES: usize = 1000;

const ORDER: usize = 7;

static NUMERATOR: [f64; ORDER + 1] = [
    2.785150513156437e-4,
    -1.289546865642764e-3,
    2.616769929393532e-3,
    -3.041340177530218e-3,
    2.204942394725852e-3,
    -9.996063557790929e-4,
    2.558709319878001e-4,
    -2.518824257145505e-5,
];

static DENOMINATOR: [f64; ORDER + 1] = [
    1.0,
    -5.945307133332568,
    1.481117656568614e1,
    -1.985278212976179e1,
    1.520727030904915e1,
    -6.437156952794267,
    1.279595585941577,
    -6.279622049460144e-2,
];

/// Delay line of one Bell filter instance.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FadingFilterState {
    delays: [Complex64; ORDER],
}

impl FadingFilterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw one noise sample `g1/√2 + j·g2` and filter it.
    #[inline]
    pub fn next_sample(&mut self, rng: &mut LinkRng) -> Complex64 {
        let (g1, g2) = rng.gaussian_pair();
        self.filter(Complex64::new(g1 * FRAC_1_SQRT_2, g2))
    }

    /// Advance the filter by `count` samples, discarding the outputs.
    pub fn skip(&mut self, rng: &mut LinkRng, count: usize) {
        for _ in 0..count {
            self.next_sample(rng);
        }
    }

    /// One step of `y = filter(b, a, x)` with the Bell coefficients.
    #[inline]
    pub fn filter(&mut self, x: Complex64) -> Complex64 {
        let y = x * NUMERATOR[0] + self.delays[0];
        for j in 0..ORDER - 1 {
            self.delays[j] = self.delays[j + 1] + x * NUMERATOR[j + 1] - y * DENOMINATOR[j + 1];
        }
        self.delays[ORDER - 1] = x * NUMERATOR[ORDER] - y * DENOMINATOR[ORDER];
        y
    }
}
