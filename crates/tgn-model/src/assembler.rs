//! Per-tap time-domain matrices → per-subcarrier frequency-domain matrices.
//!
//! Tap `t` sits at delay `t·Δτ`.  Subcarrier `k` of `N` sits at
//! `f_k = f_c + (k − ⌊N/2⌋)·B/N`, so the phase rotation tap `t` picks up on
//! subcarrier `k` is `2π·t·Δτ·f_k`, reduced modulo `2π` before the sine and
//! cosine are taken (`f_k` is in the GHz range).

use std::f64::consts::PI;

use num_complex::Complex64;

use crate::ComplexMatrix;

/// OFDM subcarrier grid of one RF channel.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SubcarrierLayout {
    pub center_frequency_hz: f64,
    pub bandwidth_hz: f64,
    pub subcarrier_count: usize,
}

impl SubcarrierLayout {
    /// Absolute RF frequency of subcarrier `index`.
    pub fn subcarrier_frequency_hz(&self, index: usize) -> f64 {
        let spacing = self.bandwidth_hz / self.subcarrier_count as f64;
        let centered = index as i64 - (self.subcarrier_count / 2) as i64;
        self.center_frequency_hz + spacing * centered as f64
    }
}

/// Rebuild `out` as one `rows × cols` matrix per subcarrier:
/// `H_k = Σ_t tapH[t] · e^{i·2π·t·Δτ·f_k}`.
///
/// # Panics
/// Panics if the tap matrices do not all share one shape.
pub fn assemble_subcarrier_matrices(
    tap_matrices:   &[ComplexMatrix],
    layout:         &SubcarrierLayout,
    tap_delay_secs: f64,
    out:            &mut Vec<ComplexMatrix>,
) {
    let (rows, cols) = tap_matrices
        .first()
        .map(|m| (m.rows(), m.cols()))
        .unwrap_or((0, 0));
    assert!(
        tap_matrices.iter().all(|m| m.rows() == rows && m.cols() == cols),
        "tap matrices differ in shape"
    );

    out.clear();
    out.reserve(layout.subcarrier_count);

    for k in 0..layout.subcarrier_count {
        let frequency_hz = layout.subcarrier_frequency_hz(k);
        let rotations: Vec<Complex64> = (0..tap_matrices.len())
            .map(|t| {
                let delay = t as f64 * tap_delay_secs;
                let phase = (2.0 * PI * delay * frequency_hz) % (2.0 * PI);
                Complex64::new(phase.cos(), phase.sin())
            })
            .collect();

        let matrix = ComplexMatrix::from_fn(rows, cols, |n, m| {
            tap_matrices
                .iter()
                .zip(&rotations)
                .map(|(tap, rotation)| tap[(n, m)] * rotation)
                .sum()
        });
        out.push(matrix);
    }
}
