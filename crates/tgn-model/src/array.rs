//! Uniform linear antenna arrays.

use std::f64::consts::PI;

use num_complex::Complex64;

/// `antenna_count` elements on a line, `spacing_wavelengths` apart.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UniformLinearArray {
    pub antenna_count: usize,
    pub spacing_wavelengths: f64,
}

impl UniformLinearArray {
    pub fn new(antenna_count: usize, spacing_wavelengths: f64) -> Self {
        Self { antenna_count, spacing_wavelengths }
    }

    /// Distance of every element from the first, in wavelengths.
    pub fn distances_from_first(&self) -> Vec<f64> {
        (0..self.antenna_count)
            .map(|i| i as f64 * self.spacing_wavelengths)
            .collect()
    }

    /// Far-field steering vector for a plane wave at `angle_rad` from broadside.
    pub fn steering_vector(&self, angle_rad: f64) -> Vec<Complex64> {
        let phase_step = 2.0 * PI * self.spacing_wavelengths * angle_rad.sin();
        (0..self.antenna_count)
            .map(|i| Complex64::from_polar(1.0, i as f64 * phase_step))
            .collect()
    }
}
