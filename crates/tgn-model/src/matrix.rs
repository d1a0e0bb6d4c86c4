//! Dense complex matrices sized for antenna arrays.
//!
//! Only the handful of operations the channel model needs: element access,
//! transpose, matrix-vector and matrix-matrix products, and the Kronecker
//! product.  Storage is row-major.

use std::ops::{Index, IndexMut};

use num_complex::Complex64;

#[derive(Clone, Debug, PartialEq)]
pub struct ComplexMatrix {
    rows: usize,
    cols: usize,
    data: Vec<Complex64>,
}

impl ComplexMatrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![Complex64::new(0.0, 0.0); rows * cols],
        }
    }

    /// Build element by element from `f(row, col)`.
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> Complex64) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                data.push(f(r, c));
            }
        }
        Self { rows, cols, data }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn as_slice(&self) -> &[Complex64] {
        &self.data
    }

    pub fn transpose(&self) -> Self {
        Self::from_fn(self.cols, self.rows, |r, c| self[(c, r)])
    }

    pub fn conj_transpose(&self) -> Self {
        Self::from_fn(self.cols, self.rows, |r, c| self[(c, r)].conj())
    }

    /// `self · v`.
    ///
    /// # Panics
    /// Panics if `v.len() != self.cols()`.
    pub fn mul_vec(&self, v: &[Complex64]) -> Vec<Complex64> {
        assert_eq!(v.len(), self.cols, "vector length does not match matrix columns");
        self.data
            .chunks_exact(self.cols.max(1))
            .take(self.rows)
            .map(|row| row.iter().zip(v).map(|(a, b)| a * b).sum())
            .collect()
    }

    /// `self · other`.
    pub fn matmul(&self, other: &ComplexMatrix) -> Self {
        assert_eq!(self.cols, other.rows, "inner dimensions differ");
        Self::from_fn(self.rows, other.cols, |r, c| {
            (0..self.cols).map(|k| self[(r, k)] * other[(k, c)]).sum()
        })
    }

    /// Kronecker product `self ⊗ other`.
    pub fn kronecker(&self, other: &ComplexMatrix) -> Self {
        Self::from_fn(self.rows * other.rows, self.cols * other.cols, |r, c| {
            self[(r / other.rows, c / other.cols)] * other[(r % other.rows, c % other.cols)]
        })
    }

    /// Largest element-wise distance to `other` (same shape required).
    pub fn max_abs_diff(&self, other: &ComplexMatrix) -> f64 {
        assert_eq!((self.rows, self.cols), (other.rows, other.cols), "shape mismatch");
        self.data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| (a - b).norm())
            .fold(0.0, f64::max)
    }

    /// Sum of squared magnitudes.
    pub fn power(&self) -> f64 {
        self.data.iter().map(|z| z.norm_sqr()).sum()
    }
}

impl Index<(usize, usize)> for ComplexMatrix {
    type Output = Complex64;

    #[inline]
    fn index(&self, (r, c): (usize, usize)) -> &Complex64 {
        debug_assert!(r < self.rows && c < self.cols);
        &self.data[r * self.cols + c]
    }
}

impl IndexMut<(usize, usize)> for ComplexMatrix {
    #[inline]
    fn index_mut(&mut self, (r, c): (usize, usize)) -> &mut Complex64 {
        debug_assert!(r < self.rows && c < self.cols);
        &mut self.data[r * self.cols + c]
    }
}
