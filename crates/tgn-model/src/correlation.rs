//! Spatial correlation for one tap.
//!
//! For a uniform linear array, the correlation between two elements `d`
//! wavelengths apart under a truncated-Laplacian power angle spectrum has a
//! closed form as a Bessel series:
//!
//! ```text
//! Rxx(d) = J0(x) + Σ_k 4·Q_k/(σ_k√2) · Σ_{j≥1} J_{2j}(x)   / (2/σ_k² + (2j)²)   · cos(2j·φ_k)     · (√2/σ_k − e^{−π√2/σ_k}·(√2/σ_k)·cos(2jπ))
//! Rxy(d) =         Σ_k 4·Q_k/(σ_k√2) · Σ_{j≥0} J_{2j+1}(x) / (2/σ_k² + (2j+1)²) · sin((2j+1)·φ_k) · (√2/σ_k − e^{−π√2/σ_k}·(√2/σ_k)·cos((2j+1)π))
//! ```
//!
//! with `x = 2πd`, `φ_k` the cluster's nominal angle and `σ_k` its Laplacian
//! standard deviation.  Each inner series stops at the first term smaller
//! than `100·ε`.  The complex correlations `Rxx + i·Rxy` fill a Hermitian
//! Toeplitz matrix per array; the tap's full correlation is the Kronecker
//! product departure ⊗ arrival, factored as `L·Lᴴ`.
//!
//! The factor is taken per array and combined as `L_tx ⊗ L_rx`, which is the
//! unique Cholesky factor of `R_tx ⊗ R_rx`.  Closely spaced 8-element arrays
//! have correlation eigenvalues near 1e-12, so the 64×64 product is
//! numerically singular in `f64` while each 8×8 factor is still well within
//! reach.

use std::f64::consts::{PI, SQRT_2};

use num_complex::Complex64;

use crate::bessel::{bessel_j_sequence, series_order_bound};
use crate::{ClusterDescriptor, ComplexMatrix, TapProfile, UniformLinearArray};

const SERIES_EPSILON: f64 = 100.0 * f64::EPSILON;

/// Residuals this far below zero (relative to the diagonal) mean the input
/// was not positive semi-definite.  Anything between this and zero is
/// rounding on a rank-deficient input and factors as a zero pivot.
const NON_PSD_TOLERANCE: f64 = 1e-9;

const HERMITIAN_TOLERANCE: f64 = 1e-12;

// ── Cluster weights ───────────────────────────────────────────────────────────

/// Truncated-Laplacian mass of one cluster's power angle spectrum.
#[inline]
fn truncated_mass(laplacian_sd_rad: f64) -> f64 {
    1.0 - (-(SQRT_2 * PI) / laplacian_sd_rad).exp()
}

/// Compute `Q` for every cluster so that the weighted truncated masses sum
/// to one, with each cluster's weight proportional to its Laplacian scale
/// times its power relative to cluster 0.
pub fn normalize_cluster_weights(clusters: &mut [ClusterDescriptor]) {
    let Some(first) = clusters.first() else {
        return;
    };
    let reference = first.laplacian_sd_rad * first.relative_power;

    let ratios: Vec<f64> = clusters
        .iter()
        .enumerate()
        .map(|(i, c)| if i == 0 { 1.0 } else { c.laplacian_sd_rad * c.relative_power / reference })
        .collect();

    let total: f64 = clusters
        .iter()
        .zip(&ratios)
        .map(|(c, ratio)| ratio * truncated_mass(c.laplacian_sd_rad))
        .sum();

    for (c, ratio) in clusters.iter_mut().zip(ratios) {
        c.weight_q = ratio / total;
    }
}

/// `Σ Q_k · (1 − e^{−√2π/σ_k})`; one after [`normalize_cluster_weights`].
pub fn weighted_truncated_mass(clusters: &[ClusterDescriptor]) -> f64 {
    clusters
        .iter()
        .map(|c| c.weight_q * truncated_mass(c.laplacian_sd_rad))
        .sum()
}

// ── Correlation coefficients ──────────────────────────────────────────────────

/// `Rxx(d) + i·Rxy(d)` for every distance (in wavelengths).
pub fn angular_correlation(clusters: &[ClusterDescriptor], distances_wavelengths: &[f64]) -> Vec<Complex64> {
    distances_wavelengths
        .iter()
        .map(|&d| {
            let x = 2.0 * PI * d;
            let bessel = bessel_j_sequence(x, series_order_bound(x));
            let rxx = bessel[0] + clusters.iter().map(|c| cluster_rxx(c, &bessel)).sum::<f64>();
            let rxy: f64 = clusters.iter().map(|c| cluster_rxy(c, &bessel)).sum();
            Complex64::new(rxx, rxy)
        })
        .collect()
}

fn cluster_rxx(cluster: &ClusterDescriptor, bessel: &[f64]) -> f64 {
    let sd = cluster.laplacian_sd_rad;
    let total = sum_series(bessel, sd, 1, |order| {
        let n = order as f64;
        (n * cluster.angle_rad).cos() * (SQRT_2 / sd - edge_decay(sd) * (SQRT_2 / sd) * (n * PI).cos())
    });
    4.0 * (cluster.weight_q / (sd * SQRT_2)) * total
}

fn cluster_rxy(cluster: &ClusterDescriptor, bessel: &[f64]) -> f64 {
    let sd = cluster.laplacian_sd_rad;
    let total = sum_series(bessel, sd, 0, |order| {
        let n = order as f64;
        (n * cluster.angle_rad).sin() * (SQRT_2 / sd - edge_decay(sd) * (SQRT_2 / sd) * (n * PI).cos())
    });
    4.0 * (cluster.weight_q / (sd * SQRT_2)) * total
}

#[inline]
fn edge_decay(sd: f64) -> f64 {
    ((-PI * SQRT_2) / sd).exp()
}

/// Sum `J_n / (2/σ² + n²) · factor(n)` over `n = 2j + parity`, `j = first_j..`,
/// stopping after the first term below [`SERIES_EPSILON`].
fn sum_series(bessel: &[f64], sd: f64, parity: usize, factor: impl Fn(usize) -> f64) -> f64 {
    let base = 2.0 / (sd * sd);
    let mut total = 0.0;
    let mut j = 1 - parity;
    loop {
        let order = 2 * j + parity;
        assert!(order < bessel.len(), "correlation series did not converge");
        let n = order as f64;
        let term = bessel[order] / (base + n * n) * factor(order);
        total += term;
        if term.abs() < SERIES_EPSILON {
            return total;
        }
        j += 1;
    }
}

// ── Matrix construction ───────────────────────────────────────────────────────

/// Hermitian Toeplitz matrix with `row` as its first row and `conj(row)` as
/// its first column.
pub fn toeplitz_matrix(row: &[Complex64]) -> ComplexMatrix {
    ComplexMatrix::from_fn(row.len(), row.len(), |r, c| {
        if c >= r { row[c - r] } else { row[r - c].conj() }
    })
}

/// Correlation matrix of one array under one direction's clusters.
pub fn array_correlation(clusters: &[ClusterDescriptor], array: &UniformLinearArray) -> ComplexMatrix {
    toeplitz_matrix(&angular_correlation(clusters, &array.distances_from_first()))
}

/// Full `(numTx·numRx)²` correlation of one tap: departure ⊗ arrival.
pub fn spatial_correlation(
    tap:       &TapProfile,
    departure: &UniformLinearArray,
    arrival:   &UniformLinearArray,
) -> ComplexMatrix {
    let tx = array_correlation(&tap.departure, departure);
    let rx = array_correlation(&tap.arrival, arrival);
    tx.kronecker(&rx)
}

/// Lower-triangular `L` with `L·Lᴴ = R_tx ⊗ R_rx` for one tap.
pub fn correlation_factor(
    tap:       &TapProfile,
    departure: &UniformLinearArray,
    arrival:   &UniformLinearArray,
) -> ComplexMatrix {
    let tx = cholesky_factor(&array_correlation(&tap.departure, departure));
    let rx = cholesky_factor(&array_correlation(&tap.arrival, arrival));
    tx.kronecker(&rx)
}

/// Cholesky factorization of a Hermitian positive semi-definite matrix.
///
/// # Panics
/// Panics if the input is not square, not Hermitian, or has a diagonal
/// residual that is clearly negative.  The correlation matrices built here
/// are PSD by construction, so any of these is a logic error.
pub fn cholesky_factor(matrix: &ComplexMatrix) -> ComplexMatrix {
    let n = matrix.rows();
    assert_eq!(n, matrix.cols(), "Cholesky input must be square");
    let mut lower = ComplexMatrix::zeros(n, n);

    for i in 0..n {
        for j in 0..=i {
            if i == j {
                let diagonal = matrix[(i, i)];
                let scale = diagonal.re.abs().max(f64::MIN_POSITIVE);
                assert!(
                    diagonal.im.abs() <= HERMITIAN_TOLERANCE * scale,
                    "correlation diagonal ({i},{i}) is not real: {diagonal}"
                );
                let sum: f64 = (0..i).map(|k| lower[(i, k)].norm_sqr()).sum();
                let residual = diagonal.re - sum;
                assert!(
                    residual >= -NON_PSD_TOLERANCE * scale,
                    "correlation matrix is not positive semi-definite at ({i},{i}): residual {residual}"
                );
                lower[(i, i)] = if residual <= 0.0 {
                    Complex64::new(0.0, 0.0)
                } else {
                    Complex64::new(residual.sqrt(), 0.0)
                };
            } else {
                let value = matrix[(i, j)];
                let mirror = matrix[(j, i)].conj();
                assert!(
                    (value - mirror).norm() <= HERMITIAN_TOLERANCE * value.norm().max(1.0),
                    "correlation matrix is not Hermitian at ({i},{j})"
                );
                let pivot = lower[(j, j)].re;
                if pivot == 0.0 {
                    continue;
                }
                let sum: Complex64 = (0..j).map(|k| lower[(i, k)] * lower[(j, k)].conj()).sum();
                lower[(i, j)] = (value - sum) / pivot;
            }
        }
    }
    lower
}
