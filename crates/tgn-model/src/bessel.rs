//! Bessel functions of the first kind for the angular-correlation series.
//!
//! The correlation series walks `J_n(x)` over consecutive integer orders at a
//! fixed argument, so the whole sequence is produced at once by Miller's
//! backward recurrence
//!
//!   J_{n-1}(x) = (2n / x)·J_n(x) − J_{n+1}(x)
//!
//! started far above the highest order wanted and normalized with the
//! identity `J_0 + 2·Σ J_{2k} = 1`.  Backward recurrence is stable for every
//! order, including those below `x` where forward recurrence would also work,
//! and those far above it where forward recurrence loses all precision.

const RESCALE_ABOVE: f64 = 1e250;
const RESCALE_BY: f64 = 1e-250;

/// `[J_0(x), J_1(x), …, J_max_order(x)]` for `x ≥ 0`.
pub fn bessel_j_sequence(x: f64, max_order: usize) -> Vec<f64> {
    assert!(x >= 0.0 && x.is_finite(), "bessel argument must be finite and non-negative, got {x}");

    let mut values = vec![0.0; max_order + 1];
    if x == 0.0 {
        values[0] = 1.0;
        return values;
    }

    let start = recurrence_start(x, max_order);
    let two_over_x = 2.0 / x;

    let mut upper = 0.0; // J_{k+1}
    let mut current = 1.0; // J_k
    let mut normalization = 0.0;

    for k in (1..=start).rev() {
        if k <= max_order {
            values[k] = current;
        }
        if k % 2 == 0 {
            normalization += 2.0 * current;
        }
        let lower = k as f64 * two_over_x * current - upper;
        upper = current;
        current = lower;

        if current.abs() > RESCALE_ABOVE {
            current *= RESCALE_BY;
            upper *= RESCALE_BY;
            normalization *= RESCALE_BY;
            for v in values.iter_mut().skip(k) {
                *v *= RESCALE_BY;
            }
        }
    }
    values[0] = current;
    normalization += current;

    for v in &mut values {
        *v /= normalization;
    }
    values
}

/// Highest order needed before the correlation series for argument `x`
/// falls below machine precision.
pub fn series_order_bound(x: f64) -> usize {
    2 * x.ceil() as usize + 64
}

/// Even starting order comfortably above both `max_order` and `x`.
fn recurrence_start(x: f64, max_order: usize) -> usize {
    let top = max_order.max(x.ceil() as usize);
    let start = top + 20 + 2 * ((40 * top) as f64).sqrt() as usize;
    start + (start % 2)
}
