//! Plain `f64` summary statistics.
//!
//! Percentiles use linear interpolation between closest ranks, the same
//! method as numpy's default `percentile`: for `n` sorted values the rank is
//! `q * (n - 1)` and fractional ranks blend the two neighbouring values.

/// Arithmetic mean. `None` for an empty slice.
///
/// Finite input always yields a finite mean: if the plain sum overflows,
/// each value is scaled by `1 / n` before summing.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let sum = values.iter().sum::<f64>();
    if sum.is_finite() {
        return Some(sum / n);
    }
    Some(values.iter().map(|v| v / n).sum())
}

/// `q`-th percentile (0–100) of `values`, which need not be sorted.
/// `None` for an empty slice.
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    percentile_sorted(&sorted, q)
}

/// Same as [`percentile`] but over an already ascending slice.
pub fn percentile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }

    let rank = (q.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;

    let (a, b) = (sorted[lo], sorted[hi]);
    if lo == hi {
        return Some(a);
    }
    let span = b - a;
    if span.is_finite() {
        Some(a + frac * span)
    } else {
        // Neighbours far enough apart that their difference overflows
        Some(a * (1.0 - frac) + b * frac)
    }
}
