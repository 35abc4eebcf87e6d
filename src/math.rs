use itertools::izip;
use statrs::function::gamma::ln_gamma;

#[inline]
pub(crate) fn dot(x: &[f64], y: &[f64]) -> f64 {
    assert!(x.len() == y.len());
    izip!(x, y).map(|(a, b)| a * b).sum()
}

/// `ln(k!)` via the log-gamma function, finite for any count.
#[inline]
pub(crate) fn ln_factorial(k: u64) -> f64 {
    if k < 2 {
        return 0.;
    }
    ln_gamma(k as f64 + 1.)
}

/// Empirical quantile of already sorted values, linear interpolation
/// between order statistics (position `(n - 1) * p`).
///
/// # Panics
///
/// If `sorted` is empty or `p` lies outside `[0, 1]`.
pub fn quantile(sorted: &[f64], p: f64) -> f64 {
    assert!(!sorted.is_empty(), "quantile of an empty sample");
    assert!((0. ..=1.).contains(&p), "quantile level must lie in [0, 1]");
    let pos = (sorted.len() - 1) as f64 * p;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}
