//! Percentile extraction for Monte Carlo samples

/// Standard percentiles reported for uncertainty bands
pub mod standard {
    pub const P10: f64 = 0.10;
    pub const P50: f64 = 0.50;
    pub const P90: f64 = 0.90;
}

/// Percentile of an ascending-sorted sample, interpolating linearly between
/// the two nearest order statistics (rank `q * (n - 1)`).
///
/// Returns `None` for an empty sample. `q` is clamped to [0, 1].
pub fn percentile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let rank = q.clamp(0.0, 1.0) * last as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

/// Sort a sample in place and read several percentiles from it
pub fn percentiles(sample: &mut [f64], qs: &[f64]) -> Option<Vec<f64>> {
    sample.sort_by(f64::total_cmp);
    qs.iter().map(|&q| percentile_sorted(sample, q)).collect()
}
