//! Small descriptive statistics helpers.

/// Median of `values`, averaging the two middle elements for even lengths.
///
/// Sorts `values` in place. Returns `None` for empty input.
pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

/// Arithmetic mean, `None` for empty input.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Fraction rendered as a percentage rounded to two decimals (`0.1234` → `12.34`).
pub fn fraction_to_pct(fraction: f64) -> f64 {
    (fraction * 10_000.0).round() / 100.0
}
