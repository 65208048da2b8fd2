//! Small numeric helpers shared by the feature groups.
//!
//! Every helper returns a finite value for finite input; empty input and
//! division by zero resolve to 0.

/// Arithmetic mean, `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population variance (0 for fewer than two samples)
pub fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values).unwrap_or(0.0);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

/// Population standard deviation
pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Coefficient of variation (`σ / μ`), `None` when empty or the mean is not positive.
///
/// The ratio is scale-free, so values are divided by their largest magnitude
/// first; sums of values near `f64::MAX` would otherwise overflow.
pub fn coefficient_of_variation(values: &[f64]) -> Option<f64> {
    let scale = values.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if scale == 0.0 || !scale.is_finite() {
        return None;
    }
    let scaled: Vec<f64> = values.iter().map(|v| v / scale).collect();
    let m = mean(&scaled)?;
    if m <= 0.0 {
        return None;
    }
    Some(finite_or_zero(std_dev(&scaled) / m))
}

/// Map a coefficient of variation onto 0-1, lower spread giving a higher score.
///
/// Formula: `1 / (1 + cv)`. Empty input scores 0; a non-positive mean with
/// data present (all zeros) scores 1.
pub fn regularity(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    match coefficient_of_variation(values) {
        Some(cv) => finite_or_zero(1.0 / (1.0 + cv)).clamp(0.0, 1.0),
        None => 1.0,
    }
}

/// `a / b`, or 0 when the result would not be finite
pub fn safe_div(a: f64, b: f64) -> f64 {
    if b == 0.0 {
        return 0.0;
    }
    finite_or_zero(a / b)
}

/// Exponential saturation onto 0-1: `1 - exp(-x / scale)`
pub fn saturate(x: f64, scale: f64) -> f64 {
    if x <= 0.0 || scale <= 0.0 {
        return 0.0;
    }
    (1.0 - (-x / scale).exp()).clamp(0.0, 1.0)
}

pub fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

/// Replace every non-finite entry with 0
pub fn sanitize_all(values: &mut [f64]) {
    for v in values.iter_mut() {
        *v = finite_or_zero(*v);
    }
}
