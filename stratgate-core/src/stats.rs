//! Small numeric helpers shared by the gates.
//!
//! Pure functions over slices. Degenerate inputs return explicit errors or
//! documented neutral values; nothing here panics on empty input.

use std::cmp::Ordering;

use crate::error::ValidationError;

/// Variance below this is treated as zero.
pub const VARIANCE_EPSILON: f64 = 1e-24;

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator). 0 for fewer than 2 values.
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

/// Population standard deviation (n denominator). 0 for empty input.
pub fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

pub fn sort_ascending(values: &mut [f64]) {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
}

/// Percentile of a sorted slice using linear interpolation, `p` in [0, 100].
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n == 1 {
        return sorted[0];
    }
    let rank = (p.clamp(0.0, 100.0) / 100.0) * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    let frac = rank - lo as f64;
    sorted[lo] * (1.0 - frac) + sorted[hi] * frac
}

/// Median of an unsorted slice (sorts a copy).
pub fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sort_ascending(&mut sorted);
    percentile_sorted(&sorted, 50.0)
}

/// Pearson correlation of two equal-length series.
///
/// Errors on length mismatch, fewer than two observations, or when either
/// side has zero variance (correlation undefined).
pub fn pearson_correlation(
    x: &[f64],
    y: &[f64],
    x_name: &str,
    y_name: &str,
) -> Result<f64, ValidationError> {
    if x.len() != y.len() {
        return Err(ValidationError::UndefinedStatistic(format!(
            "correlation of {x_name} ({}) and {y_name} ({}) needs equal lengths",
            x.len(),
            y.len()
        )));
    }
    if x.len() < 2 {
        return Err(ValidationError::UndefinedStatistic(format!(
            "correlation of {x_name} and {y_name} needs at least 2 observations"
        )));
    }

    let mean_x = mean(x);
    let mean_y = mean(y);
    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x <= VARIANCE_EPSILON {
        return Err(ValidationError::ZeroVariance {
            name: x_name.to_string(),
        });
    }
    if var_y <= VARIANCE_EPSILON {
        return Err(ValidationError::ZeroVariance {
            name: y_name.to_string(),
        });
    }

    Ok((cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0))
}

/// Standardize each column to zero mean and unit population variance.
///
/// Zero-variance columns become all zeros.
pub fn standardize_columns(rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let n_cols = rows.first().map_or(0, Vec::len);
    let mut out = rows.to_vec();
    for j in 0..n_cols {
        let column: Vec<f64> = rows.iter().map(|r| r[j]).collect();
        let m = mean(&column);
        let sd = population_std(&column);
        for row in out.iter_mut() {
            row[j] = if sd * sd <= VARIANCE_EPSILON {
                0.0
            } else {
                (row[j] - m) / sd
            };
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentile_interpolates() {
        let sorted = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile_sorted(&sorted, 0.0), 1.0);
        assert_eq!(percentile_sorted(&sorted, 50.0), 3.0);
        assert_eq!(percentile_sorted(&sorted, 100.0), 5.0);
        assert!((percentile_sorted(&sorted, 25.0) - 2.0).abs() < 1e-12);
        assert!((percentile_sorted(&sorted, 10.0) - 1.4).abs() < 1e-12);
    }

    #[test]
    fn median_of_even_count_averages() {
        assert!((median(&[4.0, 1.0, 3.0, 2.0]) - 2.5).abs() < 1e-12);
        assert_eq!(median(&[]), 0.0);
    }

    #[test]
    fn std_variants() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((population_std(&v) - 2.0).abs() < 1e-12);
        assert!(sample_std(&v) > population_std(&v));
        assert_eq!(sample_std(&[1.0]), 0.0);
    }

    #[test]
    fn correlation_perfect_and_inverse() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [2.0, 4.0, 6.0, 8.0];
        let z = [8.0, 6.0, 4.0, 2.0];
        assert!((pearson_correlation(&x, &y, "x", "y").unwrap() - 1.0).abs() < 1e-12);
        assert!((pearson_correlation(&x, &z, "x", "z").unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn correlation_zero_variance_is_error() {
        let err = pearson_correlation(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0], "signals", "h1")
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::ZeroVariance {
                name: "signals".into()
            }
        );
    }

    #[test]
    fn standardize_handles_constant_column() {
        let rows = vec![vec![1.0, 5.0], vec![3.0, 5.0]];
        let z = standardize_columns(&rows);
        assert!((z[0][0] + 1.0).abs() < 1e-12);
        assert!((z[1][0] - 1.0).abs() < 1e-12);
        assert_eq!(z[0][1], 0.0);
        assert_eq!(z[1][1], 0.0);
    }
}
