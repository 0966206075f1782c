//! Ordered series consumed by the gates: equity curves, timestamped scalar
//! series (signals, prices) and row-major feature matrices.
//!
//! Constructors enforce the data-model invariants (non-empty where required,
//! strictly increasing timestamps, finite values), so every gate can assume
//! well-formed input once it holds one of these types.

use std::ops::Range;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Synthetic timestamps for index-ordered data: consecutive seconds from the
/// Unix epoch.
pub fn sequential_timestamps(len: usize) -> Vec<DateTime<Utc>> {
    let epoch = DateTime::<Utc>::default();
    (0..len)
        .map(|i| epoch + Duration::seconds(i as i64))
        .collect()
}

fn check_finite(name: &'static str, values: &[f64]) -> Result<(), ValidationError> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(ValidationError::NonFinite { name, index }),
        None => Ok(()),
    }
}

fn check_increasing(
    name: &'static str,
    timestamps: &[DateTime<Utc>],
) -> Result<(), ValidationError> {
    match timestamps.windows(2).position(|w| w[1] <= w[0]) {
        Some(i) => Err(ValidationError::NonMonotonicTimestamps { name, index: i + 1 }),
        None => Ok(()),
    }
}

// ─── Equity curve ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub equity: f64,
}

/// Cumulative account value over time. Never empty, strictly time-ordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawEquityCurve", into = "Vec<EquityPoint>")]
pub struct EquityCurve {
    points: Vec<EquityPoint>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawEquityCurve {
    Values(Vec<f64>),
    Points(Vec<EquityPoint>),
}

impl TryFrom<RawEquityCurve> for EquityCurve {
    type Error = ValidationError;

    fn try_from(raw: RawEquityCurve) -> Result<Self, Self::Error> {
        match raw {
            RawEquityCurve::Values(values) => Self::from_values(&values),
            RawEquityCurve::Points(points) => Self::new(points),
        }
    }
}

impl From<EquityCurve> for Vec<EquityPoint> {
    fn from(curve: EquityCurve) -> Self {
        curve.points
    }
}

impl EquityCurve {
    pub fn new(points: Vec<EquityPoint>) -> Result<Self, ValidationError> {
        if points.is_empty() {
            return Err(ValidationError::EmptySeries {
                name: "equity_curve",
            });
        }
        let values: Vec<f64> = points.iter().map(|p| p.equity).collect();
        check_finite("equity_curve", &values)?;
        let timestamps: Vec<DateTime<Utc>> = points.iter().map(|p| p.timestamp).collect();
        check_increasing("equity_curve", &timestamps)?;
        Ok(Self { points })
    }

    /// Build an index-ordered curve with synthetic timestamps.
    pub fn from_values(values: &[f64]) -> Result<Self, ValidationError> {
        let points = sequential_timestamps(values.len())
            .into_iter()
            .zip(values)
            .map(|(timestamp, &equity)| EquityPoint { timestamp, equity })
            .collect();
        Self::new(points)
    }

    pub fn points(&self) -> &[EquityPoint] {
        &self.points
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.equity).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false: construction rejects empty curves.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> f64 {
        self.points[0].equity
    }

    /// Per-period simple returns. Periods starting at non-positive equity
    /// contribute 0.
    pub fn period_returns(&self) -> Vec<f64> {
        self.points
            .windows(2)
            .map(|w| {
                if w[0].equity > 0.0 {
                    (w[1].equity - w[0].equity) / w[0].equity
                } else {
                    0.0
                }
            })
            .collect()
    }
}

// ─── Timestamped scalar series ───────────────────────────────────────

/// Scalar observations paired with strictly increasing timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTimeSeries")]
pub struct TimeSeries {
    timestamps: Vec<DateTime<Utc>>,
    values: Vec<f64>,
}

/// Strategy signal strength per period.
pub type SignalSeries = TimeSeries;
/// Market price per period.
pub type PriceSeries = TimeSeries;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimeSeries {
    Values(Vec<f64>),
    Stamped {
        timestamps: Vec<DateTime<Utc>>,
        values: Vec<f64>,
    },
}

impl TryFrom<RawTimeSeries> for TimeSeries {
    type Error = ValidationError;

    fn try_from(raw: RawTimeSeries) -> Result<Self, Self::Error> {
        match raw {
            RawTimeSeries::Values(values) => Self::from_values(values),
            RawTimeSeries::Stamped { timestamps, values } => Self::new(timestamps, values),
        }
    }
}

impl TimeSeries {
    pub fn new(timestamps: Vec<DateTime<Utc>>, values: Vec<f64>) -> Result<Self, ValidationError> {
        if timestamps.len() != values.len() {
            return Err(ValidationError::LengthMismatch {
                left: "timestamps",
                left_len: timestamps.len(),
                right: "values",
                right_len: values.len(),
            });
        }
        check_finite("series", &values)?;
        check_increasing("series", &timestamps)?;
        Ok(Self { timestamps, values })
    }

    pub fn from_values(values: Vec<f64>) -> Result<Self, ValidationError> {
        Self::new(sequential_timestamps(values.len()), values)
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Check that `other` is observed at exactly the same timestamps, so the
    /// two series can be paired row by row.
    pub fn ensure_aligned(
        &self,
        name: &'static str,
        other: &TimeSeries,
        other_name: &'static str,
    ) -> Result<(), ValidationError> {
        if self.len() != other.len() {
            return Err(ValidationError::LengthMismatch {
                left: name,
                left_len: self.len(),
                right: other_name,
                right_len: other.len(),
            });
        }
        match self
            .timestamps
            .iter()
            .zip(&other.timestamps)
            .position(|(a, b)| a != b)
        {
            Some(index) => Err(ValidationError::MisalignedTimestamps {
                left: name,
                right: other_name,
                index,
            }),
            None => Ok(()),
        }
    }

    /// One-period simple returns `p[t]/p[t-1] - 1`, length `len - 1`.
    ///
    /// Fails if any value used as a denominator is non-positive.
    pub fn simple_returns(&self) -> Result<Vec<f64>, ValidationError> {
        self.values
            .windows(2)
            .map(|w| {
                if w[0] <= 0.0 {
                    Err(ValidationError::NonPositive {
                        name: "price",
                        value: w[0],
                    })
                } else {
                    Ok(w[1] / w[0] - 1.0)
                }
            })
            .collect()
    }
}

// ─── Feature matrix ──────────────────────────────────────────────────

/// Row-major matrix of observations (rows) by features (columns).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<f64>>", into = "Vec<Vec<f64>>")]
pub struct FeatureMatrix {
    rows: Vec<Vec<f64>>,
    n_cols: usize,
}

impl TryFrom<Vec<Vec<f64>>> for FeatureMatrix {
    type Error = ValidationError;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self, Self::Error> {
        Self::new(rows)
    }
}

impl From<FeatureMatrix> for Vec<Vec<f64>> {
    fn from(m: FeatureMatrix) -> Self {
        m.rows
    }
}

impl FeatureMatrix {
    pub fn new(rows: Vec<Vec<f64>>) -> Result<Self, ValidationError> {
        let n_cols = rows.first().map_or(0, Vec::len);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != n_cols {
                return Err(ValidationError::RaggedMatrix {
                    row: i,
                    expected: n_cols,
                    found: row.len(),
                });
            }
            if row.iter().any(|v| !v.is_finite()) {
                return Err(ValidationError::NonFinite {
                    name: "feature_matrix",
                    index: i,
                });
            }
        }
        Ok(Self { rows, n_cols })
    }

    /// Single-column matrix.
    pub fn from_column(values: &[f64]) -> Result<Self, ValidationError> {
        Self::new(values.iter().map(|&v| vec![v]).collect())
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.rows[i]
    }

    pub fn column(&self, j: usize) -> Vec<f64> {
        self.rows.iter().map(|r| r[j]).collect()
    }

    /// Contiguous row slice `[range.start, range.end)`, clamped to the matrix.
    pub fn slice_rows(&self, range: Range<usize>) -> Self {
        let end = range.end.min(self.rows.len());
        let start = range.start.min(end);
        Self {
            rows: self.rows[start..end].to_vec(),
            n_cols: self.n_cols,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aligned_series_pair_up() {
        let a = TimeSeries::from_values(vec![1.0, 2.0, 3.0]).unwrap();
        let b = TimeSeries::from_values(vec![10.0, 20.0, 30.0]).unwrap();
        assert_eq!(a.ensure_aligned("signals", &b, "prices"), Ok(()));
    }

    #[test]
    fn shifted_series_are_misaligned() {
        let prices = TimeSeries::from_values(vec![10.0, 11.0, 12.0]).unwrap();
        let shifted: Vec<_> = prices
            .timestamps()
            .iter()
            .map(|t| *t + Duration::days(10))
            .collect();
        let signals = TimeSeries::new(shifted, vec![0.1, 0.2, 0.3]).unwrap();
        let err = signals
            .ensure_aligned("signals", &prices, "prices")
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::MisalignedTimestamps {
                left: "signals",
                right: "prices",
                index: 0
            }
        );
        assert_eq!(err.kind(), crate::error::ErrorKind::Input);
    }

    #[test]
    fn misalignment_reports_first_differing_index() {
        let ts = sequential_timestamps(4);
        let a = TimeSeries::new(ts.clone(), vec![1.0; 4]).unwrap();
        let mut later = ts;
        later[3] = later[3] + Duration::seconds(30);
        let b = TimeSeries::new(later, vec![1.0; 4]).unwrap();
        assert!(matches!(
            a.ensure_aligned("a", &b, "b"),
            Err(ValidationError::MisalignedTimestamps { index: 3, .. })
        ));
        let short = TimeSeries::from_values(vec![1.0]).unwrap();
        assert!(matches!(
            a.ensure_aligned("a", &short, "short"),
            Err(ValidationError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn equity_curve_rejects_empty() {
        assert_eq!(
            EquityCurve::from_values(&[]),
            Err(ValidationError::EmptySeries {
                name: "equity_curve"
            })
        );
    }

    #[test]
    fn equity_curve_rejects_nan() {
        let err = EquityCurve::from_values(&[100.0, f64::NAN]).unwrap_err();
        assert!(matches!(err, ValidationError::NonFinite { index: 1, .. }));
    }

    #[test]
    fn equity_curve_rejects_unordered_timestamps() {
        let ts = sequential_timestamps(2);
        let points = vec![
            EquityPoint {
                timestamp: ts[1],
                equity: 100.0,
            },
            EquityPoint {
                timestamp: ts[0],
                equity: 101.0,
            },
        ];
        let err = EquityCurve::new(points).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::NonMonotonicTimestamps { index: 1, .. }
        ));
    }

    #[test]
    fn period_returns_guard_non_positive_base() {
        let curve = EquityCurve::from_values(&[100.0, 110.0, 0.0, 5.0]).unwrap();
        let r = curve.period_returns();
        assert!((r[0] - 0.1).abs() < 1e-12);
        assert!((r[1] + 1.0).abs() < 1e-12);
        assert_eq!(r[2], 0.0);
    }

    #[test]
    fn equity_curve_deserializes_from_plain_values() {
        let curve: EquityCurve = serde_json::from_str("[100.0, 95.0, 99.0]").unwrap();
        assert_eq!(curve.values(), vec![100.0, 95.0, 99.0]);
    }

    #[test]
    fn equity_curve_deserialize_rejects_empty() {
        assert!(serde_json::from_str::<EquityCurve>("[]").is_err());
    }

    #[test]
    fn time_series_length_mismatch() {
        let err = TimeSeries::new(sequential_timestamps(3), vec![1.0, 2.0]).unwrap_err();
        assert!(matches!(err, ValidationError::LengthMismatch { .. }));
    }

    #[test]
    fn simple_returns_reject_non_positive_price() {
        let prices = TimeSeries::from_values(vec![100.0, 0.0, 10.0]).unwrap();
        assert!(matches!(
            prices.simple_returns(),
            Err(ValidationError::NonPositive { .. })
        ));
    }

    #[test]
    fn feature_matrix_rejects_ragged_rows() {
        let err = FeatureMatrix::new(vec![vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert_eq!(
            err,
            ValidationError::RaggedMatrix {
                row: 1,
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn feature_matrix_slice_is_clamped() {
        let m = FeatureMatrix::from_column(&[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(m.slice_rows(1..10).column(0), vec![2.0, 3.0]);
        assert!(m.slice_rows(5..10).is_empty());
    }
}
