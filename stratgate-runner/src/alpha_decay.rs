//! Alpha decay: how much of a signal's predictive power survives at longer
//! horizons.
//!
//! The signal is correlated (Pearson) against forward returns at each
//! horizon. The decay score is the fraction of near-horizon correlation that
//! is retained at the farthest horizon:
//!
//! ```text
//! decay_score = ρ_far / ρ_near
//! ```
//!
//! A score near 1 means the edge persists; near 0 means it is gone by the
//! far horizon; a negative score means the relationship flipped sign.
//!
//! The ratio is only defined when the near-horizon correlation is
//! distinguishable from noise: `|ρ_near|` must reach `z / √n` (about a 95%
//! two-sided bound for `z = 2`). Below that the monitor returns a numeric
//! domain error instead of a score.

use serde::{Deserialize, Serialize};
use stratgate_core::stats::pearson_correlation;
use stratgate_core::{FeatureMatrix, ValidationError};

/// Absolute floor on `|ρ_near|`, applied even when `significance_z` is 0.
pub const MIN_NEAR_CORRELATION: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlphaDecayResult {
    /// Correlation per horizon column, nearest first.
    pub correlations: Vec<f64>,
    pub decay_score: f64,
    /// Smallest `|ρ_near|` accepted for this sample size.
    pub near_bound: f64,
    /// `ρ_near - ρ_far`.
    pub correlation_drop: f64,
    pub passed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlphaDecayMonitor {
    threshold: f64,
    significance_z: f64,
}

impl AlphaDecayMonitor {
    pub fn new(threshold: f64, significance_z: f64) -> Result<Self, ValidationError> {
        if !threshold.is_finite() {
            return Err(ValidationError::invalid(
                "decay_threshold",
                format!("must be finite, got {threshold}"),
            ));
        }
        if !significance_z.is_finite() || significance_z < 0.0 {
            return Err(ValidationError::invalid(
                "decay_significance_z",
                format!("must be finite and >= 0, got {significance_z}"),
            ));
        }
        Ok(Self {
            threshold,
            significance_z,
        })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Minimum `|ρ_near|` for `n` observations.
    pub fn near_bound(&self, n: usize) -> f64 {
        (self.significance_z / (n as f64).sqrt()).max(MIN_NEAR_CORRELATION)
    }

    /// Score a signal against a matrix of forward returns (one column per
    /// horizon, nearest first).
    pub fn evaluate(
        &self,
        signals: &[f64],
        future_returns: &FeatureMatrix,
    ) -> Result<AlphaDecayResult, ValidationError> {
        if signals.is_empty() {
            return Err(ValidationError::EmptySeries { name: "signals" });
        }
        if future_returns.n_rows() != signals.len() {
            return Err(ValidationError::LengthMismatch {
                left: "signals",
                left_len: signals.len(),
                right: "future_returns",
                right_len: future_returns.n_rows(),
            });
        }
        if signals.len() < 2 {
            return Err(ValidationError::invalid(
                "signals",
                "alpha decay needs at least 2 observations",
            ));
        }
        if future_returns.n_cols() == 0 {
            return Err(ValidationError::invalid(
                "future_returns",
                "needs at least one horizon column",
            ));
        }

        let correlations = (0..future_returns.n_cols())
            .map(|j| {
                let column = future_returns.column(j);
                pearson_correlation(signals, &column, "signals", &format!("horizon {j}"))
            })
            .collect::<Result<Vec<f64>, _>>()?;

        let near = correlations[0];
        let far = correlations[correlations.len() - 1];
        let near_bound = self.near_bound(signals.len());
        if near.abs() < near_bound {
            return Err(ValidationError::UndefinedStatistic(format!(
                "near-horizon correlation {near:.4} is below the significance bound \
                 {near_bound:.4} for {} observations; no edge to measure decay against",
                signals.len()
            )));
        }

        let decay_score = far / near;
        Ok(AlphaDecayResult {
            correlations,
            decay_score,
            near_bound,
            correlation_drop: near - far,
            passed: decay_score >= self.threshold,
        })
    }
}

/// Forward simple returns `p[t+h] / p[t] - 1` for each horizon.
///
/// Row `t` is kept only when every horizon is observable, i.e.
/// `t + max(h) < prices.len()`; the result may have zero rows.
pub fn forward_return_matrix(
    prices: &[f64],
    horizons: &[usize],
) -> Result<FeatureMatrix, ValidationError> {
    if prices.is_empty() {
        return Err(ValidationError::EmptySeries { name: "prices" });
    }
    if horizons.is_empty() || horizons.contains(&0) {
        return Err(ValidationError::invalid(
            "decay_horizons",
            "needs at least one horizon, all >= 1",
        ));
    }
    if let Some((_, &p)) = prices
        .iter()
        .enumerate()
        .find(|(_, p)| **p <= 0.0 || !p.is_finite())
    {
        return Err(ValidationError::NonPositive {
            name: "price",
            value: p,
        });
    }

    let max_h = horizons.iter().copied().max().unwrap_or(0);
    let n_rows = prices.len().saturating_sub(max_h);
    let rows = (0..n_rows)
        .map(|t| horizons.iter().map(|&h| prices[t + h] / prices[t] - 1.0).collect())
        .collect();
    FeatureMatrix::new(rows)
}
