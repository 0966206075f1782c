//! Performance metrics: pure functions from trades and equity to scalars.
//!
//! The gate built on these checks win rate, Sharpe and Sortino against
//! configured minimums; profit factor and the longest losing streak are
//! reported alongside.

use serde::{Deserialize, Serialize};
use stratgate_core::stats::{mean, sample_std};
use stratgate_core::{EquityCurve, TradeRecord, ValidationError};

/// Standard deviations below this are treated as zero.
const STD_EPSILON: f64 = 1e-15;

/// Cap for profit factor when there are no losing trades.
pub const PROFIT_FACTOR_CAP: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub win_rate: f64,
    pub sharpe: f64,
    pub sortino: f64,
    pub profit_factor: f64,
    pub trade_count: usize,
    pub max_consecutive_losses: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceThresholds {
    pub min_win_rate: f64,
    pub min_sharpe: f64,
    pub min_sortino: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceCheck {
    pub metrics: PerformanceMetrics,
    pub passed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerformanceChecker {
    thresholds: PerformanceThresholds,
    periods_per_year: f64,
}

impl PerformanceChecker {
    pub fn new(
        thresholds: PerformanceThresholds,
        periods_per_year: f64,
    ) -> Result<Self, ValidationError> {
        if !(periods_per_year.is_finite() && periods_per_year > 0.0) {
            return Err(ValidationError::invalid(
                "periods_per_year",
                format!("must be > 0, got {periods_per_year}"),
            ));
        }
        Ok(Self {
            thresholds,
            periods_per_year,
        })
    }

    pub fn check(
        &self,
        trades: &[TradeRecord],
        curve: &EquityCurve,
    ) -> Result<PerformanceCheck, ValidationError> {
        let metrics = PerformanceMetrics {
            win_rate: win_rate(trades)?,
            sharpe: sharpe_ratio(&curve.period_returns(), self.periods_per_year),
            sortino: sortino_ratio(&curve.period_returns(), self.periods_per_year),
            profit_factor: profit_factor(trades),
            trade_count: trades.len(),
            max_consecutive_losses: max_consecutive_losses(trades),
        };
        let t = &self.thresholds;
        let passed = metrics.win_rate >= t.min_win_rate
            && metrics.sharpe >= t.min_sharpe
            && metrics.sortino >= t.min_sortino;
        Ok(PerformanceCheck { metrics, passed })
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Fraction of trades with positive pnl.
pub fn win_rate(trades: &[TradeRecord]) -> Result<f64, ValidationError> {
    if trades.is_empty() {
        return Err(ValidationError::EmptySeries { name: "trades" });
    }
    let winners = trades.iter().filter(|t| t.is_winner()).count();
    Ok(winners as f64 / trades.len() as f64)
}

/// Annualized Sharpe ratio of per-period returns.
///
/// 0.0 for fewer than two returns or zero variance.
pub fn sharpe_ratio(returns: &[f64], periods_per_year: f64) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let std = sample_std(returns);
    if std < STD_EPSILON {
        return 0.0;
    }
    mean(returns) / std * periods_per_year.sqrt()
}

/// Annualized Sortino ratio (downside deviation only).
///
/// 0.0 for fewer than two returns or no downside.
pub fn sortino_ratio(returns: &[f64], periods_per_year: f64) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let downside_sq: f64 = returns.iter().filter(|&&r| r < 0.0).map(|r| r * r).sum();
    let downside_std = (downside_sq / returns.len() as f64).sqrt();
    if downside_std < STD_EPSILON {
        return 0.0;
    }
    mean(returns) / downside_std * periods_per_year.sqrt()
}

/// Gross profit / gross loss, capped at [`PROFIT_FACTOR_CAP`].
pub fn profit_factor(trades: &[TradeRecord]) -> f64 {
    let gross_profit: f64 = trades.iter().filter(|t| t.pnl > 0.0).map(|t| t.pnl).sum();
    let gross_loss: f64 = trades.iter().filter(|t| t.pnl < 0.0).map(|t| -t.pnl).sum();
    if gross_loss < 1e-10 {
        return if gross_profit > 0.0 { PROFIT_FACTOR_CAP } else { 0.0 };
    }
    (gross_profit / gross_loss).min(PROFIT_FACTOR_CAP)
}

/// Longest run of consecutive non-winning trades.
pub fn max_consecutive_losses(trades: &[TradeRecord]) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for trade in trades {
        if trade.is_winner() {
            current = 0;
        } else {
            current += 1;
            longest = longest.max(current);
        }
    }
    longest
}
