//! Monte Carlo permutation test over trade outcomes.
//!
//! Each trial shuffles a copy of the per-trade returns and replays them from
//! the initial equity. If the strategy's edge only shows up in the historical
//! ordering, the median shuffled outcome falls short of the pass level.
//!
//! Additional path statistics plug in through [`PathMetric`].

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use stratgate_core::stats::{percentile_sorted, sort_ascending};
use stratgate_core::ValidationError;

use crate::cancel::CancelToken;
use crate::drawdown::max_drawdown;

// ─── Path metrics ────────────────────────────────────────────────────

/// A statistic computed on one simulated equity path.
pub trait PathMetric: Send + Sync {
    fn name(&self) -> &str;

    /// `path` starts with the initial equity and has one point per trade.
    fn compute(&self, path: &[f64]) -> Result<f64, ValidationError>;
}

/// Maximum drawdown of the simulated path.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathMaxDrawdown;

impl PathMetric for PathMaxDrawdown {
    fn name(&self) -> &str {
        "max_drawdown"
    }

    fn compute(&self, path: &[f64]) -> Result<f64, ValidationError> {
        Ok(max_drawdown(path))
    }
}

/// Lowest equity reached along the path.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathMinEquity;

impl PathMetric for PathMinEquity {
    fn name(&self) -> &str {
        "min_equity"
    }

    fn compute(&self, path: &[f64]) -> Result<f64, ValidationError> {
        path.iter()
            .copied()
            .reduce(f64::min)
            .ok_or(ValidationError::EmptySeries { name: "path" })
    }
}

/// Distribution summary of one path metric across all trials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub name: String,
    pub median: f64,
    pub p5: f64,
    pub p95: f64,
}

// ─── Validator ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloResult {
    pub median_final_equity: f64,
    pub min_final_equity: f64,
    pub max_final_equity: f64,
    /// Fraction of paths whose equity touches zero or below.
    pub ruin_probability: f64,
    pub path_metrics: Vec<MetricSummary>,
    pub simulations: usize,
    pub passed: bool,
}

pub struct MonteCarloValidator {
    simulations: usize,
    initial_equity: f64,
    pass_threshold_ratio: f64,
    metrics: Vec<Box<dyn PathMetric>>,
}

impl std::fmt::Debug for MonteCarloValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonteCarloValidator")
            .field("simulations", &self.simulations)
            .field("initial_equity", &self.initial_equity)
            .field("pass_threshold_ratio", &self.pass_threshold_ratio)
            .field(
                "metrics",
                &self.metrics.iter().map(|m| m.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl MonteCarloValidator {
    /// Validator with the built-in path metrics registered.
    pub fn new(
        simulations: usize,
        initial_equity: f64,
        pass_threshold_ratio: f64,
    ) -> Result<Self, ValidationError> {
        if simulations == 0 {
            return Err(ValidationError::invalid("simulations", "must be >= 1"));
        }
        if !(initial_equity.is_finite() && initial_equity > 0.0) {
            return Err(ValidationError::invalid(
                "initial_equity",
                format!("must be > 0, got {initial_equity}"),
            ));
        }
        if !pass_threshold_ratio.is_finite() {
            return Err(ValidationError::invalid(
                "pass_threshold_ratio",
                "must be finite",
            ));
        }
        Ok(Self {
            simulations,
            initial_equity,
            pass_threshold_ratio,
            metrics: vec![Box::new(PathMaxDrawdown), Box::new(PathMinEquity)],
        })
    }

    pub fn with_metric(mut self, metric: Box<dyn PathMetric>) -> Self {
        self.metrics.push(metric);
        self
    }

    /// Equity level the median final equity must reach.
    pub fn pass_level(&self) -> f64 {
        self.initial_equity * self.pass_threshold_ratio
    }

    /// Run all trials on per-trade P&L values.
    pub fn run<R: Rng + ?Sized>(
        &self,
        trade_returns: &[f64],
        rng: &mut R,
    ) -> Result<MonteCarloResult, ValidationError> {
        self.run_cancellable(trade_returns, rng, &CancelToken::new())
    }

    /// [`run`](Self::run), checking `cancel` before every trial.
    pub fn run_cancellable<R: Rng + ?Sized>(
        &self,
        trade_returns: &[f64],
        rng: &mut R,
        cancel: &CancelToken,
    ) -> Result<MonteCarloResult, ValidationError> {
        if trade_returns.is_empty() {
            return Err(ValidationError::EmptySeries {
                name: "trade_returns",
            });
        }
        if let Some(index) = trade_returns.iter().position(|r| !r.is_finite()) {
            return Err(ValidationError::NonFinite {
                name: "trade_returns",
                index,
            });
        }

        let mut finals = Vec::with_capacity(self.simulations);
        let mut samples: Vec<Vec<f64>> = (0..self.metrics.len())
            .map(|_| Vec::with_capacity(self.simulations))
            .collect();
        let mut ruined = 0usize;
        let mut shuffled = trade_returns.to_vec();
        let mut path = Vec::with_capacity(trade_returns.len() + 1);

        for _ in 0..self.simulations {
            cancel.check()?;
            shuffled.copy_from_slice(trade_returns);
            shuffled.shuffle(rng);

            path.clear();
            let mut equity = self.initial_equity;
            path.push(equity);
            for r in &shuffled {
                equity += r;
                path.push(equity);
            }

            if path.iter().any(|&e| e <= 0.0) {
                ruined += 1;
            }
            finals.push(equity);
            for (metric, bucket) in self.metrics.iter().zip(samples.iter_mut()) {
                bucket.push(metric.compute(&path)?);
            }
        }

        sort_ascending(&mut finals);
        let median_final_equity = percentile_sorted(&finals, 50.0);
        let path_metrics = self
            .metrics
            .iter()
            .zip(samples)
            .map(|(metric, mut values)| {
                sort_ascending(&mut values);
                MetricSummary {
                    name: metric.name().to_string(),
                    median: percentile_sorted(&values, 50.0),
                    p5: percentile_sorted(&values, 5.0),
                    p95: percentile_sorted(&values, 95.0),
                }
            })
            .collect();

        Ok(MonteCarloResult {
            median_final_equity,
            min_final_equity: finals[0],
            max_final_equity: finals[finals.len() - 1],
            ruin_probability: ruined as f64 / self.simulations as f64,
            path_metrics,
            simulations: self.simulations,
            passed: median_final_equity >= self.pass_level(),
        })
    }
}
