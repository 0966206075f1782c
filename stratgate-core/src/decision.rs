//! Strategy decision functions probed by noise-robustness testing.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::stats::mean;

/// Discrete output of a strategy decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    Long,
    Short,
    Flat,
}

/// A pure function from an input window to a trading decision.
///
/// Implementations must be deterministic: the same data yields the same
/// signal. Closures `Fn(&[f64]) -> Signal` implement this automatically.
pub trait DecisionFn: Send + Sync {
    fn decide(&self, data: &[f64]) -> Signal;
}

impl<F> DecisionFn for F
where
    F: Fn(&[f64]) -> Signal + Send + Sync,
{
    fn decide(&self, data: &[f64]) -> Signal {
        self(data)
    }
}

pub type SharedDecision = Arc<dyn DecisionFn>;

/// Long above the trailing mean of the last `lookback` values, short below.
///
/// Windows shorter than two values are `Flat`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendDecision {
    pub lookback: usize,
}

impl TrendDecision {
    pub fn new(lookback: usize) -> Self {
        Self { lookback }
    }
}

impl Default for TrendDecision {
    fn default() -> Self {
        Self { lookback: 20 }
    }
}

impl DecisionFn for TrendDecision {
    fn decide(&self, data: &[f64]) -> Signal {
        let window = self.lookback.max(2).min(data.len());
        if window < 2 {
            return Signal::Flat;
        }
        let tail = &data[data.len() - window..];
        let last = tail[tail.len() - 1];
        let avg = mean(tail);
        if last > avg {
            Signal::Long
        } else if last < avg {
            Signal::Short
        } else {
            Signal::Flat
        }
    }
}
