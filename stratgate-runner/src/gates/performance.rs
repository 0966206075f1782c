use rand::rngs::StdRng;
use stratgate_core::{ValidationError, ValidationInput};

use super::{Gate, GateOutcome};
use crate::performance::{PerformanceChecker, PerformanceThresholds};

/// Win rate, Sharpe and Sortino against configured minimums.
#[derive(Debug, Clone, Copy)]
pub struct PerformanceGate {
    checker: PerformanceChecker,
    thresholds: PerformanceThresholds,
}

impl PerformanceGate {
    pub fn new(
        min_win_rate: f64,
        min_sharpe: f64,
        min_sortino: f64,
        periods_per_year: f64,
    ) -> Result<Self, ValidationError> {
        let thresholds = PerformanceThresholds {
            min_win_rate,
            min_sharpe,
            min_sortino,
        };
        Ok(Self {
            checker: PerformanceChecker::new(thresholds, periods_per_year)?,
            thresholds,
        })
    }
}

impl Gate for PerformanceGate {
    fn name(&self) -> &str {
        "performance"
    }

    fn evaluate(
        &self,
        input: &ValidationInput,
        _rng: &mut StdRng,
    ) -> Result<GateOutcome, ValidationError> {
        let check = self.checker.check(&input.trades, &input.equity_curve)?;
        let m = check.metrics;
        Ok(GateOutcome::new(check.passed)
            .with("win_rate", m.win_rate)
            .with("sharpe", m.sharpe)
            .with("sortino", m.sortino)
            .with("profit_factor", m.profit_factor)
            .with("trade_count", m.trade_count)
            .with("max_consecutive_losses", m.max_consecutive_losses)
            .with("min_win_rate", self.thresholds.min_win_rate)
            .with("min_sharpe", self.thresholds.min_sharpe)
            .with("min_sortino", self.thresholds.min_sortino))
    }
}
