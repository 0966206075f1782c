use rand::rngs::StdRng;
use stratgate_core::domain::trade_returns;
use stratgate_core::{ValidationError, ValidationInput};

use super::{Gate, GateOutcome};
use crate::cancel::CancelToken;
use crate::monte_carlo::MonteCarloValidator;

/// Permutation test on per-trade P&L.
#[derive(Debug)]
pub struct MonteCarloGate {
    validator: MonteCarloValidator,
}

impl MonteCarloGate {
    pub fn new(
        simulations: usize,
        initial_equity: f64,
        pass_threshold_ratio: f64,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            validator: MonteCarloValidator::new(simulations, initial_equity, pass_threshold_ratio)?,
        })
    }
}

impl Gate for MonteCarloGate {
    fn name(&self) -> &str {
        "monte_carlo"
    }

    fn evaluate(
        &self,
        input: &ValidationInput,
        rng: &mut StdRng,
    ) -> Result<GateOutcome, ValidationError> {
        self.evaluate_cancellable(input, rng, &CancelToken::new())
    }

    fn evaluate_cancellable(
        &self,
        input: &ValidationInput,
        rng: &mut StdRng,
        cancel: &CancelToken,
    ) -> Result<GateOutcome, ValidationError> {
        let returns = trade_returns(&input.trades);
        let result = self.validator.run_cancellable(&returns, rng, cancel)?;
        let mut outcome = GateOutcome::new(result.passed)
            .with("median_final_equity", result.median_final_equity)
            .with("min_final_equity", result.min_final_equity)
            .with("max_final_equity", result.max_final_equity)
            .with("pass_level", self.validator.pass_level())
            .with("ruin_probability", result.ruin_probability)
            .with("simulations", result.simulations);
        for m in &result.path_metrics {
            outcome = outcome
                .with(&format!("{}_median", m.name), m.median)
                .with(&format!("{}_p5", m.name), m.p5)
                .with(&format!("{}_p95", m.name), m.p95);
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gates::fixtures::trending_input;
    use rand::SeedableRng;

    #[test]
    fn profitable_trades_pass() {
        let gate = MonteCarloGate::new(200, 100_000.0, 1.0).unwrap();
        let outcome = gate
            .evaluate(&trending_input(40), &mut StdRng::seed_from_u64(1))
            .unwrap();
        assert!(outcome.passed);
        assert!(outcome.metrics.contains_key("max_drawdown_p95"));
        assert!(outcome.metrics.contains_key("min_equity_median"));
    }

    #[test]
    fn no_trades_is_error() {
        let mut input = trending_input(10);
        input.trades.clear();
        let gate = MonteCarloGate::new(10, 100_000.0, 1.0).unwrap();
        assert!(gate.evaluate(&input, &mut StdRng::seed_from_u64(1)).is_err());
    }

    #[test]
    fn fired_token_cancels_the_gate() {
        let gate = MonteCarloGate::new(200, 100_000.0, 1.0).unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = gate
            .evaluate_cancellable(&trending_input(40), &mut StdRng::seed_from_u64(1), &cancel)
            .unwrap_err();
        assert_eq!(err.kind(), stratgate_core::ErrorKind::Timeout);
    }
}
