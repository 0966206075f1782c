use rand::rngs::StdRng;
use stratgate_core::{ValidationError, ValidationInput};

use super::{Gate, GateOutcome};
use crate::drawdown::DrawdownChecker;

/// Relative tolerance for the first equity point against initial capital.
const INITIAL_CAPITAL_TOLERANCE: f64 = 1e-9;

/// Maximum drawdown of the equity curve against a threshold.
#[derive(Debug, Clone, Copy)]
pub struct DrawdownGate {
    checker: DrawdownChecker,
    initial_equity: f64,
}

impl DrawdownGate {
    pub fn new(max_drawdown: f64, initial_equity: f64) -> Result<Self, ValidationError> {
        if !(initial_equity.is_finite() && initial_equity > 0.0) {
            return Err(ValidationError::invalid(
                "initial_equity",
                format!("must be > 0, got {initial_equity}"),
            ));
        }
        Ok(Self {
            checker: DrawdownChecker::new(max_drawdown)?,
            initial_equity,
        })
    }
}

impl Gate for DrawdownGate {
    fn name(&self) -> &str {
        "drawdown"
    }

    fn evaluate(
        &self,
        input: &ValidationInput,
        _rng: &mut StdRng,
    ) -> Result<GateOutcome, ValidationError> {
        let curve = &input.equity_curve;
        let first = curve.first();
        if (first - self.initial_equity).abs() > INITIAL_CAPITAL_TOLERANCE * self.initial_equity {
            return Err(ValidationError::InitialCapitalMismatch {
                first,
                expected: self.initial_equity,
            });
        }

        let check = self.checker.check(curve);
        Ok(GateOutcome::new(check.passed)
            .with("max_drawdown", check.max_drawdown)
            .with("threshold", self.checker.threshold())
            .with("peak_index", check.peak_index)
            .with("trough_index", check.trough_index)
            .with("longest_underwater", check.longest_underwater))
    }
}
