use rand::rngs::StdRng;
use stratgate_core::{SharedDecision, Signal, ValidationError, ValidationInput};

use super::{Gate, GateOutcome};
use crate::cancel::CancelToken;
use crate::noise::NoiseRobustnessTester;

fn signal_label(signal: Signal) -> &'static str {
    match signal {
        Signal::Long => "long",
        Signal::Short => "short",
        Signal::Flat => "flat",
    }
}

/// Stability of the strategy decision under Gaussian noise on prices.
pub struct NoiseRobustnessGate {
    tester: NoiseRobustnessTester,
    max_instability_ratio: f64,
    decision: SharedDecision,
}

impl NoiseRobustnessGate {
    pub fn new(
        noise_level: f64,
        trials: usize,
        max_instability_ratio: f64,
        decision: SharedDecision,
    ) -> Result<Self, ValidationError> {
        if !(0.0..=1.0).contains(&max_instability_ratio) {
            return Err(ValidationError::invalid(
                "max_instability_ratio",
                format!("must be in [0, 1], got {max_instability_ratio}"),
            ));
        }
        Ok(Self {
            tester: NoiseRobustnessTester::new(noise_level, trials)?,
            max_instability_ratio,
            decision,
        })
    }
}

impl Gate for NoiseRobustnessGate {
    fn name(&self) -> &str {
        "noise_robustness"
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
        let result = self.tester.run_cancellable(
            input.prices.values(),
            self.decision.as_ref(),
            rng,
            cancel,
        )?;
        Ok(GateOutcome::new(result.is_robust(self.max_instability_ratio))
            .with("instability_ratio", result.instability_ratio)
            .with("max_instability_ratio", self.max_instability_ratio)
            .with("flips", result.flips)
            .with("trials", result.trials)
            .with("baseline", signal_label(result.baseline)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gates::fixtures::trending_input;
    use rand::SeedableRng;
    use std::sync::Arc;
    use stratgate_core::TrendDecision;

    #[test]
    fn trend_on_trending_prices_is_robust() {
        let gate = NoiseRobustnessGate::new(0.01, 50, 0.2, Arc::new(TrendDecision::default()))
            .unwrap();
        let outcome = gate
            .evaluate(&trending_input(40), &mut StdRng::seed_from_u64(4))
            .unwrap();
        assert!(outcome.passed);
    }

    #[test]
    fn injected_decision_is_used() {
        let coin_edge = |d: &[f64]| {
            if d[d.len() - 1].fract() > 0.5 {
                Signal::Long
            } else {
                Signal::Short
            }
        };
        let gate = NoiseRobustnessGate::new(5.0, 100, 0.2, Arc::new(coin_edge)).unwrap();
        let outcome = gate
            .evaluate(&trending_input(20), &mut StdRng::seed_from_u64(4))
            .unwrap();
        assert!(!outcome.passed);
    }
}
