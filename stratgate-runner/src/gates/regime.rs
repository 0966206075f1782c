use rand::rngs::StdRng;
use stratgate_core::{ValidationError, ValidationInput};

use super::dataset::regime_matrix;
use super::{Gate, GateOutcome};
use crate::regime::{KMeans, RegimeStabilityTester};

/// Every return/signal regime must be populated and compact.
#[derive(Debug, Clone, Copy)]
pub struct RegimeStabilityGate {
    tester: RegimeStabilityTester,
    min_share: f64,
    max_dispersion: f64,
}

impl RegimeStabilityGate {
    pub fn new(
        n_clusters: usize,
        max_iterations: usize,
        restarts: usize,
        min_share: f64,
        max_dispersion: f64,
    ) -> Result<Self, ValidationError> {
        if !(0.0..=1.0).contains(&min_share) {
            return Err(ValidationError::invalid(
                "min_regime_share",
                format!("must be in [0, 1], got {min_share}"),
            ));
        }
        if !(max_dispersion.is_finite() && max_dispersion > 0.0) {
            return Err(ValidationError::invalid(
                "max_regime_dispersion",
                format!("must be > 0, got {max_dispersion}"),
            ));
        }
        Ok(Self {
            tester: RegimeStabilityTester::new(KMeans::new(n_clusters, max_iterations, restarts)?),
            min_share,
            max_dispersion,
        })
    }
}

impl Gate for RegimeStabilityGate {
    fn name(&self) -> &str {
        "regime_stability"
    }

    fn evaluate(
        &self,
        input: &ValidationInput,
        rng: &mut StdRng,
    ) -> Result<GateOutcome, ValidationError> {
        let data = regime_matrix(&input.signals, &input.prices)?;
        let result = self.tester.run(&data, rng)?;
        let fragile = result.fragile_regimes(self.min_share, self.max_dispersion);

        Ok(GateOutcome::new(fragile == 0)
            .with("populations", result.populations())
            .with(
                "shares",
                result.regimes.iter().map(|r| r.share).collect::<Vec<_>>(),
            )
            .with(
                "dispersions",
                result.regimes.iter().map(|r| r.dispersion).collect::<Vec<_>>(),
            )
            .with("fragile_regimes", fragile)
            .with("inertia", result.inertia)
            .with("iterations", result.iterations)
            .with("n_observations", result.n_observations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gates::fixtures::trending_input;
    use crate::report::MetricValue;
    use rand::SeedableRng;

    #[test]
    fn populations_cover_all_rows() {
        let gate = RegimeStabilityGate::new(3, 100, 4, 0.05, 1.5).unwrap();
        let outcome = gate
            .evaluate(&trending_input(50), &mut StdRng::seed_from_u64(2))
            .unwrap();
        match &outcome.metrics["populations"] {
            MetricValue::Counts(p) => assert_eq!(p.iter().sum::<usize>(), 49),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn impossible_share_fails() {
        // Three clusters can never all hold more than half the data.
        let gate = RegimeStabilityGate::new(3, 100, 2, 0.5, 10.0).unwrap();
        let outcome = gate
            .evaluate(&trending_input(40), &mut StdRng::seed_from_u64(2))
            .unwrap();
        assert!(!outcome.passed);
    }

    #[test]
    fn too_few_rows() {
        let gate = RegimeStabilityGate::new(3, 100, 2, 0.05, 1.5).unwrap();
        let err = gate
            .evaluate(&trending_input(3), &mut StdRng::seed_from_u64(2))
            .unwrap_err();
        assert!(matches!(err, ValidationError::TooFewObservations { .. }));
    }
}
