use rand::rngs::StdRng;
use stratgate_core::{ModelFactory, ValidationError, ValidationInput};

use super::dataset::direction_dataset;
use super::{Gate, GateOutcome};
use crate::walk_forward::WalkForwardValidator;

/// Out-of-sample accuracy of a next-period direction model.
pub struct WalkForwardGate {
    validator: WalkForwardValidator,
    min_score: f64,
    model_factory: ModelFactory,
}

impl WalkForwardGate {
    pub fn new(
        n_splits: usize,
        min_score: f64,
        model_factory: ModelFactory,
    ) -> Result<Self, ValidationError> {
        if !(0.0..=1.0).contains(&min_score) {
            return Err(ValidationError::invalid(
                "min_walk_forward_score",
                format!("must be in [0, 1], got {min_score}"),
            ));
        }
        Ok(Self {
            validator: WalkForwardValidator::new(n_splits)?,
            min_score,
            model_factory,
        })
    }
}

impl Gate for WalkForwardGate {
    fn name(&self) -> &str {
        "walk_forward"
    }

    fn evaluate(
        &self,
        input: &ValidationInput,
        _rng: &mut StdRng,
    ) -> Result<GateOutcome, ValidationError> {
        let (features, labels) = direction_dataset(&input.signals, &input.prices)?;
        let result = self.validator.run(&features, &labels, &self.model_factory)?;
        Ok(GateOutcome::new(result.mean_score >= self.min_score)
            .with("fold_scores", result.scores())
            .with("mean_score", result.mean_score)
            .with("min_score", self.min_score)
            .with("n_folds", result.folds.len())
            .with("model", result.model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gates::fixtures::trending_input;
    use rand::SeedableRng;
    use stratgate_core::{MajorityClass, NearestCentroid};

    #[test]
    fn reports_each_fold() {
        let gate = WalkForwardGate::new(4, 0.5, NearestCentroid::factory()).unwrap();
        let outcome = gate
            .evaluate(&trending_input(60), &mut StdRng::seed_from_u64(0))
            .unwrap();
        match &outcome.metrics["fold_scores"] {
            crate::report::MetricValue::Series(scores) => assert_eq!(scores.len(), 4),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn always_up_market_favours_majority_baseline() {
        let gate = WalkForwardGate::new(3, 0.9, MajorityClass::factory()).unwrap();
        // Prices rise every period, so the majority label is always right.
        let mut input = trending_input(30);
        input.prices = stratgate_core::PriceSeries::from_values(
            (0..30).map(|i| 50.0 + i as f64).collect(),
        )
        .unwrap();
        let outcome = gate
            .evaluate(&input, &mut StdRng::seed_from_u64(0))
            .unwrap();
        assert!(outcome.passed);
    }

    #[test]
    fn short_history_is_too_many_splits() {
        let gate = WalkForwardGate::new(5, 0.5, NearestCentroid::factory()).unwrap();
        let err = gate
            .evaluate(&trending_input(5), &mut StdRng::seed_from_u64(0))
            .unwrap_err();
        assert!(matches!(err, ValidationError::TooManySplits { .. }));
    }
}
