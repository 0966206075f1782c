//! Noise robustness: does a small perturbation of the input flip the
//! strategy's decision?

use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use stratgate_core::{DecisionFn, Signal, ValidationError};

use crate::cancel::CancelToken;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseResult {
    pub baseline: Signal,
    pub flips: usize,
    pub trials: usize,
    /// `flips / trials`, in [0, 1].
    pub instability_ratio: f64,
}

impl NoiseResult {
    pub fn is_robust(&self, max_instability_ratio: f64) -> bool {
        self.instability_ratio <= max_instability_ratio
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseRobustnessTester {
    noise_level: f64,
    trials: usize,
}

impl NoiseRobustnessTester {
    pub fn new(noise_level: f64, trials: usize) -> Result<Self, ValidationError> {
        if !noise_level.is_finite() || noise_level < 0.0 {
            return Err(ValidationError::invalid(
                "noise_level",
                format!("must be finite and >= 0, got {noise_level}"),
            ));
        }
        if trials == 0 {
            return Err(ValidationError::invalid("trials", "must be >= 1"));
        }
        Ok(Self {
            noise_level,
            trials,
        })
    }

    /// Count how often Gaussian noise on every element changes the decision.
    pub fn run<R: Rng + ?Sized>(
        &self,
        data: &[f64],
        decision: &dyn DecisionFn,
        rng: &mut R,
    ) -> Result<NoiseResult, ValidationError> {
        self.run_cancellable(data, decision, rng, &CancelToken::new())
    }

    /// [`run`](Self::run), checking `cancel` before every trial.
    pub fn run_cancellable<R: Rng + ?Sized>(
        &self,
        data: &[f64],
        decision: &dyn DecisionFn,
        rng: &mut R,
        cancel: &CancelToken,
    ) -> Result<NoiseResult, ValidationError> {
        if data.is_empty() {
            return Err(ValidationError::EmptySeries { name: "data" });
        }

        let baseline = decision.decide(data);
        let mut flips = 0;

        if self.noise_level > 0.0 {
            let normal = Normal::new(0.0, self.noise_level)
                .map_err(|e| ValidationError::invalid("noise_level", e.to_string()))?;
            let mut perturbed = data.to_vec();
            for _ in 0..self.trials {
                cancel.check()?;
                for (p, &x) in perturbed.iter_mut().zip(data) {
                    *p = x + normal.sample(rng);
                }
                if decision.decide(&perturbed) != baseline {
                    flips += 1;
                }
            }
        } else {
            // Zero noise: every trial sees the original data.
            for _ in 0..self.trials {
                cancel.check()?;
                if decision.decide(data) != baseline {
                    flips += 1;
                }
            }
        }

        Ok(NoiseResult {
            baseline,
            flips,
            trials: self.trials,
            instability_ratio: flips as f64 / self.trials as f64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use stratgate_core::TrendDecision;

    #[test]
    fn zero_noise_is_stable() {
        let tester = NoiseRobustnessTester::new(0.0, 50).unwrap();
        let decide = |d: &[f64]| {
            if d.iter().sum::<f64>() > 0.0 {
                Signal::Long
            } else {
                Signal::Short
            }
        };
        let result = tester
            .run(&[1.0, 2.0, 3.0], &decide, &mut StdRng::seed_from_u64(0))
            .unwrap();
        assert_eq!(result.flips, 0);
        assert_eq!(result.instability_ratio, 0.0);
        assert!(result.is_robust(0.2));
    }

    #[test]
    fn knife_edge_decision_is_unstable() {
        let tester = NoiseRobustnessTester::new(0.5, 200).unwrap();
        let decide = |d: &[f64]| {
            if d[0] > 0.0 {
                Signal::Long
            } else {
                Signal::Flat
            }
        };
        let result = tester
            .run(&[0.0], &decide, &mut StdRng::seed_from_u64(3))
            .unwrap();
        assert!(result.instability_ratio > 0.3 && result.instability_ratio < 0.7);
        assert!(!result.is_robust(0.2));
    }

    #[test]
    fn strong_trend_survives_small_noise() {
        let prices: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let tester = NoiseRobustnessTester::new(0.01, 100).unwrap();
        let result = tester
            .run(&prices, &TrendDecision::default(), &mut StdRng::seed_from_u64(1))
            .unwrap();
        assert_eq!(result.baseline, Signal::Long);
        assert_eq!(result.flips, 0);
    }

    #[test]
    fn rejects_bad_inputs() {
        assert!(NoiseRobustnessTester::new(-0.1, 10).is_err());
        assert!(NoiseRobustnessTester::new(f64::INFINITY, 10).is_err());
        assert!(NoiseRobustnessTester::new(0.1, 0).is_err());
        let t = NoiseRobustnessTester::new(0.1, 10).unwrap();
        let err = t
            .run(&[], &TrendDecision::default(), &mut StdRng::seed_from_u64(0))
            .unwrap_err();
        assert!(matches!(err, ValidationError::EmptySeries { .. }));
    }

    #[test]
    fn cancelled_run_stops() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = NoiseRobustnessTester::new(0.1, 10)
            .unwrap()
            .run_cancellable(
                &[1.0, 2.0, 3.0],
                &TrendDecision::default(),
                &mut StdRng::seed_from_u64(0),
                &cancel,
            )
            .unwrap_err();
        assert_eq!(err, ValidationError::Cancelled);
    }
}
