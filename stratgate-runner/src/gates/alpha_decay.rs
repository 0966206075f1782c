use rand::rngs::StdRng;
use stratgate_core::{ValidationError, ValidationInput};

use super::dataset::decay_inputs;
use super::{Gate, GateOutcome};
use crate::alpha_decay::AlphaDecayMonitor;

/// Signal/forward-return correlation must persist to the farthest horizon.
#[derive(Debug, Clone)]
pub struct AlphaDecayGate {
    monitor: AlphaDecayMonitor,
    horizons: Vec<usize>,
}

impl AlphaDecayGate {
    pub fn new(
        threshold: f64,
        significance_z: f64,
        horizons: Vec<usize>,
    ) -> Result<Self, ValidationError> {
        if horizons.len() < 2 {
            return Err(ValidationError::invalid(
                "decay_horizons",
                "needs at least two horizons",
            ));
        }
        if horizons.windows(2).any(|w| w[0] >= w[1]) || horizons[0] == 0 {
            return Err(ValidationError::invalid(
                "decay_horizons",
                "horizons must be >= 1 and strictly increasing",
            ));
        }
        Ok(Self {
            monitor: AlphaDecayMonitor::new(threshold, significance_z)?,
            horizons,
        })
    }
}

impl Gate for AlphaDecayGate {
    fn name(&self) -> &str {
        "alpha_decay"
    }

    fn evaluate(
        &self,
        input: &ValidationInput,
        _rng: &mut StdRng,
    ) -> Result<GateOutcome, ValidationError> {
        let (signals, future) = decay_inputs(&input.signals, &input.prices, &self.horizons)?;
        let result = self.monitor.evaluate(&signals, &future)?;
        Ok(GateOutcome::new(result.passed)
            .with("decay_score", result.decay_score)
            .with("correlations", result.correlations)
            .with("correlation_drop", result.correlation_drop)
            .with("near_bound", result.near_bound)
            .with("threshold", self.monitor.threshold())
            .with("horizons", self.horizons.clone()))
    }
}
