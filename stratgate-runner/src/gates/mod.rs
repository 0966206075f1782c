//! Gates: the pass/fail tests the orchestrator runs on every strategy.
//!
//! Each gate wraps one analysis component, pulls the slice of the
//! [`ValidationInput`] it needs, and turns the component's result into a
//! verdict plus diagnostics. Gates are independent of each other: each sees
//! the same read-only input and its own RNG stream.
//!
//! Custom gates implement [`Gate`] and are registered with
//! [`StrategyValidator::with_gate`](crate::validator::StrategyValidator::with_gate).

pub mod alpha_decay;
pub mod dataset;
pub mod drawdown;
pub mod monte_carlo;
pub mod noise;
pub mod performance;
pub mod regime;
pub mod walk_forward;

#[cfg(test)]
mod fixtures;

use std::sync::Arc;

use rand::rngs::StdRng;
use stratgate_core::{ModelFactory, SharedDecision, ValidationError, ValidationInput};

use crate::cancel::CancelToken;
use crate::config::{GateKind, GateSettings, ValidationConfig};
use crate::report::{MetricValue, Metrics};

pub use alpha_decay::AlphaDecayGate;
pub use drawdown::DrawdownGate;
pub use monte_carlo::MonteCarloGate;
pub use noise::NoiseRobustnessGate;
pub use performance::PerformanceGate;
pub use regime::RegimeStabilityGate;
pub use walk_forward::WalkForwardGate;

/// Verdict and diagnostics produced by one gate.
#[derive(Debug, Clone, PartialEq)]
pub struct GateOutcome {
    pub passed: bool,
    pub metrics: Metrics,
}

impl GateOutcome {
    pub fn new(passed: bool) -> Self {
        Self {
            passed,
            metrics: Metrics::new(),
        }
    }

    /// Builder-style metric insertion.
    pub fn with(mut self, name: &str, value: impl Into<MetricValue>) -> Self {
        self.metrics.insert(name.to_string(), value.into());
        self
    }
}

/// One pass/fail test.
pub trait Gate: Send + Sync {
    /// Report key (unique per validator).
    fn name(&self) -> &str;

    /// Evaluate the strategy. Errors become failed report entries.
    fn evaluate(
        &self,
        input: &ValidationInput,
        rng: &mut StdRng,
    ) -> Result<GateOutcome, ValidationError>;

    /// What the orchestrator calls. Gates with long loops override this to
    /// stop once `cancel` fires; the default only checks before starting.
    fn evaluate_cancellable(
        &self,
        input: &ValidationInput,
        rng: &mut StdRng,
        cancel: &CancelToken,
    ) -> Result<GateOutcome, ValidationError> {
        cancel.check()?;
        self.evaluate(input, rng)
    }
}

pub type SharedGate = Arc<dyn Gate>;

/// Caller-supplied behaviour some gates depend on.
#[derive(Clone)]
pub struct GateHooks {
    pub decision: SharedDecision,
    pub model_factory: ModelFactory,
}

/// Build the built-in gate for one settings variant.
pub fn build_gate(
    settings: &GateSettings,
    hooks: &GateHooks,
) -> Result<SharedGate, ValidationError> {
    let gate: SharedGate = match settings {
        GateSettings::MonteCarlo {
            simulations,
            initial_equity,
            pass_threshold_ratio,
        } => Arc::new(MonteCarloGate::new(
            *simulations,
            *initial_equity,
            *pass_threshold_ratio,
        )?),
        GateSettings::Drawdown {
            max_drawdown,
            initial_equity,
        } => Arc::new(DrawdownGate::new(*max_drawdown, *initial_equity)?),
        GateSettings::WalkForward {
            n_splits,
            min_score,
        } => Arc::new(WalkForwardGate::new(
            *n_splits,
            *min_score,
            Arc::clone(&hooks.model_factory),
        )?),
        GateSettings::RegimeStability {
            n_clusters,
            max_iterations,
            restarts,
            min_share,
            max_dispersion,
        } => Arc::new(RegimeStabilityGate::new(
            *n_clusters,
            *max_iterations,
            *restarts,
            *min_share,
            *max_dispersion,
        )?),
        GateSettings::NoiseRobustness {
            noise_level,
            trials,
            max_instability_ratio,
        } => Arc::new(NoiseRobustnessGate::new(
            *noise_level,
            *trials,
            *max_instability_ratio,
            Arc::clone(&hooks.decision),
        )?),
        GateSettings::AlphaDecay {
            threshold,
            significance_z,
            horizons,
        } => Arc::new(AlphaDecayGate::new(
            *threshold,
            *significance_z,
            horizons.clone(),
        )?),
        GateSettings::Performance {
            min_win_rate,
            min_sharpe,
            min_sortino,
            periods_per_year,
        } => Arc::new(PerformanceGate::new(
            *min_win_rate,
            *min_sharpe,
            *min_sortino,
            *periods_per_year,
        )?),
    };
    Ok(gate)
}

/// All built-in gates in default order.
pub fn default_gates(
    config: &ValidationConfig,
    hooks: &GateHooks,
) -> Result<Vec<SharedGate>, ValidationError> {
    GateKind::ALL
        .iter()
        .map(|&kind| build_gate(&config.gate_settings(kind), hooks))
        .collect()
}
