//! StrategyValidator: runs every gate against one strategy and aggregates
//! a single verdict.
//!
//! Each gate runs on its own thread with its own RNG stream, derived from
//! the master seed, the strategy id and the gate name. Results are
//! collected until a shared deadline; gates still running at that point are
//! recorded as timeouts, and their shared [`CancelToken`] is fired so their
//! loops wind down instead of burning CPU in the background. Errors and
//! panics inside a gate become failed entries and never abort the run.

use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use stratgate_core::latency::adjust_equity;
use stratgate_core::{
    EquityCurve, LatencySimulator, ModelFactory, NearestCentroid, PriceSeries, RngHierarchy,
    SharedDecision, SignalSeries, TradeRecord, TrendDecision, ValidationError, ValidationInput,
};

use crate::cancel::CancelToken;
use crate::config::{ConfigError, GateKind, ValidationConfig};
use crate::gates::{build_gate, default_gates, GateHooks, SharedGate};
use crate::report::{Metrics, TestOutcome, ValidationReport};

/// Report key of the latency pre-pass.
pub const LATENCY_ENTRY: &str = "latency";

/// Strategy id used by the free [`validate`] function.
pub const DEFAULT_STRATEGY_ID: &str = "strategy";

fn elapsed_ms(since: Instant) -> u64 {
    u64::try_from(since.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

pub struct StrategyValidator {
    config: ValidationConfig,
    rng: RngHierarchy,
    hooks: GateHooks,
    gates: Vec<SharedGate>,
    latency: Option<LatencySimulator>,
}

impl std::fmt::Debug for StrategyValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyValidator")
            .field("seed", &self.rng.master_seed())
            .field("gates", &self.gate_names())
            .field("latency_enabled", &self.latency.is_some())
            .finish()
    }
}

impl StrategyValidator {
    /// Validator with the built-in gates, a trend-following decision for
    /// noise testing and a nearest-centroid model for walk-forward.
    pub fn new(config: ValidationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let hooks = GateHooks {
            decision: Arc::new(TrendDecision::default()),
            model_factory: NearestCentroid::factory(),
        };
        let gates = default_gates(&config, &hooks).map_err(|e| ConfigError::Invalid {
            field: "gates",
            reason: e.to_string(),
        })?;
        let latency = if config.latency_enabled {
            Some(
                LatencySimulator::new(config.max_latency_ms, config.slippage_pct).map_err(|e| {
                    ConfigError::Invalid {
                        field: "latency",
                        reason: e.to_string(),
                    }
                })?,
            )
        } else {
            None
        };
        Ok(Self {
            rng: RngHierarchy::new(config.seed),
            config,
            hooks,
            gates,
            latency,
        })
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.rng.master_seed()
    }

    pub fn gate_names(&self) -> Vec<&str> {
        self.gates.iter().map(|g| g.name()).collect()
    }

    /// Register a gate, replacing any existing gate with the same name.
    ///
    /// The latency pre-pass owns the [`LATENCY_ENTRY`] report key, so a gate
    /// with that name is rejected.
    pub fn with_gate(mut self, gate: SharedGate) -> Result<Self, ConfigError> {
        if gate.name() == LATENCY_ENTRY {
            return Err(ConfigError::Invalid {
                field: "gate",
                reason: format!("'{LATENCY_ENTRY}' is reserved for the latency pre-pass"),
            });
        }
        self.insert_gate(gate);
        Ok(self)
    }

    fn insert_gate(&mut self, gate: SharedGate) {
        match self.gates.iter().position(|g| g.name() == gate.name()) {
            Some(i) => self.gates[i] = gate,
            None => self.gates.push(gate),
        }
    }

    /// Remove a gate by name.
    pub fn without_gate(mut self, name: &str) -> Self {
        self.gates.retain(|g| g.name() != name);
        self
    }

    /// Use `decision` in the noise-robustness gate (rebuilds that gate).
    pub fn with_decision(mut self, decision: SharedDecision) -> Self {
        self.hooks.decision = decision;
        self.rebuild(GateKind::NoiseRobustness)
    }

    /// Use `factory` to build walk-forward models (rebuilds that gate).
    pub fn with_model(mut self, factory: ModelFactory) -> Self {
        self.hooks.model_factory = factory;
        self.rebuild(GateKind::WalkForward)
    }

    fn rebuild(mut self, kind: GateKind) -> Self {
        match build_gate(&self.config.gate_settings(kind), &self.hooks) {
            Ok(gate) => {
                self.insert_gate(gate);
                self
            }
            Err(e) => {
                // Settings were checked in `new`, so this only fires if a
                // component tightened its own checks.
                warn!(gate = kind.name(), error = %e, "failed to rebuild gate");
                self
            }
        }
    }

    // ─── Validation ──────────────────────────────────────────────────

    /// Validate one strategy. Never fails: problems become failed entries or
    /// a report with `fatal_error` set.
    pub fn validate(&self, input: ValidationInput) -> ValidationReport {
        let strategy_id = input.strategy_id.clone();
        let seed = self.rng.master_seed();
        let started = Instant::now();
        info!(
            strategy_id = %strategy_id,
            seed,
            gates = self.gates.len(),
            latency = self.latency.is_some(),
            "validation started"
        );

        let mut results = BTreeMap::new();
        let mut input = input;
        if let Some(simulator) = &self.latency {
            let (entry, adjusted) = self.latency_pass(simulator, &input);
            if !entry.passed {
                warn!(
                    strategy_id = %strategy_id,
                    gate = LATENCY_ENTRY,
                    error = ?entry.error,
                    "latency transform failed"
                );
            }
            results.insert(LATENCY_ENTRY.to_string(), entry);
            if let Some(adjusted) = adjusted {
                input = adjusted;
            }
        }

        match self.run_gates(Arc::new(input), &strategy_id) {
            Ok(gate_results) => results.extend(gate_results),
            Err(e) => {
                warn!(strategy_id = %strategy_id, error = %e, "validation aborted");
                return ValidationReport::fatal(strategy_id, seed, e.to_string());
            }
        }

        let report = ValidationReport::new(strategy_id, seed, results, None);
        info!(
            strategy_id = %report.strategy_id,
            passed = report.overall_passed,
            failed = ?report.failed_tests(),
            elapsed_ms = elapsed_ms(started),
            "validation finished"
        );
        report
    }

    /// Validate many strategies in parallel; output order matches input.
    pub fn validate_batch(&self, inputs: Vec<ValidationInput>) -> Vec<ValidationReport> {
        inputs
            .into_par_iter()
            .map(|input| self.validate(input))
            .collect()
    }

    fn latency_pass(
        &self,
        simulator: &LatencySimulator,
        input: &ValidationInput,
    ) -> (TestOutcome, Option<ValidationInput>) {
        let t0 = Instant::now();
        let mut rng = self.rng.rng_for(&input.strategy_id, LATENCY_ENTRY, 0);
        let adjusted = simulator.adjust_trades(&input.trades, &mut rng).and_then(|adj| {
            let curve = adjust_equity(&input.equity_curve, &adj)?;
            Ok((adj, curve))
        });
        match adjusted {
            Ok((adj, curve)) => {
                let mut metrics = Metrics::new();
                metrics.insert("total_slippage_cost".into(), adj.total_slippage_cost.into());
                metrics.insert("mean_delay_ms".into(), adj.mean_delay_ms.into());
                metrics.insert("max_delay_ms".into(), (adj.max_delay_ms as f64).into());
                metrics.insert("trades_adjusted".into(), adj.trades.len().into());
                let mut next = input.clone();
                next.trades = adj.trades;
                next.equity_curve = curve;
                (TestOutcome::completed(true, metrics, elapsed_ms(t0)), Some(next))
            }
            Err(e) => (TestOutcome::failed(&e, elapsed_ms(t0)), None),
        }
    }

    /// Spawn one thread per gate and collect outcomes until the deadline.
    fn run_gates(
        &self,
        input: Arc<ValidationInput>,
        strategy_id: &str,
    ) -> Result<BTreeMap<String, TestOutcome>, ValidationError> {
        let timeout = Duration::from_millis(self.config.test_timeout_ms);
        let (tx, rx) = mpsc::channel::<(String, TestOutcome)>();
        let cancel = CancelToken::new();
        let mut pending = BTreeSet::new();

        for gate in &self.gates {
            let name = gate.name().to_string();
            let mut rng = self.rng.rng_for(strategy_id, &name, 0);
            let gate = Arc::clone(gate);
            let input = Arc::clone(&input);
            let tx = tx.clone();
            let gate_cancel = cancel.clone();
            let thread_name = format!("gate-{name}");
            pending.insert(name.clone());

            thread::Builder::new()
                .name(thread_name)
                .spawn(move || {
                    let t0 = Instant::now();
                    let result = panic::catch_unwind(AssertUnwindSafe(|| {
                        gate.evaluate_cancellable(&input, &mut rng, &gate_cancel)
                    }));
                    let ms = elapsed_ms(t0);
                    let outcome = match result {
                        Ok(Ok(o)) => TestOutcome::completed(o.passed, o.metrics, ms),
                        Ok(Err(e)) => TestOutcome::failed(&e, ms),
                        Err(payload) => TestOutcome::failed(
                            &ValidationError::Internal(format!(
                                "gate panicked: {}",
                                panic_message(payload.as_ref())
                            )),
                            ms,
                        ),
                    };
                    // The receiver is gone once the deadline has passed.
                    let _ = tx.send((name, outcome));
                })
                .map_err(|e| {
                    cancel.cancel();
                    ValidationError::Internal(format!("failed to spawn gate thread: {e}"))
                })?;
        }
        drop(tx);

        let deadline = Instant::now() + timeout;
        let mut results = BTreeMap::new();
        let mut disconnected = false;
        while !pending.is_empty() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match rx.recv_timeout(remaining) {
                Ok((name, outcome)) => {
                    pending.remove(&name);
                    match &outcome.error {
                        Some(err) => warn!(strategy_id, gate = %name, error = %err, "gate errored"),
                        None => debug!(
                            strategy_id,
                            gate = %name,
                            passed = outcome.passed,
                            elapsed_ms = outcome.elapsed_ms,
                            "gate finished"
                        ),
                    }
                    results.insert(name, outcome);
                }
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => {
                    disconnected = true;
                    break;
                }
            }
        }

        // Stragglers see this on their next check and stop.
        cancel.cancel();
        for name in pending {
            let outcome = if disconnected {
                TestOutcome::failed(
                    &ValidationError::Internal("gate exited without reporting".into()),
                    0,
                )
            } else {
                warn!(
                    strategy_id,
                    gate = %name,
                    timeout_ms = self.config.test_timeout_ms,
                    "gate timed out"
                );
                TestOutcome::failed(&ValidationError::Timeout(timeout), self.config.test_timeout_ms)
            };
            results.insert(name, outcome);
        }
        Ok(results)
    }
}

/// One-shot validation with a fresh validator.
///
/// Returns `(overall_passed, report)`. An invalid configuration yields a
/// rejected report with `fatal_error` set.
pub fn validate(
    trades: Vec<TradeRecord>,
    equity_curve: EquityCurve,
    signals: SignalSeries,
    prices: PriceSeries,
    config: &ValidationConfig,
) -> (bool, ValidationReport) {
    let report = match StrategyValidator::new(config.clone()) {
        Ok(validator) => validator.validate(ValidationInput::new(
            DEFAULT_STRATEGY_ID,
            trades,
            equity_curve,
            signals,
            prices,
        )),
        Err(e) => ValidationReport::fatal(DEFAULT_STRATEGY_ID, config.seed, e.to_string()),
    };
    (report.overall_passed, report)
}
