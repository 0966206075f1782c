//! Stratgate Runner: the gating tests and the orchestrator that combines
//! them into one verdict.
//!
//! This crate builds on `stratgate-core` to provide:
//! - Analysis components (drawdown, alpha decay, Monte Carlo permutation,
//!   walk-forward, k-means regime stability, noise robustness, performance)
//! - Gate wrappers turning each component into a pass/fail test
//! - `ValidationConfig` loaded from TOML
//! - `StrategyValidator`: concurrent gates with deadlines and cooperative
//!   cancellation, latency pre-pass, batch validation
//! - Report types and JSONL report sinks

pub mod alpha_decay;
pub mod cancel;
pub mod config;
pub mod drawdown;
pub mod gates;
pub mod history;
pub mod monte_carlo;
pub mod noise;
pub mod performance;
pub mod regime;
pub mod report;
pub mod validator;
pub mod walk_forward;

pub use alpha_decay::{forward_return_matrix, AlphaDecayMonitor, AlphaDecayResult};
pub use cancel::CancelToken;
pub use config::{ConfigError, GateKind, GateSettings, ValidationConfig};
pub use drawdown::{max_drawdown, DrawdownCheck, DrawdownChecker};
pub use gates::{Gate, GateHooks, GateOutcome, SharedGate};
pub use history::{JsonlReportSink, MemoryReportSink, ReportSink, SinkError, SinkFilter};
pub use monte_carlo::{
    MetricSummary, MonteCarloResult, MonteCarloValidator, PathMaxDrawdown, PathMetric,
    PathMinEquity,
};
pub use noise::{NoiseResult, NoiseRobustnessTester};
pub use performance::{PerformanceChecker, PerformanceMetrics, PerformanceThresholds};
pub use regime::{KMeans, RegimeResult, RegimeStabilityTester, RegimeStats};
pub use report::{MetricValue, Metrics, TestOutcome, ValidationReport};
pub use validator::{validate, StrategyValidator};
pub use walk_forward::{expanding_window_splits, Fold, WalkForwardResult, WalkForwardValidator};
