//! Validation report types.
//!
//! A report maps each test name to `{passed, metrics, error?}`. It is built
//! once per orchestrator invocation and handed to the caller; storage and
//! publication belong to the caller (see [`crate::history`]).

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use stratgate_core::{ErrorKind, ValidationError};

/// A single diagnostic value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Flag(bool),
    Count(usize),
    Scalar(f64),
    Counts(Vec<usize>),
    Series(Vec<f64>),
    Text(String),
}

impl MetricValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Scalar(v) => Some(*v),
            Self::Count(c) => Some(*c as f64),
            _ => None,
        }
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        Self::Scalar(v)
    }
}

impl From<usize> for MetricValue {
    fn from(v: usize) -> Self {
        Self::Count(v)
    }
}

impl From<bool> for MetricValue {
    fn from(v: bool) -> Self {
        Self::Flag(v)
    }
}

impl From<Vec<f64>> for MetricValue {
    fn from(v: Vec<f64>) -> Self {
        Self::Series(v)
    }
}

impl From<Vec<usize>> for MetricValue {
    fn from(v: Vec<usize>) -> Self {
        Self::Counts(v)
    }
}

impl From<String> for MetricValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for MetricValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

pub type Metrics = BTreeMap<String, MetricValue>;

/// Result of one test inside a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestOutcome {
    pub passed: bool,
    #[serde(default)]
    pub metrics: Metrics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(default)]
    pub elapsed_ms: u64,
}

impl TestOutcome {
    pub fn completed(passed: bool, metrics: Metrics, elapsed_ms: u64) -> Self {
        Self {
            passed,
            metrics,
            error: None,
            error_kind: None,
            elapsed_ms,
        }
    }

    /// A failed outcome carrying the error that caused it.
    pub fn failed(err: &ValidationError, elapsed_ms: u64) -> Self {
        let error = match err {
            ValidationError::Timeout(_) => "timeout".to_string(),
            other => other.to_string(),
        };
        Self {
            passed: false,
            metrics: Metrics::new(),
            error: Some(error),
            error_kind: Some(err.kind()),
            elapsed_ms,
        }
    }

    pub fn scalar(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).and_then(MetricValue::as_f64)
    }
}

/// Complete output of one validation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub strategy_id: String,
    pub seed: u64,
    pub overall_passed: bool,
    pub results: BTreeMap<String, TestOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fatal_error: Option<String>,
}

impl ValidationReport {
    /// Build a report; the verdict is the AND of every entry and is false
    /// for an empty report or when a fatal error is present.
    pub fn new(
        strategy_id: impl Into<String>,
        seed: u64,
        results: BTreeMap<String, TestOutcome>,
        fatal_error: Option<String>,
    ) -> Self {
        let overall_passed =
            fatal_error.is_none() && !results.is_empty() && results.values().all(|r| r.passed);
        Self {
            strategy_id: strategy_id.into(),
            seed,
            overall_passed,
            results,
            fatal_error,
        }
    }

    /// A rejection caused by a failure of the orchestrator itself.
    pub fn fatal(strategy_id: impl Into<String>, seed: u64, error: impl Into<String>) -> Self {
        Self::new(strategy_id, seed, BTreeMap::new(), Some(error.into()))
    }

    pub fn get(&self, test: &str) -> Option<&TestOutcome> {
        self.results.get(test)
    }

    /// Names of tests that did not pass, in name order.
    pub fn failed_tests(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter(|(_, r)| !r.passed)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// One-line human-readable verdict.
    pub fn summary(&self) -> String {
        let mut out = format!(
            "{}: {} ({}/{} tests passed)",
            self.strategy_id,
            if self.overall_passed { "APPROVED" } else { "REJECTED" },
            self.results.values().filter(|r| r.passed).count(),
            self.results.len()
        );
        let failed = self.failed_tests();
        if !failed.is_empty() {
            let _ = write!(out, "; failed: {}", failed.join(", "));
        }
        if let Some(err) = &self.fatal_error {
            let _ = write!(out, "; fatal: {err}");
        }
        out
    }
}
