//! Error taxonomy shared by every gating test.
//!
//! Variants are grouped into three kinds (see [`ErrorKind`]): malformed
//! input, numeric domain failures, and timeouts. Gates return these as
//! values; the orchestrator turns them into failed report entries.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse classification of a [`ValidationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Empty or malformed series, dimension mismatch, too many splits.
    Input,
    /// Division by a non-positive value, undefined correlation, etc.
    NumericDomain,
    /// A gate exceeded its allotted time.
    Timeout,
    /// Anything the gate did not anticipate (e.g. a panic).
    Internal,
}

/// Errors raised by the validation components.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    // ── Input ──
    #[error("input error: series '{name}' is empty")]
    EmptySeries { name: &'static str },

    #[error("input error: length mismatch between {left} ({left_len}) and {right} ({right_len})")]
    LengthMismatch {
        left: &'static str,
        left_len: usize,
        right: &'static str,
        right_len: usize,
    },

    #[error("input error: {n_splits} splits need at least {required} periods, got {available}")]
    TooManySplits {
        n_splits: usize,
        required: usize,
        available: usize,
    },

    #[error("input error: {n_clusters} clusters requested for {observations} observations")]
    TooFewObservations {
        n_clusters: usize,
        observations: usize,
    },

    #[error("input error: timestamps of '{name}' are not strictly increasing at index {index}")]
    NonMonotonicTimestamps { name: &'static str, index: usize },

    #[error("input error: timestamps of '{left}' and '{right}' differ at index {index}")]
    MisalignedTimestamps {
        left: &'static str,
        right: &'static str,
        index: usize,
    },

    #[error("input error: non-finite value in '{name}' at index {index}")]
    NonFinite { name: &'static str, index: usize },

    #[error("input error: ragged matrix, row {row} has {found} columns, expected {expected}")]
    RaggedMatrix {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("input error: invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("input error: equity curve starts at {first}, expected initial capital {expected}")]
    InitialCapitalMismatch { first: f64, expected: f64 },

    // ── Numeric domain ──
    #[error("numeric domain error: '{name}' has zero variance")]
    ZeroVariance { name: String },

    #[error("numeric domain error: '{name}' must be positive, got {value}")]
    NonPositive { name: &'static str, value: f64 },

    #[error("numeric domain error: {0}")]
    UndefinedStatistic(String),

    // ── Timeout ──
    #[error("timeout after {0:?}")]
    Timeout(Duration),

    #[error("cancelled after the deadline passed")]
    Cancelled,

    // ── Internal ──
    #[error("internal error: {0}")]
    Internal(String),
}

impl ValidationError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptySeries { .. }
            | Self::LengthMismatch { .. }
            | Self::TooManySplits { .. }
            | Self::TooFewObservations { .. }
            | Self::NonMonotonicTimestamps { .. }
            | Self::MisalignedTimestamps { .. }
            | Self::NonFinite { .. }
            | Self::RaggedMatrix { .. }
            | Self::InvalidParameter { .. }
            | Self::InitialCapitalMismatch { .. } => ErrorKind::Input,
            Self::ZeroVariance { .. } | Self::NonPositive { .. } | Self::UndefinedStatistic(_) => {
                ErrorKind::NumericDomain
            }
            Self::Timeout(_) | Self::Cancelled => ErrorKind::Timeout,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
