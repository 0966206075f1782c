//! Stratgate Core: domain types and building blocks for strategy validation.
//!
//! This crate contains everything the gating tests share:
//! - Domain types (trade records, equity curves, timestamped series, feature matrices)
//! - The error taxonomy (input, numeric domain, timeout)
//! - A BLAKE3-derived RNG hierarchy for reproducible randomized tests
//! - Numeric helpers (percentiles, correlation, standardization)
//! - The latency/slippage transform
//! - Model and decision-function abstractions
//!
//! Nothing in here performs I/O.

pub mod decision;
pub mod domain;
pub mod error;
pub mod latency;
pub mod model;
pub mod rng;
pub mod stats;

pub use decision::{DecisionFn, SharedDecision, Signal, TrendDecision};
pub use domain::{
    EquityCurve, EquityPoint, FeatureMatrix, PriceSeries, SignalSeries, TimeSeries, TradeRecord,
    ValidationInput,
};
pub use error::{ErrorKind, ValidationError};
pub use latency::{LatencyAdjustment, LatencySample, LatencySimulator};
pub use model::{Classifier, MajorityClass, ModelFactory, NearestCentroid};
pub use rng::RngHierarchy;
