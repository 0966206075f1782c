//! Domain types for the validation engine.

pub mod input;
pub mod series;
pub mod trade;

pub use input::ValidationInput;
pub use series::{
    sequential_timestamps, EquityCurve, EquityPoint, FeatureMatrix, PriceSeries, SignalSeries,
    TimeSeries,
};
pub use trade::{trade_returns, TradeRecord};
