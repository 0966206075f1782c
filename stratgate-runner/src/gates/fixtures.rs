//! Shared inputs for gate unit tests.

use stratgate_core::domain::sequential_timestamps;
use stratgate_core::{EquityCurve, PriceSeries, SignalSeries, TradeRecord, ValidationInput};

/// Trending prices with a mildly informative signal and a rising equity curve.
pub fn trending_input(len: usize) -> ValidationInput {
    let prices: Vec<f64> = (0..len)
        .map(|i| 100.0 + i as f64 * 0.5 + (i as f64 * 0.7).sin())
        .collect();
    let signals: Vec<f64> = (0..len).map(|i| (i as f64 * 0.7 + 0.7).cos()).collect();
    let equity: Vec<f64> = (0..len)
        .map(|i| 100_000.0 + i as f64 * 150.0 - if i % 4 == 3 { 200.0 } else { 0.0 })
        .collect();
    let stamps = sequential_timestamps(len);
    let trades = (0..len / 2)
        .map(|i| {
            let pnl = if i % 3 == 2 { -40.0 } else { 90.0 };
            TradeRecord::new(pnl, 10.0, prices[2 * i], stamps[2 * i], "BTCUSD")
        })
        .collect();
    ValidationInput::new(
        "fixture",
        trades,
        EquityCurve::from_values(&equity).unwrap(),
        SignalSeries::from_values(signals).unwrap(),
        PriceSeries::from_values(prices).unwrap(),
    )
}
