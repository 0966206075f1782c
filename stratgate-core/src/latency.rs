//! Latency and slippage simulation.
//!
//! Not a pass/fail gate: converts theoretical fills into delayed, slipped
//! fills so the gates downstream see realistic P&L. Every draw comes from the
//! caller's RNG, so a fixed seed reproduces the same adjustment.
//!
//! - Latency: uniform integer in `[1, max_latency_ms]`, added to the observed
//!   signal-to-execution gap.
//! - Slippage: `price + sign * price * slippage_pct` with `sign` uniform in
//!   `{-1, +1}`. The cost to a trade is `size * (adjusted - price)`.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::{EquityCurve, EquityPoint, TradeRecord};
use crate::error::ValidationError;

/// One latency draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatencySample {
    /// Randomly drawn infrastructure latency.
    pub simulated_ms: u64,
    /// `execution_time - signal_time + simulated_ms`.
    pub total_delay_ms: i64,
}

/// Slippage charged to a single trade, stamped at its delayed execution time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeCost {
    pub executed_at: DateTime<Utc>,
    pub cost: f64,
}

/// Result of running every trade through the simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencyAdjustment {
    /// Trades with slipped price, delayed timestamp and net-of-slippage pnl.
    pub trades: Vec<TradeRecord>,
    pub costs: Vec<TradeCost>,
    pub total_slippage_cost: f64,
    pub mean_delay_ms: f64,
    pub max_delay_ms: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatencySimulator {
    max_latency_ms: u64,
    slippage_pct: f64,
}

impl LatencySimulator {
    pub fn new(max_latency_ms: u64, slippage_pct: f64) -> Result<Self, ValidationError> {
        if max_latency_ms == 0 {
            return Err(ValidationError::invalid("max_latency_ms", "must be >= 1"));
        }
        if !slippage_pct.is_finite() || !(0.0..1.0).contains(&slippage_pct) {
            return Err(ValidationError::invalid(
                "slippage_pct",
                format!("must be in [0, 1), got {slippage_pct}"),
            ));
        }
        Ok(Self {
            max_latency_ms,
            slippage_pct,
        })
    }

    pub fn max_latency_ms(&self) -> u64 {
        self.max_latency_ms
    }

    pub fn slippage_pct(&self) -> f64 {
        self.slippage_pct
    }

    /// Draw a latency and report the total elapsed delay.
    pub fn simulate_latency<R: Rng + ?Sized>(
        &self,
        signal_time: DateTime<Utc>,
        execution_time: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<LatencySample, ValidationError> {
        if execution_time < signal_time {
            return Err(ValidationError::invalid(
                "execution_time",
                "execution precedes its signal",
            ));
        }
        let simulated_ms = rng.gen_range(1..=self.max_latency_ms);
        let observed_ms = (execution_time - signal_time).num_milliseconds();
        Ok(LatencySample {
            simulated_ms,
            total_delay_ms: observed_ms.saturating_add(simulated_ms as i64),
        })
    }

    /// Apply symmetric random slippage to a raw execution price.
    pub fn apply_slippage<R: Rng + ?Sized>(
        &self,
        price: f64,
        rng: &mut R,
    ) -> Result<f64, ValidationError> {
        if price <= 0.0 || !price.is_finite() {
            return Err(ValidationError::NonPositive {
                name: "price",
                value: price,
            });
        }
        let sign = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
        Ok(price + sign * price * self.slippage_pct)
    }

    /// Run every trade through latency and slippage.
    ///
    /// The delay of each trade runs from its signal time (or its fill time
    /// when no signal time is recorded) to the fill plus simulated latency.
    pub fn adjust_trades<R: Rng + ?Sized>(
        &self,
        trades: &[TradeRecord],
        rng: &mut R,
    ) -> Result<LatencyAdjustment, ValidationError> {
        let mut adjusted = Vec::with_capacity(trades.len());
        let mut costs = Vec::with_capacity(trades.len());
        let mut total_delay = 0i64;
        let mut max_delay_ms = 0i64;

        for trade in trades {
            let signal_time = trade.decided_at();
            let latency = self.simulate_latency(signal_time, trade.timestamp, rng)?;
            let price = self.apply_slippage(trade.price, rng)?;
            let cost = trade.size * (price - trade.price);
            let executed_at = signal_time + Duration::milliseconds(latency.total_delay_ms);

            total_delay += latency.total_delay_ms;
            max_delay_ms = max_delay_ms.max(latency.total_delay_ms);
            costs.push(TradeCost { executed_at, cost });
            adjusted.push(TradeRecord {
                pnl: trade.pnl - cost,
                size: trade.size,
                price,
                timestamp: executed_at,
                symbol: trade.symbol.clone(),
                signal_time: trade.signal_time,
            });
        }

        let mean_delay_ms = if trades.is_empty() {
            0.0
        } else {
            total_delay as f64 / trades.len() as f64
        };

        Ok(LatencyAdjustment {
            total_slippage_cost: costs.iter().map(|c| c.cost).sum(),
            trades: adjusted,
            costs,
            mean_delay_ms,
            max_delay_ms,
        })
    }
}

/// Subtract cumulative slippage from every equity point stamped at or after
/// each trade's execution.
pub fn adjust_equity(
    curve: &EquityCurve,
    adjustment: &LatencyAdjustment,
) -> Result<EquityCurve, ValidationError> {
    let mut costs = adjustment.costs.clone();
    costs.sort_by_key(|c| c.executed_at);

    let mut next = 0;
    let mut cumulative = 0.0;
    let points = curve
        .points()
        .iter()
        .map(|p| {
            while next < costs.len() && costs[next].executed_at <= p.timestamp {
                cumulative += costs[next].cost;
                next += 1;
            }
            EquityPoint {
                timestamp: p.timestamp,
                equity: p.equity - cumulative,
            }
        })
        .collect();
    EquityCurve::new(points)
}
