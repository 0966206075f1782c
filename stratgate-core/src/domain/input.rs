//! The dataset a single validation run consumes.

use serde::{Deserialize, Serialize};

use super::series::{EquityCurve, PriceSeries, SignalSeries};
use super::trade::TradeRecord;

/// Everything one `validate` call needs, assembled by the data supplier.
///
/// Passed by value so concurrent runs never share mutable state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationInput {
    /// Identifies the strategy; also keys its RNG stream.
    pub strategy_id: String,
    #[serde(default)]
    pub trades: Vec<TradeRecord>,
    pub equity_curve: EquityCurve,
    pub signals: SignalSeries,
    pub prices: PriceSeries,
}

impl ValidationInput {
    pub fn new(
        strategy_id: impl Into<String>,
        trades: Vec<TradeRecord>,
        equity_curve: EquityCurve,
        signals: SignalSeries,
        prices: PriceSeries,
    ) -> Self {
        Self {
            strategy_id: strategy_id.into(),
            trades,
            equity_curve,
            signals,
            prices,
        }
    }
}
