//! TradeRecord: a realized fill as reported by the upstream data supplier.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single realized trade.
///
/// `size` is signed: positive for quantity bought, negative for quantity sold.
/// `timestamp` is the fill time; `signal_time`, when known, is when the
/// strategy decided to trade. Records are produced externally and consumed
/// read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub pnl: f64,
    pub size: f64,
    pub price: f64,
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal_time: Option<DateTime<Utc>>,
}

impl TradeRecord {
    pub fn new(
        pnl: f64,
        size: f64,
        price: f64,
        timestamp: DateTime<Utc>,
        symbol: impl Into<String>,
    ) -> Self {
        Self {
            pnl,
            size,
            price,
            timestamp,
            symbol: symbol.into(),
            signal_time: None,
        }
    }

    pub fn with_signal_time(mut self, signal_time: DateTime<Utc>) -> Self {
        self.signal_time = Some(signal_time);
        self
    }

    /// When the trade was decided; the fill time if no signal time was given.
    pub fn decided_at(&self) -> DateTime<Utc> {
        self.signal_time.unwrap_or(self.timestamp)
    }

    pub fn is_winner(&self) -> bool {
        self.pnl > 0.0
    }
}

/// Realized P&L of each trade, in order.
pub fn trade_returns(trades: &[TradeRecord]) -> Vec<f64> {
    trades.iter().map(|t| t.pnl).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_trade(pnl: f64) -> TradeRecord {
        TradeRecord::new(pnl, 10.0, 101.5, DateTime::<Utc>::default(), "BTCUSD")
    }

    #[test]
    fn winner_requires_positive_pnl() {
        assert!(sample_trade(0.01).is_winner());
        assert!(!sample_trade(0.0).is_winner());
        assert!(!sample_trade(-3.0).is_winner());
    }

    #[test]
    fn decided_at_falls_back_to_fill_time() {
        let t = sample_trade(1.0);
        assert_eq!(t.decided_at(), t.timestamp);
        let earlier = t.timestamp - chrono::Duration::seconds(2);
        assert_eq!(t.with_signal_time(earlier).decided_at(), earlier);
    }

    #[test]
    fn trade_returns_preserve_order() {
        let trades = vec![sample_trade(1.0), sample_trade(-2.0), sample_trade(3.0)];
        assert_eq!(trade_returns(&trades), vec![1.0, -2.0, 3.0]);
    }

    #[test]
    fn serde_round_trip() {
        let t = sample_trade(4.25);
        let json = serde_json::to_string(&t).unwrap();
        let back: TradeRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(t, back);
        assert!(!json.contains("signal_time"));

        let stamped = t.with_signal_time(DateTime::<Utc>::default());
        let json = serde_json::to_string(&stamped).unwrap();
        let back: TradeRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(stamped, back);
    }
}
