//! Derived datasets the gates build from signals and prices.
//!
//! Signals and prices must share timestamps; row `t` then only uses
//! information available at `t` for features and strictly later prices for
//! labels/targets.

use stratgate_core::{FeatureMatrix, PriceSeries, SignalSeries, ValidationError};

fn aligned<'a>(
    signals: &'a SignalSeries,
    prices: &'a PriceSeries,
) -> Result<(&'a [f64], &'a [f64]), ValidationError> {
    if signals.is_empty() {
        return Err(ValidationError::EmptySeries { name: "signals" });
    }
    if prices.is_empty() {
        return Err(ValidationError::EmptySeries { name: "prices" });
    }
    signals.ensure_aligned("signals", prices, "prices")?;
    Ok((signals.values(), prices.values()))
}

/// Walk-forward features `[signal_t, return_t]` with label `1` when the next
/// price is higher, for `t` in `[1, len - 1)`.
pub fn direction_dataset(
    signals: &SignalSeries,
    prices: &PriceSeries,
) -> Result<(FeatureMatrix, Vec<i32>), ValidationError> {
    let (s, _) = aligned(signals, prices)?;
    let returns = prices.simple_returns()?;
    let p = prices.values();

    let end = p.len().saturating_sub(1);
    let rows = (1..end).map(|t| vec![s[t], returns[t - 1]]).collect();
    let labels = (1..end).map(|t| i32::from(p[t + 1] > p[t])).collect();
    Ok((FeatureMatrix::new(rows)?, labels))
}

/// Regime observations `[return_t, signal_t]` for `t` in `[1, len)`.
pub fn regime_matrix(
    signals: &SignalSeries,
    prices: &PriceSeries,
) -> Result<FeatureMatrix, ValidationError> {
    let (s, _) = aligned(signals, prices)?;
    let returns = prices.simple_returns()?;
    let rows = returns
        .iter()
        .zip(&s[1..])
        .map(|(&r, &sig)| vec![r, sig])
        .collect();
    FeatureMatrix::new(rows)
}

/// Signals truncated to the rows of a forward-return matrix built from the
/// same prices.
pub fn decay_inputs(
    signals: &SignalSeries,
    prices: &PriceSeries,
    horizons: &[usize],
) -> Result<(Vec<f64>, FeatureMatrix), ValidationError> {
    let (s, p) = aligned(signals, prices)?;
    let future = crate::alpha_decay::forward_return_matrix(p, horizons)?;
    Ok((s[..future.n_rows()].to_vec(), future))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use stratgate_core::ErrorKind;

    fn series(v: &[f64]) -> SignalSeries {
        SignalSeries::from_values(v.to_vec()).unwrap()
    }

    #[test]
    fn direction_rows_and_labels() {
        let signals = series(&[0.0, 1.0, 2.0, 3.0]);
        let prices = series(&[100.0, 110.0, 99.0, 120.0]);
        let (x, y) = direction_dataset(&signals, &prices).unwrap();
        assert_eq!(x.n_rows(), 2);
        assert_eq!(x.row(0)[0], 1.0);
        assert!((x.row(0)[1] - 0.1).abs() < 1e-12);
        assert_eq!(y, vec![0, 1]);
    }

    #[test]
    fn regime_rows_skip_first_period() {
        let signals = series(&[5.0, 6.0, 7.0]);
        let prices = series(&[100.0, 105.0, 100.0]);
        let m = regime_matrix(&signals, &prices).unwrap();
        assert_eq!(m.n_rows(), 2);
        assert_eq!(m.row(1)[1], 7.0);
    }

    #[test]
    fn decay_inputs_align_signals() {
        let signals = series(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let prices = series(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        let (s, m) = decay_inputs(&signals, &prices, &[1, 2]).unwrap();
        assert_eq!(s, vec![1.0, 2.0, 3.0]);
        assert_eq!(m.n_rows(), 3);
    }

    #[test]
    fn misaligned_series_rejected() {
        let err = regime_matrix(&series(&[1.0]), &series(&[1.0, 2.0])).unwrap_err();
        assert!(matches!(err, ValidationError::LengthMismatch { .. }));
        let err = direction_dataset(&series(&[]), &series(&[])).unwrap_err();
        assert!(matches!(err, ValidationError::EmptySeries { .. }));
    }

    #[test]
    fn lagged_signals_rejected_by_every_builder() {
        let prices = series(&(0..30).map(|i| 100.0 + i as f64).collect::<Vec<_>>());
        let lagged: Vec<_> = prices
            .timestamps()
            .iter()
            .map(|t| *t + Duration::days(10))
            .collect();
        let signals = SignalSeries::new(lagged, (0..30).map(|i| i as f64).collect()).unwrap();

        let err = direction_dataset(&signals, &prices).unwrap_err();
        assert!(matches!(err, ValidationError::MisalignedTimestamps { index: 0, .. }));
        assert_eq!(err.kind(), ErrorKind::Input);
        assert_eq!(
            regime_matrix(&signals, &prices).unwrap_err().kind(),
            ErrorKind::Input
        );
        assert_eq!(
            decay_inputs(&signals, &prices, &[1, 5]).unwrap_err().kind(),
            ErrorKind::Input
        );
    }
}
