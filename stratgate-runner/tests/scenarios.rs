//! End-to-end scenarios with known answers.

use std::sync::Arc;

use chrono::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use stratgate_core::domain::sequential_timestamps;
use stratgate_core::{
    EquityCurve, ErrorKind, PriceSeries, Signal, SignalSeries, TradeRecord, ValidationError,
    ValidationInput,
};
use stratgate_runner::{
    DrawdownChecker, Gate, GateOutcome, MonteCarloValidator, NoiseRobustnessTester,
    StrategyValidator, ValidationConfig,
};

fn trending_input(id: &str, len: usize) -> ValidationInput {
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
            TradeRecord::new(pnl, 10.0, prices[2 * i], stamps[2 * i], "ETHUSD")
        })
        .collect();
    ValidationInput::new(
        id,
        trades,
        EquityCurve::from_values(&equity).unwrap(),
        SignalSeries::from_values(signals).unwrap(),
        PriceSeries::from_values(prices).unwrap(),
    )
}

#[test]
fn sharp_decline_breaches_drawdown_limit() {
    let curve = EquityCurve::from_values(&[100.0, 95.0, 90.0, 98.0, 85.0]).unwrap();
    let check = DrawdownChecker::new(0.05).unwrap().check(&curve);
    assert!((check.max_drawdown - 0.15).abs() < 1e-12);
    assert!(!check.passed);
    assert_eq!(check.peak_index, 0);
    assert_eq!(check.trough_index, 4);
}

#[test]
fn flat_curve_passes_drawdown_limit() {
    let curve = EquityCurve::from_values(&[100.0, 100.0, 100.0]).unwrap();
    let check = DrawdownChecker::new(0.05).unwrap().check(&curve);
    assert_eq!(check.max_drawdown, 0.0);
    assert!(check.passed);
}

#[test]
fn identical_returns_give_a_single_outcome() {
    let validator = MonteCarloValidator::new(100, 100.0, 1.0).unwrap();
    let result = validator
        .run(&[10.0, 10.0, 10.0, 10.0], &mut StdRng::seed_from_u64(42))
        .unwrap();
    assert!((result.median_final_equity - 140.0).abs() < 1e-9);
    assert!(result.passed);
}

#[test]
fn constant_decision_is_perfectly_stable() {
    let tester = NoiseRobustnessTester::new(0.5, 20).unwrap();
    let always_long = |_: &[f64]| Signal::Long;
    let result = tester
        .run(&[1.0, 2.0, 3.0, 4.0], &always_long, &mut StdRng::seed_from_u64(7))
        .unwrap();
    assert_eq!(result.instability_ratio, 0.0);
    assert_eq!(result.trials, 20);
}

struct BrokenMonteCarlo;

impl Gate for BrokenMonteCarlo {
    fn name(&self) -> &str {
        "monte_carlo"
    }

    fn evaluate(
        &self,
        _: &ValidationInput,
        _: &mut StdRng,
    ) -> Result<GateOutcome, ValidationError> {
        Err(ValidationError::UndefinedStatistic(
            "simulated failure".into(),
        ))
    }
}

#[test]
fn failing_gate_rejects_but_others_still_report() {
    let validator = StrategyValidator::new(ValidationConfig::default())
        .unwrap()
        .with_gate(Arc::new(BrokenMonteCarlo))
        .unwrap();
    let report = validator.validate(trending_input("broken-mc", 120));

    assert!(!report.overall_passed);
    assert!(report.fatal_error.is_none());

    let mc = report.get("monte_carlo").unwrap();
    assert!(!mc.passed);
    assert!(mc.error.as_deref().is_some_and(|e| !e.is_empty()));
    assert_eq!(mc.error_kind, Some(ErrorKind::NumericDomain));

    assert_eq!(report.results.len(), 7);
    for name in ["drawdown", "noise_robustness", "performance"] {
        let outcome = report.get(name).unwrap();
        assert!(outcome.error.is_none(), "{name}: {:?}", outcome.error);
        assert!(!outcome.metrics.is_empty(), "{name} has no metrics");
    }
    assert!(report.failed_tests().contains(&"monte_carlo"));
}

#[test]
fn missing_trades_fail_monte_carlo_only_as_an_entry() {
    let mut input = trending_input("no-trades", 120);
    input.trades.clear();
    let report = StrategyValidator::new(ValidationConfig::default())
        .unwrap()
        .validate(input);

    assert!(!report.overall_passed);
    let mc = report.get("monte_carlo").unwrap();
    assert_eq!(mc.error_kind, Some(ErrorKind::Input));
    let dd = report.get("drawdown").unwrap();
    assert!(dd.error.is_none());
}

#[test]
fn signal_unrelated_to_prices_fails_alpha_decay() {
    let mut input = trending_input("flicker", 120);
    // Period-2 alternation carries no information about the slow price cycle.
    let flicker: Vec<f64> = (0..120).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
    input.signals = SignalSeries::from_values(flicker).unwrap();
    let report = StrategyValidator::new(ValidationConfig::default())
        .unwrap()
        .validate(input);

    let decay = report.get("alpha_decay").unwrap();
    assert!(!decay.passed);
    assert_eq!(decay.error_kind, Some(ErrorKind::NumericDomain));
    assert!(!report.overall_passed);
}

#[test]
fn lagged_signals_are_rejected_as_input_errors() {
    let mut input = trending_input("lagged", 60);
    let lagged: Vec<_> = input
        .signals
        .timestamps()
        .iter()
        .map(|t| *t + Duration::days(10))
        .collect();
    input.signals = SignalSeries::new(lagged, input.signals.values().to_vec()).unwrap();
    let report = StrategyValidator::new(ValidationConfig::default())
        .unwrap()
        .validate(input);

    for name in ["walk_forward", "regime_stability", "alpha_decay"] {
        let outcome = report.get(name).unwrap();
        assert!(!outcome.passed, "{name}");
        assert_eq!(outcome.error_kind, Some(ErrorKind::Input), "{name}");
    }
    assert!(report.get("drawdown").unwrap().error.is_none());
    assert!(!report.overall_passed);
}
