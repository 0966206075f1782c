//! Property-based tests for the validation components.
//!
//! Each property states an invariant that must hold for any input, not just
//! the hand-picked cases in the unit tests.

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use stratgate_core::Signal;
use stratgate_runner::{
    expanding_window_splits, max_drawdown, KMeans, MonteCarloValidator, NoiseRobustnessTester,
};

// ── Strategies ──

fn arb_rising_curve() -> impl Strategy<Value = Vec<f64>> {
    (1.0..1_000.0f64, prop::collection::vec(0.0..50.0f64, 0..80)).prop_map(|(start, steps)| {
        let mut curve = vec![start];
        for s in steps {
            let next = curve[curve.len() - 1] + s;
            curve.push(next);
        }
        curve
    })
}

fn arb_positive_curve() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.01..10_000.0f64, 1..120)
}

fn arb_trade_returns() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-50.0..50.0f64, 1..40)
}

fn arb_split_setup() -> impl Strategy<Value = (usize, usize)> {
    (2usize..300).prop_flat_map(|n| (Just(n), 1..n))
}

fn arb_points() -> impl Strategy<Value = (Vec<Vec<f64>>, usize)> {
    (1usize..5).prop_flat_map(|k| {
        (
            prop::collection::vec(prop::collection::vec(-10.0..10.0f64, 2), k..60),
            Just(k),
        )
    })
}

fn threshold_decision(data: &[f64]) -> Signal {
    if data.iter().sum::<f64>() > 0.0 {
        Signal::Long
    } else {
        Signal::Short
    }
}

// ── 1. Drawdown ──

proptest! {
    #[test]
    fn non_decreasing_curve_has_zero_drawdown(curve in arb_rising_curve()) {
        prop_assert_eq!(max_drawdown(&curve), 0.0);
    }

    #[test]
    fn drawdown_of_positive_curve_is_a_fraction(curve in arb_positive_curve()) {
        let dd = max_drawdown(&curve);
        prop_assert!((0.0..=1.0).contains(&dd), "drawdown {} out of range", dd);
    }
}

// ── 2. Monte Carlo ──

proptest! {
    #[test]
    fn shuffling_preserves_final_equity(
        returns in arb_trade_returns(),
        initial in 100.0..10_000.0f64,
        seed in any::<u64>(),
    ) {
        let validator = MonteCarloValidator::new(20, initial, 1.0).unwrap();
        let result = validator.run(&returns, &mut StdRng::seed_from_u64(seed)).unwrap();
        let expected = initial + returns.iter().sum::<f64>();
        prop_assert!((result.min_final_equity - expected).abs() < 1e-6);
        prop_assert!((result.max_final_equity - expected).abs() < 1e-6);
        prop_assert!((result.median_final_equity - expected).abs() < 1e-6);
        prop_assert!((0.0..=1.0).contains(&result.ruin_probability));
    }
}

// ── 3. Walk-forward splits ──

proptest! {
    #[test]
    fn training_always_precedes_testing((n, k) in arb_split_setup()) {
        let folds = expanding_window_splits(n, k).unwrap();
        prop_assert_eq!(folds.len(), k);
        for fold in &folds {
            prop_assert!(!fold.train.is_empty());
            prop_assert!(!fold.test.is_empty());
            prop_assert!(fold.train.end - 1 < fold.test.start);
            prop_assert!(fold.test.end <= n);
        }
        for pair in folds.windows(2) {
            prop_assert!(pair[0].train.end < pair[1].train.end);
        }
        prop_assert_eq!(folds[k - 1].test.end, n);
    }

    #[test]
    fn too_many_splits_is_rejected(n in 0usize..50, extra in 0usize..10) {
        prop_assert!(expanding_window_splits(n, n + extra).is_err());
    }
}

// ── 4. Clustering ──

proptest! {
    #[test]
    fn cluster_populations_cover_every_observation(
        (rows, k) in arb_points(),
        seed in any::<u64>(),
    ) {
        let kmeans = KMeans::new(k, 50, 2).unwrap();
        let clustering = kmeans.fit(&rows, &mut StdRng::seed_from_u64(seed)).unwrap();
        let populations = clustering.populations();
        prop_assert_eq!(populations.len(), k);
        prop_assert_eq!(populations.iter().sum::<usize>(), rows.len());
        prop_assert!(clustering.assignments.iter().all(|&a| a < k));
    }
}

// ── 5. Noise robustness ──

proptest! {
    #[test]
    fn instability_is_a_fraction(
        data in prop::collection::vec(-5.0..5.0f64, 1..30),
        level in 0.0..2.0f64,
        trials in 1usize..40,
        seed in any::<u64>(),
    ) {
        let tester = NoiseRobustnessTester::new(level, trials).unwrap();
        let result = tester
            .run(&data, &threshold_decision, &mut StdRng::seed_from_u64(seed))
            .unwrap();
        prop_assert!((0.0..=1.0).contains(&result.instability_ratio));
        prop_assert!(result.flips <= trials);
    }

    #[test]
    fn zero_noise_never_flips(
        data in prop::collection::vec(-5.0..5.0f64, 1..30),
        trials in 1usize..40,
    ) {
        let tester = NoiseRobustnessTester::new(0.0, trials).unwrap();
        let result = tester
            .run(&data, &threshold_decision, &mut StdRng::seed_from_u64(0))
            .unwrap();
        prop_assert_eq!(result.instability_ratio, 0.0);
    }
}
