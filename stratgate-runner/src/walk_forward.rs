//! Walk-forward validation: time-ordered, expanding-window cross-validation.
//!
//! The training window always ends before the test window starts, so no
//! fold ever sees data from its own future:
//!
//! ```text
//! test  = n / (n_splits + 1)
//! fold i: train = [0, n - (n_splits - i) * test)
//!         test  = [train_end, train_end + test)
//! ```

use std::ops::Range;

use serde::{Deserialize, Serialize};
use stratgate_core::{FeatureMatrix, ModelFactory, ValidationError};

/// Train/test index ranges of one fold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fold {
    pub index: usize,
    pub train: Range<usize>,
    pub test: Range<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoldScore {
    pub fold: Fold,
    /// Fraction of test rows predicted correctly.
    pub accuracy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkForwardResult {
    pub folds: Vec<FoldScore>,
    pub mean_score: f64,
    pub model: String,
}

impl WalkForwardResult {
    pub fn scores(&self) -> Vec<f64> {
        self.folds.iter().map(|f| f.accuracy).collect()
    }
}

// ─── Fold creation ───────────────────────────────────────────────────

/// Expanding-window splits over `n_samples` observations.
pub fn expanding_window_splits(
    n_samples: usize,
    n_splits: usize,
) -> Result<Vec<Fold>, ValidationError> {
    if n_splits == 0 {
        return Err(ValidationError::invalid("n_splits", "must be >= 1"));
    }
    if n_splits + 1 > n_samples {
        return Err(ValidationError::TooManySplits {
            n_splits,
            required: n_splits + 1,
            available: n_samples,
        });
    }

    let test_size = n_samples / (n_splits + 1);
    Ok((0..n_splits)
        .map(|i| {
            let train_end = n_samples - (n_splits - i) * test_size;
            Fold {
                index: i,
                train: 0..train_end,
                test: train_end..train_end + test_size,
            }
        })
        .collect())
}

// ─── Validator ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkForwardValidator {
    n_splits: usize,
}

impl WalkForwardValidator {
    pub fn new(n_splits: usize) -> Result<Self, ValidationError> {
        if n_splits == 0 {
            return Err(ValidationError::invalid("n_splits", "must be >= 1"));
        }
        Ok(Self { n_splits })
    }

    pub fn n_splits(&self) -> usize {
        self.n_splits
    }

    /// Fit a fresh model per fold and score it on that fold's test rows.
    pub fn run(
        &self,
        features: &FeatureMatrix,
        labels: &[i32],
        model_factory: &ModelFactory,
    ) -> Result<WalkForwardResult, ValidationError> {
        if features.is_empty() {
            return Err(ValidationError::EmptySeries { name: "features" });
        }
        if features.n_rows() != labels.len() {
            return Err(ValidationError::LengthMismatch {
                left: "features",
                left_len: features.n_rows(),
                right: "labels",
                right_len: labels.len(),
            });
        }

        let folds = expanding_window_splits(features.n_rows(), self.n_splits)?;
        let mut model_name = String::new();
        let mut scores = Vec::with_capacity(folds.len());

        for fold in folds {
            let mut model = model_factory();
            model_name = model.name().to_string();
            model.fit(
                &features.slice_rows(fold.train.clone()),
                &labels[fold.train.clone()],
            )?;
            let predicted = model.predict(&features.slice_rows(fold.test.clone()))?;
            let actual = &labels[fold.test.clone()];
            if predicted.len() != actual.len() {
                return Err(ValidationError::LengthMismatch {
                    left: "predictions",
                    left_len: predicted.len(),
                    right: "test labels",
                    right_len: actual.len(),
                });
            }
            let correct = predicted.iter().zip(actual).filter(|(p, a)| p == a).count();
            scores.push(FoldScore {
                fold,
                accuracy: correct as f64 / actual.len() as f64,
            });
        }

        let mean_score = scores.iter().map(|s| s.accuracy).sum::<f64>() / scores.len() as f64;
        Ok(WalkForwardResult {
            folds: scores,
            mean_score,
            model: model_name,
        })
    }
}
