//! Fit/predict model abstraction used by walk-forward validation.
//!
//! The walk-forward gate builds a fresh model per fold through a
//! [`ModelFactory`], so no state leaks from one fold into the next.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::FeatureMatrix;
use crate::error::ValidationError;

/// A supervised classifier over feature rows with integer class labels.
pub trait Classifier: Send {
    /// Model name (for reports).
    fn name(&self) -> &str;

    fn fit(&mut self, features: &FeatureMatrix, labels: &[i32]) -> Result<(), ValidationError>;

    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<i32>, ValidationError>;
}

/// Builds an unfitted classifier. Shared across threads by the orchestrator.
pub type ModelFactory = Arc<dyn Fn() -> Box<dyn Classifier> + Send + Sync>;

fn check_training_set(features: &FeatureMatrix, labels: &[i32]) -> Result<(), ValidationError> {
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
    Ok(())
}

// ─── Nearest centroid ────────────────────────────────────────────────

/// Assigns each row to the class whose training mean is nearest (Euclidean).
///
/// Ties go to the smallest label.
#[derive(Debug, Clone, Default)]
pub struct NearestCentroid {
    centroids: BTreeMap<i32, Vec<f64>>,
    n_features: usize,
}

impl NearestCentroid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn factory() -> ModelFactory {
        Arc::new(|| Box::new(NearestCentroid::new()) as Box<dyn Classifier>)
    }
}

impl Classifier for NearestCentroid {
    fn name(&self) -> &str {
        "nearest_centroid"
    }

    fn fit(&mut self, features: &FeatureMatrix, labels: &[i32]) -> Result<(), ValidationError> {
        check_training_set(features, labels)?;
        let d = features.n_cols();
        let mut sums: BTreeMap<i32, (Vec<f64>, usize)> = BTreeMap::new();
        for (row, &label) in features.rows().iter().zip(labels) {
            let entry = sums.entry(label).or_insert_with(|| (vec![0.0; d], 0));
            for (acc, v) in entry.0.iter_mut().zip(row) {
                *acc += v;
            }
            entry.1 += 1;
        }
        self.centroids = sums
            .into_iter()
            .map(|(label, (sum, count))| {
                (label, sum.into_iter().map(|s| s / count as f64).collect())
            })
            .collect();
        self.n_features = d;
        Ok(())
    }

    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<i32>, ValidationError> {
        if self.centroids.is_empty() {
            return Err(ValidationError::invalid("model", "predict called before fit"));
        }
        if !features.is_empty() && features.n_cols() != self.n_features {
            return Err(ValidationError::LengthMismatch {
                left: "fitted features",
                left_len: self.n_features,
                right: "prediction features",
                right_len: features.n_cols(),
            });
        }

        Ok(features
            .rows()
            .iter()
            .map(|row| {
                let mut best_label = 0;
                let mut best_dist = f64::INFINITY;
                for (&label, centroid) in &self.centroids {
                    let dist: f64 = row
                        .iter()
                        .zip(centroid)
                        .map(|(a, b)| (a - b).powi(2))
                        .sum();
                    if dist < best_dist {
                        best_dist = dist;
                        best_label = label;
                    }
                }
                best_label
            })
            .collect())
    }
}

// ─── Majority class ──────────────────────────────────────────────────

/// Always predicts the most frequent training label. Useful as a baseline.
#[derive(Debug, Clone, Default)]
pub struct MajorityClass {
    label: Option<i32>,
}

impl MajorityClass {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn factory() -> ModelFactory {
        Arc::new(|| Box::new(MajorityClass::new()) as Box<dyn Classifier>)
    }
}

impl Classifier for MajorityClass {
    fn name(&self) -> &str {
        "majority_class"
    }

    fn fit(&mut self, features: &FeatureMatrix, labels: &[i32]) -> Result<(), ValidationError> {
        check_training_set(features, labels)?;
        let mut counts: BTreeMap<i32, usize> = BTreeMap::new();
        for &label in labels {
            *counts.entry(label).or_default() += 1;
        }
        // BTreeMap iterates ascending, so `>` keeps the smallest label on ties.
        let mut best: Option<(i32, usize)> = None;
        for (label, count) in counts {
            if best.map_or(true, |(_, c)| count > c) {
                best = Some((label, count));
            }
        }
        self.label = best.map(|(label, _)| label);
        Ok(())
    }

    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<i32>, ValidationError> {
        match self.label {
            Some(label) => Ok(vec![label; features.n_rows()]),
            None => Err(ValidationError::invalid("model", "predict called before fit")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(rows: &[[f64; 2]]) -> FeatureMatrix {
        FeatureMatrix::new(rows.iter().map(|r| r.to_vec()).collect()).unwrap()
    }

    #[test]
    fn nearest_centroid_separates_clusters() {
        let x = matrix(&[[0.0, 0.0], [0.2, 0.1], [5.0, 5.0], [5.2, 4.9]]);
        let y = [0, 0, 1, 1];
        let mut model = NearestCentroid::new();
        model.fit(&x, &y).unwrap();
        let pred = model.predict(&matrix(&[[0.1, 0.0], [4.8, 5.1]])).unwrap();
        assert_eq!(pred, vec![0, 1]);
    }

    #[test]
    fn nearest_centroid_single_class() {
        let x = matrix(&[[1.0, 1.0], [2.0, 2.0]]);
        let mut model = NearestCentroid::new();
        model.fit(&x, &[1, 1]).unwrap();
        assert_eq!(model.predict(&matrix(&[[-9.0, 3.0]])).unwrap(), vec![1]);
    }

    #[test]
    fn predict_before_fit_is_error() {
        let x = matrix(&[[1.0, 1.0]]);
        assert!(NearestCentroid::new().predict(&x).is_err());
        assert!(MajorityClass::new().predict(&x).is_err());
    }

    #[test]
    fn fit_rejects_label_mismatch() {
        let x = matrix(&[[1.0, 1.0], [2.0, 2.0]]);
        let err = NearestCentroid::new().fit(&x, &[1]).unwrap_err();
        assert!(matches!(err, ValidationError::LengthMismatch { .. }));
    }

    #[test]
    fn majority_class_breaks_ties_low() {
        let x = matrix(&[[0.0, 0.0], [0.0, 0.0], [0.0, 0.0], [0.0, 0.0]]);
        let mut model = MajorityClass::new();
        model.fit(&x, &[1, 0, 1, 0]).unwrap();
        assert_eq!(model.predict(&x).unwrap(), vec![0; 4]);
        model.fit(&x, &[1, 1, 1, 0]).unwrap();
        assert_eq!(model.predict(&x).unwrap(), vec![1; 4]);
    }

    #[test]
    fn factories_build_fresh_models() {
        let factory = NearestCentroid::factory();
        let a = factory();
        let b = factory();
        assert_eq!(a.name(), "nearest_centroid");
        assert_eq!(b.name(), "nearest_centroid");
    }
}
