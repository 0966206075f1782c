//! Regime stability: cluster observations into market regimes and check
//! that no regime is a thin or scattered corner of the data.
//!
//! Features are standardized column-wise, then clustered with k-means
//! (k-means++ seeding, Lloyd iterations, several restarts keeping the lowest
//! inertia). Every random choice comes from the injected RNG.

use rand::Rng;
use serde::{Deserialize, Serialize};
use stratgate_core::stats::{population_std, standardize_columns};
use stratgate_core::{FeatureMatrix, ValidationError};

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

// ─── K-means ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KMeans {
    pub n_clusters: usize,
    pub max_iterations: usize,
    pub restarts: usize,
}

/// A fitted clustering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clustering {
    pub centroids: Vec<Vec<f64>>,
    /// Cluster index per observation.
    pub assignments: Vec<usize>,
    /// Sum of squared distances to the assigned centroid.
    pub inertia: f64,
    /// Lloyd iterations used by the winning restart.
    pub iterations: usize,
}

impl Clustering {
    pub fn populations(&self) -> Vec<usize> {
        let mut counts = vec![0; self.centroids.len()];
        for &a in &self.assignments {
            counts[a] += 1;
        }
        counts
    }
}

impl KMeans {
    pub fn new(
        n_clusters: usize,
        max_iterations: usize,
        restarts: usize,
    ) -> Result<Self, ValidationError> {
        if n_clusters == 0 {
            return Err(ValidationError::invalid("n_clusters", "must be >= 1"));
        }
        if max_iterations == 0 {
            return Err(ValidationError::invalid("kmeans_max_iterations", "must be >= 1"));
        }
        if restarts == 0 {
            return Err(ValidationError::invalid("kmeans_restarts", "must be >= 1"));
        }
        Ok(Self {
            n_clusters,
            max_iterations,
            restarts,
        })
    }

    pub fn fit<R: Rng + ?Sized>(
        &self,
        rows: &[Vec<f64>],
        rng: &mut R,
    ) -> Result<Clustering, ValidationError> {
        if rows.is_empty() {
            return Err(ValidationError::EmptySeries {
                name: "observations",
            });
        }
        if rows.len() < self.n_clusters {
            return Err(ValidationError::TooFewObservations {
                n_clusters: self.n_clusters,
                observations: rows.len(),
            });
        }

        let mut best: Option<Clustering> = None;
        for _ in 0..self.restarts {
            let candidate = self.fit_once(rows, rng);
            if best.as_ref().map_or(true, |b| candidate.inertia < b.inertia) {
                best = Some(candidate);
            }
        }
        best.ok_or_else(|| ValidationError::Internal("k-means produced no clustering".into()))
    }

    fn fit_once<R: Rng + ?Sized>(&self, rows: &[Vec<f64>], rng: &mut R) -> Clustering {
        let mut centroids = plus_plus_seeds(rows, self.n_clusters, rng);
        let mut assignments = vec![usize::MAX; rows.len()];
        let mut iterations = 0;

        for iter in 1..=self.max_iterations {
            iterations = iter;
            if !assign(rows, &centroids, &mut assignments) {
                break;
            }
            update_centroids(rows, &mut centroids, &mut assignments);
        }
        // Centroids may have moved after the last assignment.
        assign(rows, &centroids, &mut assignments);

        let inertia = rows
            .iter()
            .zip(&assignments)
            .map(|(row, &a)| squared_distance(row, &centroids[a]))
            .sum();
        Clustering {
            centroids,
            assignments,
            inertia,
            iterations,
        }
    }
}

/// k-means++: first centre uniform, then each next centre drawn with
/// probability proportional to its squared distance from the nearest
/// chosen centre.
fn plus_plus_seeds<R: Rng + ?Sized>(rows: &[Vec<f64>], k: usize, rng: &mut R) -> Vec<Vec<f64>> {
    let mut centroids = Vec::with_capacity(k);
    centroids.push(rows[rng.gen_range(0..rows.len())].clone());
    let mut nearest: Vec<f64> = rows
        .iter()
        .map(|r| squared_distance(r, &centroids[0]))
        .collect();

    while centroids.len() < k {
        let total: f64 = nearest.iter().sum();
        let pick = if total > 0.0 {
            let target = rng.gen_range(0.0..total);
            let mut cumulative = 0.0;
            nearest
                .iter()
                .position(|d| {
                    cumulative += d;
                    cumulative > target
                })
                .unwrap_or(rows.len() - 1)
        } else {
            // Every point coincides with a chosen centre.
            rng.gen_range(0..rows.len())
        };
        let centre = rows[pick].clone();
        for (d, row) in nearest.iter_mut().zip(rows) {
            *d = d.min(squared_distance(row, &centre));
        }
        centroids.push(centre);
    }
    centroids
}

/// Assign each row to its nearest centroid (ties to the lowest index).
/// Returns whether any assignment changed.
fn assign(rows: &[Vec<f64>], centroids: &[Vec<f64>], assignments: &mut [usize]) -> bool {
    let mut changed = false;
    for (row, slot) in rows.iter().zip(assignments.iter_mut()) {
        let mut best = 0;
        let mut best_dist = f64::INFINITY;
        for (j, c) in centroids.iter().enumerate() {
            let d = squared_distance(row, c);
            if d < best_dist {
                best_dist = d;
                best = j;
            }
        }
        if *slot != best {
            *slot = best;
            changed = true;
        }
    }
    changed
}

/// Move each centroid to the mean of its members. An empty cluster takes
/// over the point farthest from its current centroid.
fn update_centroids(rows: &[Vec<f64>], centroids: &mut [Vec<f64>], assignments: &mut [usize]) {
    let d = rows[0].len();
    let k = centroids.len();
    let mut sums = vec![vec![0.0; d]; k];
    let mut counts = vec![0usize; k];
    for (row, &a) in rows.iter().zip(assignments.iter()) {
        counts[a] += 1;
        for (s, v) in sums[a].iter_mut().zip(row) {
            *s += v;
        }
    }

    for j in 0..k {
        if counts[j] > 0 {
            continue;
        }
        let farthest = rows
            .iter()
            .zip(assignments.iter())
            .enumerate()
            .filter(|(_, (_, &a))| counts[a] > 1)
            .map(|(i, (row, &a))| (i, squared_distance(row, &centroids[a])))
            .fold(None, |best: Option<(usize, f64)>, (i, dist)| match best {
                Some((_, bd)) if bd >= dist => best,
                _ => Some((i, dist)),
            });
        if let Some((i, _)) = farthest {
            let donor = assignments[i];
            counts[donor] -= 1;
            for (s, v) in sums[donor].iter_mut().zip(&rows[i]) {
                *s -= v;
            }
            assignments[i] = j;
            counts[j] = 1;
            sums[j] = rows[i].clone();
        }
    }

    for ((centroid, sum), &count) in centroids.iter_mut().zip(sums).zip(&counts) {
        if count > 0 {
            *centroid = sum.into_iter().map(|s| s / count as f64).collect();
        }
    }
}

// ─── Regime tester ───────────────────────────────────────────────────

/// Statistics of one discovered regime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeStats {
    pub cluster: usize,
    pub population: usize,
    /// `population / n_observations`.
    pub share: f64,
    /// Mean over features of the members' population std (standardized units).
    pub dispersion: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeResult {
    pub regimes: Vec<RegimeStats>,
    pub n_observations: usize,
    pub inertia: f64,
    pub iterations: usize,
}

impl RegimeResult {
    pub fn populations(&self) -> Vec<usize> {
        self.regimes.iter().map(|r| r.population).collect()
    }

    /// Regimes that are too small or too scattered.
    pub fn fragile_regimes(&self, min_share: f64, max_dispersion: f64) -> usize {
        self.regimes
            .iter()
            .filter(|r| r.share < min_share || r.dispersion > max_dispersion)
            .count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegimeStabilityTester {
    kmeans: KMeans,
}

impl RegimeStabilityTester {
    pub fn new(kmeans: KMeans) -> Self {
        Self { kmeans }
    }

    pub fn run<R: Rng + ?Sized>(
        &self,
        data: &FeatureMatrix,
        rng: &mut R,
    ) -> Result<RegimeResult, ValidationError> {
        let standardized = standardize_columns(data.rows());
        let clustering = self.kmeans.fit(&standardized, rng)?;
        let n = standardized.len();
        let n_cols = data.n_cols();

        let regimes = (0..self.kmeans.n_clusters)
            .map(|cluster| {
                let members: Vec<&Vec<f64>> = standardized
                    .iter()
                    .zip(&clustering.assignments)
                    .filter(|(_, &a)| a == cluster)
                    .map(|(row, _)| row)
                    .collect();
                let dispersion = if members.is_empty() || n_cols == 0 {
                    0.0
                } else {
                    (0..n_cols)
                        .map(|j| {
                            let column: Vec<f64> = members.iter().map(|r| r[j]).collect();
                            population_std(&column)
                        })
                        .sum::<f64>()
                        / n_cols as f64
                };
                RegimeStats {
                    cluster,
                    population: members.len(),
                    share: members.len() as f64 / n as f64,
                    dispersion,
                }
            })
            .collect();

        Ok(RegimeResult {
            regimes,
            n_observations: n,
            inertia: clustering.inertia,
            iterations: clustering.iterations,
        })
    }
}
