//! Seeded k-means clustering.
//!
//! ## Algorithm
//! 1. k-means++ seeding from a ChaCha RNG seeded with `seed + run`
//! 2. Lloyd iterations: assign every row to its nearest centroid (in
//!    parallel), move each centroid to the mean of its members
//! 3. Stop when centroids move less than `tolerance` or after
//!    `max_iterations`
//! 4. Repeat for `n_init` runs and keep the run with the lowest inertia
//!
//! An empty cluster keeps its previous centroid. Distance ties go to the
//! lowest cluster index, so identical input and seed always produce
//! identical labels.

use crate::error::{ModelError, Result};
use crate::neighbors::squared_euclidean;
use data_loader::{ClusterId, RowIndex};
use ndarray::{Array2, ArrayView1, ArrayView2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// k-means hyper-parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KMeansConfig {
    pub n_clusters: usize,
    pub max_iterations: usize,
    pub tolerance: f64,
    pub n_init: usize,
    pub seed: u64,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            n_clusters: 8,
            max_iterations: 300,
            tolerance: 1e-4,
            n_init: 4,
            seed: 42,
        }
    }
}

impl KMeansConfig {
    pub fn new(n_clusters: usize) -> Self {
        Self {
            n_clusters,
            ..Self::default()
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_n_init(mut self, n_init: usize) -> Self {
        self.n_init = n_init;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_clusters == 0 {
            return Err(ModelError::InvalidParameter(
                "n_clusters must be at least 1".to_string(),
            ));
        }
        if self.max_iterations == 0 || self.n_init == 0 {
            return Err(ModelError::InvalidParameter(
                "max_iterations and n_init must be at least 1".to_string(),
            ));
        }
        if !(self.tolerance.is_finite() && self.tolerance >= 0.0) {
            return Err(ModelError::InvalidParameter(format!(
                "tolerance must be finite and non-negative, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}

/// A fitted partition of the training rows.
#[derive(Debug, Clone)]
pub struct ClusterModel {
    centroids: Array2<f64>,
    labels: Vec<ClusterId>,
    inertia: f64,
    iterations: usize,
}

struct Run {
    centroids: Array2<f64>,
    labels: Vec<ClusterId>,
    inertia: f64,
    iterations: usize,
}

impl ClusterModel {
    /// Fit on a feature matrix. Fails when the matrix has fewer rows than
    /// requested clusters.
    pub fn fit(features: &Array2<f64>, config: &KMeansConfig) -> Result<Self> {
        config.validate()?;
        let samples = features.nrows();
        if samples == 0 {
            return Err(ModelError::EmptyMatrix);
        }
        if samples < config.n_clusters {
            return Err(ModelError::TooFewSamples {
                samples,
                clusters: config.n_clusters,
            });
        }

        let mut best: Option<Run> = None;
        for run in 0..config.n_init {
            let seed = config.seed.wrapping_add(run as u64);
            let result = fit_single(features.view(), config, seed);
            debug!(
                "k-means run {} (seed {}): inertia {:.6} after {} iterations",
                run, seed, result.inertia, result.iterations
            );
            // Strictly lower keeps the earliest run on ties
            let better = best
                .as_ref()
                .map(|b| result.inertia < b.inertia)
                .unwrap_or(true);
            if better {
                best = Some(result);
            }
        }

        let best = best.ok_or(ModelError::InvalidParameter(
            "n_init must be at least 1".to_string(),
        ))?;
        Ok(Self {
            centroids: best.centroids,
            labels: best.labels,
            inertia: best.inertia,
            iterations: best.iterations,
        })
    }

    /// Nearest centroid for an arbitrary vector. Never changes the partition.
    pub fn predict(&self, vector: ArrayView1<f64>) -> Result<ClusterId> {
        if vector.len() != self.centroids.ncols() {
            return Err(ModelError::DimensionMismatch {
                expected: self.centroids.ncols(),
                found: vector.len(),
            });
        }
        Ok(nearest_centroid(vector, self.centroids.view()).0)
    }

    pub fn n_clusters(&self) -> usize {
        self.centroids.nrows()
    }

    /// Cluster of every training row, aligned by row.
    pub fn labels(&self) -> &[ClusterId] {
        &self.labels
    }

    pub fn centroids(&self) -> &Array2<f64> {
        &self.centroids
    }

    /// Sum of squared distances from each row to its centroid.
    pub fn inertia(&self) -> f64 {
        self.inertia
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Rows assigned to `cluster`, ascending.
    pub fn members(&self, cluster: ClusterId) -> Vec<RowIndex> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, c)| **c == cluster)
            .map(|(row, _)| row)
            .collect()
    }

    /// Member count per cluster; empty clusters report 0.
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.n_clusters()];
        for &c in &self.labels {
            sizes[c] += 1;
        }
        sizes
    }
}

fn fit_single(features: ArrayView2<f64>, config: &KMeansConfig, seed: u64) -> Run {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut centroids = kmeans_plus_plus(features, config.n_clusters, &mut rng);
    let mut labels = assign(features, centroids.view());
    let mut iterations = 0;

    for iter in 0..config.max_iterations {
        iterations = iter + 1;
        let updated = update_centroids(features, &labels, &centroids);
        let shift: f64 = updated
            .rows()
            .into_iter()
            .zip(centroids.rows())
            .map(|(a, b)| squared_euclidean(a, b))
            .sum();
        centroids = updated;

        let next = assign(features, centroids.view());
        let unchanged = next == labels;
        labels = next;
        if shift <= config.tolerance || unchanged {
            break;
        }
    }

    let inertia = features
        .rows()
        .into_iter()
        .zip(&labels)
        .map(|(row, &c)| squared_euclidean(row, centroids.row(c)))
        .sum();

    Run {
        centroids,
        labels,
        inertia,
        iterations,
    }
}

/// k-means++ seeding: the first centroid uniformly, each next one with
/// probability proportional to its squared distance from the chosen set.
fn kmeans_plus_plus(features: ArrayView2<f64>, k: usize, rng: &mut ChaCha8Rng) -> Array2<f64> {
    let n = features.nrows();
    let mut chosen: Vec<RowIndex> = Vec::with_capacity(k);
    chosen.push(rng.gen_range(0..n));

    let mut closest: Vec<f64> = features
        .rows()
        .into_iter()
        .map(|row| squared_euclidean(row, features.row(chosen[0])))
        .collect();

    while chosen.len() < k {
        let total: f64 = closest.iter().sum();
        let next = if total <= 0.0 {
            // Every row coincides with a centroid already
            rng.gen_range(0..n)
        } else {
            let threshold = rng.r#gen::<f64>() * total;
            let mut cumulative = 0.0;
            let mut selected = n - 1;
            for (row, &d) in closest.iter().enumerate() {
                cumulative += d;
                if d > 0.0 && cumulative >= threshold {
                    selected = row;
                    break;
                }
            }
            selected
        };
        chosen.push(next);

        for (row, best) in closest.iter_mut().enumerate() {
            let d = squared_euclidean(features.row(row), features.row(next));
            if d < *best {
                *best = d;
            }
        }
    }

    let dims = features.ncols();
    Array2::from_shape_fn((k, dims), |(c, j)| features[[chosen[c], j]])
}

fn nearest_centroid(vector: ArrayView1<f64>, centroids: ArrayView2<f64>) -> (ClusterId, f64) {
    let mut best = (0, f64::INFINITY);
    for (c, centroid) in centroids.rows().into_iter().enumerate() {
        let d = squared_euclidean(vector, centroid);
        if d < best.1 {
            best = (c, d);
        }
    }
    best
}

fn assign(features: ArrayView2<f64>, centroids: ArrayView2<f64>) -> Vec<ClusterId> {
    (0..features.nrows())
        .into_par_iter()
        .map(|row| nearest_centroid(features.row(row), centroids).0)
        .collect()
}

fn update_centroids(
    features: ArrayView2<f64>,
    labels: &[ClusterId],
    previous: &Array2<f64>,
) -> Array2<f64> {
    let mut sums = Array2::<f64>::zeros(previous.raw_dim());
    let mut counts = vec![0usize; previous.nrows()];
    for (row, &c) in features.rows().into_iter().zip(labels) {
        let mut target = sums.row_mut(c);
        target += &row;
        counts[c] += 1;
    }
    for (c, count) in counts.into_iter().enumerate() {
        if count == 0 {
            sums.row_mut(c).assign(&previous.row(c));
        } else {
            sums.row_mut(c).mapv_inplace(|v| v / count as f64);
        }
    }
    sums
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn blobs() -> Array2<f64> {
        array![
            [0.9, 0.05, 0.05],
            [0.88, 0.07, 0.05],
            [0.05, 0.05, 0.9],
            [0.04, 0.06, 0.9],
            [0.1, 0.8, 0.1],
            [0.12, 0.78, 0.1],
        ]
    }

    #[test]
    fn test_fit_separates_blobs() {
        let model = ClusterModel::fit(&blobs(), &KMeansConfig::new(3)).unwrap();
        let labels = model.labels();

        assert_eq!(labels.len(), 6);
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[2], labels[3]);
        assert_eq!(labels[4], labels[5]);
        assert_ne!(labels[0], labels[2]);
        assert_ne!(labels[0], labels[4]);
        assert_ne!(labels[2], labels[4]);
        assert_eq!(model.cluster_sizes(), vec![2, 2, 2]);
    }

    #[test]
    fn test_fit_is_deterministic() {
        let config = KMeansConfig::new(2).with_seed(7);
        let a = ClusterModel::fit(&blobs(), &config).unwrap();
        let b = ClusterModel::fit(&blobs(), &config).unwrap();
        assert_eq!(a.labels(), b.labels());
        assert_eq!(a.centroids(), b.centroids());
    }

    #[test]
    fn test_predict_matches_training_labels() {
        let features = blobs();
        let model = ClusterModel::fit(&features, &KMeansConfig::new(3)).unwrap();
        for (row, &label) in model.labels().iter().enumerate() {
            assert_eq!(model.predict(features.row(row)).unwrap(), label);
        }
        // Predicting never alters the partition
        let before = model.labels().to_vec();
        model.predict(array![0.3, 0.3, 0.4].view()).unwrap();
        assert_eq!(model.labels(), before.as_slice());
    }

    #[test]
    fn test_one_cluster_per_distinct_point() {
        // Duplicated points have zero seeding weight, so k equal to the
        // number of distinct points isolates each of them
        let features = array![
            [1.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [0.0, 0.0, 1.0],
        ];
        let model = ClusterModel::fit(&features, &KMeansConfig::new(3)).unwrap();
        assert_eq!(model.inertia(), 0.0);
        assert_eq!(model.labels()[0], model.labels()[1]);
        assert_eq!(model.labels()[3], model.labels()[4]);
        let mut members: Vec<usize> = model.cluster_sizes();
        members.sort_unstable();
        assert_eq!(members, vec![1, 2, 2]);
    }

    #[test]
    fn test_too_few_samples() {
        let err = ClusterModel::fit(&blobs(), &KMeansConfig::new(8)).unwrap_err();
        assert_eq!(err, ModelError::TooFewSamples { samples: 6, clusters: 8 });
    }

    #[test]
    fn test_invalid_config() {
        assert!(ClusterModel::fit(&blobs(), &KMeansConfig::new(0)).is_err());
        assert!(ClusterModel::fit(&blobs(), &KMeansConfig::new(2).with_n_init(0)).is_err());
        assert!(ClusterModel::fit(&blobs(), &KMeansConfig::new(2).with_tolerance(f64::NAN)).is_err());
    }

    #[test]
    fn test_members() {
        let model = ClusterModel::fit(&blobs(), &KMeansConfig::new(3)).unwrap();
        let c = model.labels()[2];
        assert_eq!(model.members(c), vec![2, 3]);
    }
}
