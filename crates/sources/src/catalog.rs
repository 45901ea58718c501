//! FoodCatalog: the trained, read-only state behind every query.
//!
//! The catalog owns the cleaned table (with cluster ids stored on each
//! record), the feature matrix aligned with it, the fitted scaler and both
//! models. Every accessor works in row indices; nothing here reorders rows.

use data_loader::{ClusterId, FoodRecord, FoodTable, MacroTarget, MatchKind, RowIndex};
use models::{ClusterModel, FeatureSpace, FittedScaler, KMeansConfig, ModelError, NeighborIndex};
use ndarray::{Array1, Array2, ArrayView1};
use std::time::Instant;
use tracing::{debug, info};

/// Per-cluster summary for reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterSummary {
    pub cluster: ClusterId,
    pub size: usize,
    pub centroid: Vec<f64>,
    /// Mean protein/fat/carbs ratios of the members
    pub mean_ratios: [f64; 3],
}

#[derive(Debug)]
pub struct FoodCatalog {
    table: FoodTable,
    features: Array2<f64>,
    scaler: FittedScaler,
    clusters: ClusterModel,
    neighbors: NeighborIndex,
}

impl FoodCatalog {
    /// Fit the scaler, transform the table, then fit both models on the
    /// resulting matrix.
    pub fn build(
        mut table: FoodTable,
        space: FeatureSpace,
        kmeans: &KMeansConfig,
    ) -> models::Result<Self> {
        let start = Instant::now();

        let scaler = FittedScaler::fit(space, table.records())?;
        let features = scaler.transform_records(table.records());
        info!(
            "Feature matrix shape: {} x {} ({})",
            features.nrows(),
            features.ncols(),
            space.label()
        );

        let clusters = ClusterModel::fit(&features, kmeans)?;
        table
            .assign_clusters(clusters.labels())
            .map_err(|e| ModelError::InvalidParameter(e.to_string()))?;
        info!(
            "k-means ({} clusters) converged in {} iterations, inertia {:.6}",
            clusters.n_clusters(),
            clusters.iterations(),
            clusters.inertia()
        );
        debug!("Cluster distribution: {:?}", clusters.cluster_sizes());

        let neighbors = NeighborIndex::fit(&features)?;

        info!(
            "Catalog of {} foods ready in {:.2?}",
            table.len(),
            start.elapsed()
        );
        Ok(Self {
            table,
            features,
            scaler,
            clusters,
            neighbors,
        })
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn table(&self) -> &FoodTable {
        &self.table
    }

    pub fn record(&self, row: RowIndex) -> Option<&FoodRecord> {
        self.table.get(row)
    }

    pub fn records(&self) -> &[FoodRecord] {
        self.table.records()
    }

    pub fn features(&self) -> &Array2<f64> {
        &self.features
    }

    pub fn feature_row(&self, row: RowIndex) -> Option<ArrayView1<'_, f64>> {
        (row < self.features.nrows()).then(|| self.features.row(row))
    }

    pub fn scaler(&self) -> &FittedScaler {
        &self.scaler
    }

    pub fn clusters(&self) -> &ClusterModel {
        &self.clusters
    }

    pub fn neighbors(&self) -> &NeighborIndex {
        &self.neighbors
    }

    /// Resolve a food name to its row (exact, then substring).
    pub fn resolve_name(&self, name: &str) -> Option<(RowIndex, MatchKind)> {
        self.table.resolve_name(name)
    }

    /// Feature vector of a macro target under the frozen scaler.
    pub fn target_vector(&self, target: &MacroTarget) -> Array1<f64> {
        self.scaler.transform_target(target)
    }

    pub fn cluster_of(&self, row: RowIndex) -> Option<ClusterId> {
        self.clusters.labels().get(row).copied()
    }

    /// Rows of a cluster in table order.
    pub fn cluster_members(&self, cluster: ClusterId) -> Vec<RowIndex> {
        self.clusters.members(cluster)
    }

    /// Size, centroid and mean macro ratios of every cluster.
    pub fn cluster_summaries(&self) -> Vec<ClusterSummary> {
        let sizes = self.clusters.cluster_sizes();
        (0..self.clusters.n_clusters())
            .map(|cluster| {
                let members = self.cluster_members(cluster);
                let mut mean_ratios = [0.0; 3];
                for &row in &members {
                    let ratios = self.records()[row].ratios().to_array();
                    for (acc, v) in mean_ratios.iter_mut().zip(ratios) {
                        *acc += v;
                    }
                }
                if !members.is_empty() {
                    for acc in mean_ratios.iter_mut() {
                        *acc /= members.len() as f64;
                    }
                }
                ClusterSummary {
                    cluster,
                    size: sizes[cluster],
                    centroid: self.clusters.centroids().row(cluster).to_vec(),
                    mean_ratios,
                }
            })
            .collect()
    }
}
