//! Cluster Source - foods sharing the cluster of a macro target
//!
//! The remaining budget is turned into a target vector with the frozen
//! scaler, the cluster model predicts its cluster, and every member of
//! that cluster becomes a candidate carrying its distance to the target.

use crate::catalog::FoodCatalog;
use crate::types::{Candidate, CandidateSource};
use data_loader::{ClusterId, MacroTarget};
use models::euclidean;
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Candidates for one target, with the cluster they were drawn from.
#[derive(Debug, Clone)]
pub struct ClusterCandidates {
    pub cluster: ClusterId,
    pub candidates: Vec<Candidate>,
}

#[derive(Clone)]
pub struct ClusterSource {
    catalog: Arc<FoodCatalog>,
}

impl ClusterSource {
    pub fn new(catalog: Arc<FoodCatalog>) -> Self {
        Self { catalog }
    }

    /// Members of the predicted cluster in table order.
    ///
    /// Returns `None` when the target cannot be placed (zero macro total
    /// or a model failure).
    #[instrument(skip(self))]
    pub fn get_candidates(&self, target: &MacroTarget) -> Option<ClusterCandidates> {
        if target.total_macros_g() <= 0.0 {
            return None;
        }
        let vector = self.catalog.target_vector(target);
        let cluster = match self.catalog.clusters().predict(vector.view()) {
            Ok(cluster) => cluster,
            Err(e) => {
                warn!("Cluster prediction failed: {}", e);
                return None;
            }
        };

        let candidates: Vec<Candidate> = self
            .catalog
            .cluster_members(cluster)
            .into_par_iter()
            .filter_map(|row| {
                let features = self.catalog.feature_row(row)?;
                let mut candidate = Candidate::new(
                    row,
                    CandidateSource::Cluster,
                    euclidean(features, vector.view()),
                );
                candidate.metadata.cluster_id = Some(cluster);
                Some(candidate)
            })
            .collect();

        debug!(
            "Target ratios {:?} map to cluster {} with {} members",
            target.ratios().to_array(),
            cluster,
            candidates.len()
        );
        Some(ClusterCandidates {
            cluster,
            candidates,
        })
    }
}
