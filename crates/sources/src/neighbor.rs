//! Neighbor Source - similar foods for a logged food
//!
//! ## Algorithm
//! 1. Take the query row's feature vector
//! 2. Over-fetch `overfetch_factor * n + 1` nearest rows
//! 3. Drop the query row itself
//! 4. Re-rank: same category first, then ascending distance, then row
//!
//! The caller truncates to `n`.

use crate::catalog::FoodCatalog;
use crate::types::{Candidate, CandidateSource};
use data_loader::RowIndex;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

#[derive(Clone)]
pub struct NeighborSource {
    catalog: Arc<FoodCatalog>,
    overfetch_factor: usize,
}

impl NeighborSource {
    pub fn new(catalog: Arc<FoodCatalog>) -> Self {
        Self {
            catalog,
            overfetch_factor: 3,
        }
    }

    /// Configure how many neighbours are fetched per requested result (default: 3)
    pub fn with_overfetch_factor(mut self, factor: usize) -> Self {
        self.overfetch_factor = factor.max(1);
        self
    }

    /// Neighbour candidates for `query_row`, re-ranked, never containing
    /// the query row.
    #[instrument(skip(self))]
    pub fn get_candidates(&self, query_row: RowIndex, n: usize) -> Vec<Candidate> {
        if n == 0 {
            return Vec::new();
        }
        let (Some(vector), Some(query)) = (
            self.catalog.feature_row(query_row),
            self.catalog.record(query_row),
        ) else {
            return Vec::new();
        };

        let k = self.overfetch_factor.saturating_mul(n).saturating_add(1);
        let hits = match self.catalog.neighbors().query(vector, k) {
            Ok(hits) => hits,
            Err(e) => {
                warn!("Neighbour query failed for row {}: {}", query_row, e);
                return Vec::new();
            }
        };

        let mut candidates: Vec<Candidate> = hits
            .into_iter()
            .filter(|hit| hit.row != query_row)
            .map(|hit| {
                let mut candidate = Candidate::new(hit.row, CandidateSource::Neighbor, hit.distance);
                candidate.metadata.same_category = self
                    .catalog
                    .record(hit.row)
                    .is_some_and(|r| r.category == query.category);
                candidate.metadata.cluster_id = self.catalog.cluster_of(hit.row);
                candidate
            })
            .collect();

        candidates.sort_by(|a, b| {
            b.metadata
                .same_category
                .cmp(&a.metadata.same_category)
                .then_with(|| a.distance.total_cmp(&b.distance))
                .then_with(|| a.row.cmp(&b.row))
        });

        debug!(
            "Generated {} neighbour candidates for '{}' ({} same category)",
            candidates.len(),
            query.name,
            candidates.iter().filter(|c| c.metadata.same_category).count()
        );
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_catalog;

    #[test]
    fn test_excludes_query_row() {
        let source = NeighborSource::new(sample_catalog());
        let candidates = source.get_candidates(0, 10);
        assert_eq!(candidates.len(), 4);
        assert!(candidates.iter().all(|c| c.row != 0));
    }

    #[test]
    fn test_same_category_first() {
        let source = NeighborSource::new(sample_catalog());
        // Apple: Banana is both the same category and the closest
        let candidates = source.get_candidates(2, 1);
        assert_eq!(candidates[0].row, 3);
        assert!(candidates[0].metadata.same_category);

        // Olive Oil has no same-category peers; plain distance order
        let candidates = source.get_candidates(4, 2);
        assert!(candidates.iter().all(|c| !c.metadata.same_category));
        assert!(candidates.windows(2).all(|w| w[0].distance <= w[1].distance));
    }

    #[test]
    fn test_overfetch_bounds_candidate_count() {
        let source = NeighborSource::new(sample_catalog()).with_overfetch_factor(1);
        // k = 1 * 1 + 1 = 2 neighbours, minus the query row
        assert_eq!(source.get_candidates(0, 1).len(), 1);
    }

    #[test]
    fn test_zero_n_and_unknown_row() {
        let source = NeighborSource::new(sample_catalog());
        assert!(source.get_candidates(0, 0).is_empty());
        assert!(source.get_candidates(99, 3).is_empty());
    }
}
