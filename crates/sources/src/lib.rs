//! # Sources Crate
//!
//! Trained catalog state and candidate generation for food recommendations.
//!
//! ## Components
//!
//! ### FoodCatalog
//! Records, feature matrix, fitted scaler, cluster model and neighbour
//! index, all aligned by row index and read-only once built.
//!
//! ### Neighbor Source
//! "Foods like the one you just logged":
//! - Over-fetches nearest neighbours of a food's feature vector
//! - Drops the food itself, ranks same-category foods first
//!
//! ### Cluster Source
//! "Foods that fit what you have left":
//! - Maps the remaining budget to a cluster
//! - Returns every member with its distance to the target
//!
//! ### Meal Log
//! Daily goals, logged portions and the remaining budget.
//!
//! ## Example Usage
//!
//! ```ignore
//! use sources::{ClusterSource, FoodCatalog, NeighborSource};
//! use models::{FeatureSpace, KMeansConfig};
//! use std::sync::Arc;
//!
//! let catalog = Arc::new(FoodCatalog::build(table, FeatureSpace::MacroRatios, &KMeansConfig::new(8))?);
//!
//! let neighbors = NeighborSource::new(catalog.clone());
//! let clusters = ClusterSource::new(catalog.clone());
//!
//! let similar = neighbors.get_candidates(row, 5);
//! let aligned = clusters.get_candidates(&remaining);
//! ```

// Public modules
pub mod types;
pub mod catalog;
pub mod neighbor;
pub mod cluster;
pub mod meal_log;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use types::{Candidate, CandidateMetadata, CandidateSource, GoalContext};
pub use catalog::{ClusterSummary, FoodCatalog};
pub use neighbor::NeighborSource;
pub use cluster::{ClusterCandidates, ClusterSource};
pub use meal_log::{DailyGoals, DailyProgress, LoggedMeal, MacroProgress, MealLog};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_catalog;

    #[test]
    fn test_sources_share_catalog() {
        let catalog = sample_catalog();
        let _neighbors = NeighborSource::new(catalog.clone());
        let _clusters = ClusterSource::new(catalog.clone());
        // Catalog plus the two sources
        assert_eq!(std::sync::Arc::strong_count(&catalog), 3);
    }
}
