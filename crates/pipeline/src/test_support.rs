//! Shared fixtures for unit tests.

use data_loader::{FoodRecord, FoodTable};
use models::{FeatureSpace, KMeansConfig};
use sources::{Candidate, CandidateSource, FoodCatalog};
use std::sync::Arc;

/// Rows: 0 lean protein, 1 oil, 2 rice, 3 broth (under 10 g), 4 cheese.
pub fn catalog() -> Arc<FoodCatalog> {
    let mut table = FoodTable::new();
    table.insert(FoodRecord::new("Chicken Breast", "Meat", 165.0, 40.0, 5.0, 5.0));
    table.insert(FoodRecord::new("Olive Oil", "Fat", 884.0, 0.0, 100.0, 0.0));
    table.insert(FoodRecord::new("Rice", "Grain", 130.0, 5.0, 5.0, 40.0));
    table.insert(FoodRecord::new("Broth", "Soup", 15.0, 4.0, 0.5, 0.5));
    table.insert(FoodRecord::new("Cheese", "Dairy", 400.0, 20.0, 20.0, 10.0));
    Arc::new(
        FoodCatalog::build(table, FeatureSpace::MacroRatios, &KMeansConfig::new(1)).unwrap(),
    )
}

pub fn all_candidates(catalog: &FoodCatalog) -> Vec<Candidate> {
    (0..catalog.len())
        .map(|row| Candidate::new(row, CandidateSource::Cluster, 0.0))
        .collect()
}

pub fn rows(candidates: &[Candidate]) -> Vec<usize> {
    candidates.iter().map(|c| c.row).collect()
}
