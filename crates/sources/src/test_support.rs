//! Shared fixtures for unit tests.

use crate::catalog::FoodCatalog;
use data_loader::{FoodRecord, FoodTable};
use models::{FeatureSpace, KMeansConfig};
use std::sync::Arc;

/// Two meats, two fruits and an oil.
pub fn sample_table() -> FoodTable {
    let mut table = FoodTable::new();
    table.insert(FoodRecord::new("Chicken Breast", "Meat", 165.0, 31.0, 3.6, 0.0));
    table.insert(FoodRecord::new("Turkey Breast", "Meat", 135.0, 30.0, 0.5, 0.0));
    table.insert(FoodRecord::new("Apple", "Fruit", 52.0, 0.3, 0.2, 14.0));
    table.insert(FoodRecord::new("Banana", "Fruit", 89.0, 1.1, 0.3, 23.0));
    table.insert(FoodRecord::new("Olive Oil", "Fat", 884.0, 0.0, 100.0, 0.0));
    table
}

pub fn sample_catalog() -> Arc<FoodCatalog> {
    Arc::new(
        FoodCatalog::build(sample_table(), FeatureSpace::MacroRatios, &KMeansConfig::new(3))
            .unwrap(),
    )
}
