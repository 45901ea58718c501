//! Filter to drop foods with too little macro content.
//!
//! Foods such as broths, herbs or drinks carry almost no protein, fat or
//! carbohydrate per 100 g and contribute nothing towards a budget.

use crate::traits::Filter;
use anyhow::Result;
use sources::{Candidate, FoodCatalog, GoalContext};
use std::sync::Arc;

/// Keeps candidates whose protein + fat + carbohydrate grams per 100 g
/// reach `min_total_g`.
pub struct MacroDensityFilter {
    catalog: Arc<FoodCatalog>,
    min_total_g: f64,
}

impl MacroDensityFilter {
    pub fn new(catalog: Arc<FoodCatalog>, min_total_g: f64) -> Self {
        Self {
            catalog,
            min_total_g,
        }
    }
}

impl Filter for MacroDensityFilter {
    fn name(&self) -> &str {
        "MacroDensityFilter"
    }

    fn apply(&self, candidates: Vec<Candidate>, _context: &GoalContext) -> Result<Vec<Candidate>> {
        let filtered: Vec<Candidate> = candidates
            .into_iter()
            .filter(|candidate| {
                self.catalog
                    .record(candidate.row)
                    .is_some_and(|r| r.total_macros_g() >= self.min_total_g)
            })
            .collect();

        Ok(filtered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{all_candidates, catalog, rows};
    use data_loader::MacroTarget;

    #[test]
    fn test_macro_density_filter() {
        let catalog = catalog();
        let filter = MacroDensityFilter::new(catalog.clone(), 10.0);
        let context = GoalContext::new(MacroTarget::new(500.0, 50.0, 20.0, 100.0));

        let filtered = filter.apply(all_candidates(&catalog), &context).unwrap();
        // Broth (5 g total) is dropped
        assert_eq!(rows(&filtered), vec![0, 1, 2, 4]);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let catalog = catalog();
        // Chicken has exactly 50 g
        let filter = MacroDensityFilter::new(catalog.clone(), 50.0);
        let context = GoalContext::new(MacroTarget::default());
        let filtered = filter.apply(all_candidates(&catalog), &context).unwrap();
        assert_eq!(rows(&filtered), vec![0, 1, 2, 4]);

        let filter = MacroDensityFilter::new(catalog.clone(), 50.5);
        let filtered = filter.apply(all_candidates(&catalog), &context).unwrap();
        assert_eq!(rows(&filtered), vec![1]);
    }
}
