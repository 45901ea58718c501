//! Filter to avoid piling onto macros that are nearly done.
//!
//! Once most of a daily goal is consumed, foods dominated by that macro
//! would overshoot it. Only active when daily goals are known.

use crate::traits::Filter;
use anyhow::Result;
use data_loader::Macro;
use sources::{Candidate, FoodCatalog, GoalContext};
use std::sync::Arc;

/// Rejects a food when, for any macro, goal completion exceeds
/// `completion_threshold` and the food's ratio of that macro exceeds
/// `ratio_cap`.
pub struct SatisfiedMacroFilter {
    catalog: Arc<FoodCatalog>,
    completion_threshold: f64,
    ratio_cap: f64,
}

impl SatisfiedMacroFilter {
    /// # Arguments
    /// * `completion_threshold` - Completion above which a macro counts as satisfied (typically 0.5)
    /// * `ratio_cap` - Highest acceptable share of a satisfied macro (typically 0.60)
    pub fn new(catalog: Arc<FoodCatalog>, completion_threshold: f64, ratio_cap: f64) -> Self {
        Self {
            catalog,
            completion_threshold,
            ratio_cap,
        }
    }
}

impl Filter for SatisfiedMacroFilter {
    fn name(&self) -> &str {
        "SatisfiedMacroFilter"
    }

    fn apply(&self, candidates: Vec<Candidate>, context: &GoalContext) -> Result<Vec<Candidate>> {
        if context.goals.is_none() {
            return Ok(candidates);
        }

        let satisfied: Vec<Macro> = Macro::ALL
            .into_iter()
            .filter(|&m| {
                context
                    .completion(m)
                    .is_some_and(|c| c > self.completion_threshold)
            })
            .collect();
        if satisfied.is_empty() {
            return Ok(candidates);
        }

        let filtered: Vec<Candidate> = candidates
            .into_iter()
            .filter(|candidate| {
                let Some(record) = self.catalog.record(candidate.row) else {
                    return false;
                };
                let ratios = record.ratios();
                satisfied.iter().all(|&m| ratios.get(m) <= self.ratio_cap)
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

    fn goals() -> MacroTarget {
        MacroTarget::new(2000.0, 100.0, 100.0, 100.0)
    }

    #[test]
    fn test_rejects_foods_heavy_in_satisfied_macro() {
        let catalog = catalog();
        let filter = SatisfiedMacroFilter::new(catalog.clone(), 0.5, 0.6);

        // Protein 80% done: lean protein is rejected
        let context = GoalContext::new(MacroTarget::new(1000.0, 20.0, 80.0, 80.0)).with_goals(goals());
        let filtered = filter.apply(all_candidates(&catalog), &context).unwrap();
        assert_eq!(rows(&filtered), vec![1, 2, 4]);

        // Protein and fat done: the oil goes too
        let context = GoalContext::new(MacroTarget::new(1000.0, 20.0, 20.0, 80.0)).with_goals(goals());
        let filtered = filter.apply(all_candidates(&catalog), &context).unwrap();
        assert_eq!(rows(&filtered), vec![2, 4]);
    }

    #[test]
    fn test_noop_without_goals() {
        let catalog = catalog();
        let filter = SatisfiedMacroFilter::new(catalog.clone(), 0.5, 0.6);
        let context = GoalContext::new(MacroTarget::new(1000.0, 1.0, 1.0, 1.0));
        let filtered = filter.apply(all_candidates(&catalog), &context).unwrap();
        assert_eq!(filtered.len(), 5);
    }

    #[test]
    fn test_completion_at_threshold_is_not_satisfied() {
        let catalog = catalog();
        let filter = SatisfiedMacroFilter::new(catalog.clone(), 0.5, 0.6);
        let context = GoalContext::new(MacroTarget::new(1000.0, 50.0, 50.0, 50.0)).with_goals(goals());
        let filtered = filter.apply(all_candidates(&catalog), &context).unwrap();
        assert_eq!(filtered.len(), 5);
    }
}
