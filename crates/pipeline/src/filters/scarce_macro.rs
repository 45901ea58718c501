//! Filter to avoid foods built around a macro with almost no budget left.
//!
//! Only active when daily goals are known.

use crate::traits::Filter;
use anyhow::Result;
use data_loader::Macro;
use sources::{Candidate, FoodCatalog, GoalContext};
use std::sync::Arc;

/// Rejects a food when, for any macro, fewer than `min_remaining_g` grams
/// remain and the food's ratio of that macro exceeds `ratio_cap`.
pub struct ScarceMacroFilter {
    catalog: Arc<FoodCatalog>,
    min_remaining_g: f64,
    ratio_cap: f64,
}

impl ScarceMacroFilter {
    pub fn new(catalog: Arc<FoodCatalog>, min_remaining_g: f64, ratio_cap: f64) -> Self {
        Self {
            catalog,
            min_remaining_g,
            ratio_cap,
        }
    }
}

impl Filter for ScarceMacroFilter {
    fn name(&self) -> &str {
        "ScarceMacroFilter"
    }

    fn apply(&self, candidates: Vec<Candidate>, context: &GoalContext) -> Result<Vec<Candidate>> {
        if context.goals.is_none() {
            return Ok(candidates);
        }

        let scarce: Vec<Macro> = Macro::ALL
            .into_iter()
            .filter(|&m| context.remaining.grams(m) < self.min_remaining_g)
            .collect();
        if scarce.is_empty() {
            return Ok(candidates);
        }

        let filtered: Vec<Candidate> = candidates
            .into_iter()
            .filter(|candidate| {
                self.catalog.record(candidate.row).is_some_and(|record| {
                    let ratios = record.ratios();
                    scarce.iter().all(|&m| ratios.get(m) <= self.ratio_cap)
                })
            })
            .collect();

        Ok(filtered)
    }
}
