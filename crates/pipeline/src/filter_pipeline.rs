//! The FilterPipeline orchestrates multiple filters.
//!
//! This module provides the main FilterPipeline struct that chains
//! multiple filters together using the builder pattern.

use crate::traits::Filter;
use anyhow::{Context, Result};
use sources::{Candidate, GoalContext};
use tracing;

/// Chains multiple filters together into a processing pipeline.
///
/// ## Usage
/// ```ignore
/// let pipeline = FilterPipeline::new()
///     .add_filter(SatisfiedMacroFilter::new(catalog.clone(), 0.5, 0.6))
///     .add_filter(ScarceMacroFilter::new(catalog.clone(), 10.0, 0.5));
///
/// let suitable = pipeline.apply(candidates, &context)?;
/// ```
pub struct FilterPipeline {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterPipeline {
    /// Create a new empty FilterPipeline.
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// Add a filter to the pipeline (builder pattern).
    pub fn add_filter(mut self, filter: impl Filter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Apply all filters in sequence, logging input and output counts.
    pub fn apply(&self, candidates: Vec<Candidate>, context: &GoalContext) -> Result<Vec<Candidate>> {
        let mut current = candidates;
        for filter in &self.filters {
            tracing::debug!(
                "Applying filter: {} (input count: {})",
                filter.name(),
                current.len()
            );
            current = filter
                .apply(current, context)
                .with_context(|| format!("{} failed", filter.name()))?;
            tracing::debug!(
                "Filter applied: {} (output count: {})",
                filter.name(),
                current.len()
            );
        }
        Ok(current)
    }
}

impl Default for FilterPipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::MacroTarget;
    use sources::CandidateSource;

    struct EvenRows;

    impl Filter for EvenRows {
        fn name(&self) -> &str {
            "EvenRows"
        }

        fn apply(&self, candidates: Vec<Candidate>, _context: &GoalContext) -> Result<Vec<Candidate>> {
            Ok(candidates.into_iter().filter(|c| c.row % 2 == 0).collect())
        }
    }

    struct Failing;

    impl Filter for Failing {
        fn name(&self) -> &str {
            "Failing"
        }

        fn apply(&self, _candidates: Vec<Candidate>, _context: &GoalContext) -> Result<Vec<Candidate>> {
            anyhow::bail!("boom")
        }
    }

    fn candidates() -> Vec<Candidate> {
        (0..5)
            .map(|row| Candidate::new(row, CandidateSource::Cluster, row as f64))
            .collect()
    }

    #[test]
    fn test_empty_pipeline() {
        let pipeline = FilterPipeline::new();
        let context = GoalContext::new(MacroTarget::new(500.0, 50.0, 20.0, 100.0));
        let filtered = pipeline.apply(candidates(), &context).unwrap();
        assert_eq!(filtered.len(), 5);
        assert!(pipeline.is_empty());
    }

    #[test]
    fn test_single_filter_keeps_order() {
        let pipeline = FilterPipeline::new().add_filter(EvenRows);
        let context = GoalContext::new(MacroTarget::new(500.0, 50.0, 20.0, 100.0));
        let rows: Vec<usize> = pipeline
            .apply(candidates(), &context)
            .unwrap()
            .iter()
            .map(|c| c.row)
            .collect();
        assert_eq!(rows, vec![0, 2, 4]);
    }

    #[test]
    fn test_error_names_failing_filter() {
        let pipeline = FilterPipeline::new().add_filter(EvenRows).add_filter(Failing);
        let context = GoalContext::new(MacroTarget::default());
        let err = pipeline.apply(candidates(), &context).unwrap_err();
        assert!(err.to_string().contains("Failing"));
    }
}
