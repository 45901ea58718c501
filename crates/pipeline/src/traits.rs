//! Core traits for the filtering pipeline.
//!
//! This module defines the Filter trait that allows composable,
//! extensible filters to be applied to candidate sets.

use anyhow::Result;
use sources::{Candidate, GoalContext};

/// Core trait for filtering candidates.
///
/// Filters take ownership of the candidates and return the ones they keep,
/// in the order they received them.
pub trait Filter: Send + Sync {
    /// Returns the name of this filter (for logging/debugging)
    fn name(&self) -> &str;

    /// Apply this filter to a set of candidates.
    ///
    /// # Arguments
    /// * `candidates` - The candidates to filter (takes ownership)
    /// * `context` - Remaining budget and optional daily goals
    fn apply(&self, candidates: Vec<Candidate>, context: &GoalContext) -> Result<Vec<Candidate>>;
}
