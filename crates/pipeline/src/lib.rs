//! Filtering and scoring of goal-aligned food candidates.
//!
//! This crate provides:
//! - Filter trait and implementations for candidate filtering
//! - FilterPipeline for composing filters
//! - GoalScorer and `select` for ranking the survivors
//!
//! ## Architecture
//! A goal-aligned query processes cluster candidates in stages:
//! 1. MacroDensityFilter drops near-empty foods (the scored set)
//! 2. Satisfied/scarce macro filters pick the suitable subset
//! 3. GoalScorer ranks the scored set by distance and contribution
//! 4. `select` returns the best suitable rows, or the best rows overall
//!    when too few are suitable
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::filters::*;
//! use pipeline::{select, FilterPipeline, GoalScorer};
//!
//! let dense = MacroDensityFilter::new(catalog.clone(), 10.0).apply(candidates, &context)?;
//!
//! let suitability = FilterPipeline::new()
//!     .add_filter(SatisfiedMacroFilter::new(catalog.clone(), 0.5, 0.6))
//!     .add_filter(ScarceMacroFilter::new(catalog.clone(), 10.0, 0.5));
//! let suitable = suitability.apply(dense.clone(), &context)?;
//!
//! let scored = GoalScorer::new(catalog.clone()).score(&dense, &context);
//! let rows = suitable.iter().map(|c| c.row).collect();
//! let top = select(scored, &rows, 5);
//! ```

pub mod traits;
pub mod filters;
pub mod filter_pipeline;
pub mod scoring;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export main types
pub use traits::Filter;
pub use filter_pipeline::FilterPipeline;
pub use scoring::{select, GoalScorer, ScoredCandidate};
