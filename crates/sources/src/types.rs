//! Candidate and query-context types shared by sources and the pipeline.

use data_loader::{ClusterId, Macro, MacroTarget, RowIndex};
use serde::Serialize;

// =============================================================================
// Candidates
// =============================================================================

/// Which source produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CandidateSource {
    /// Nearest neighbours of a logged food
    Neighbor,
    /// Members of the cluster predicted for a macro target
    Cluster,
}

/// Extra signals attached while generating a candidate.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CandidateMetadata {
    /// Shares the query food's category (neighbour candidates only)
    pub same_category: bool,
    pub cluster_id: Option<ClusterId>,
}

/// A food row proposed for recommendation.
///
/// Candidates refer to foods by row index only, so feature rows and
/// records stay aligned through every filter and sort.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub row: RowIndex,
    pub source: CandidateSource,
    /// Euclidean distance to the query vector in feature space
    pub distance: f64,
    pub metadata: CandidateMetadata,
}

impl Candidate {
    pub fn new(row: RowIndex, source: CandidateSource, distance: f64) -> Self {
        Self {
            row,
            source,
            distance,
            metadata: CandidateMetadata::default(),
        }
    }
}

// =============================================================================
// Goal Context
// =============================================================================

/// Everything a goal-aligned query knows about the user.
#[derive(Debug, Clone, PartialEq)]
pub struct GoalContext {
    /// Budget left for today
    pub remaining: MacroTarget,
    /// Full daily goals, when the caller supplied them
    pub goals: Option<MacroTarget>,
}

impl GoalContext {
    pub fn new(remaining: MacroTarget) -> Self {
        Self {
            remaining,
            goals: None,
        }
    }

    pub fn with_goals(mut self, goals: MacroTarget) -> Self {
        self.goals = Some(goals);
        self
    }

    /// Fraction of the daily goal already consumed for a macro:
    /// `1 - remaining / goal`.
    ///
    /// `None` without goals. A non-positive goal counts as 0 completion.
    pub fn completion(&self, m: Macro) -> Option<f64> {
        let goal = self.goals?.grams(m);
        if goal <= 0.0 {
            return Some(0.0);
        }
        Some(1.0 - self.remaining.grams(m) / goal)
    }

    /// Total remaining protein + fat + carbohydrate grams.
    pub fn total_remaining_g(&self) -> f64 {
        self.remaining.total_macros_g()
    }
}
