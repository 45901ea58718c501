//! Goal scoring and final selection for goal-aligned queries.
//!
//! Each candidate is scored on two axes:
//! - distance to the target vector in feature space (lower is better)
//! - contribution: grams of each macro weighted by that macro's share of
//!   the remaining budget (higher is better)
//!
//! Both axes are divided by their maximum over the candidate set, then
//! combined as `distance_weight * nd + contribution_weight * (1 - nc)`.
//! Lower combined scores rank first.

use data_loader::{Macro, RowIndex};
use rayon::prelude::*;
use serde::Serialize;
use sources::{Candidate, FoodCatalog, GoalContext};
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    /// Raw weighted grams towards the remaining budget
    pub contribution: f64,
    pub distance_norm: f64,
    pub contribution_norm: f64,
    pub score: f64,
}

impl ScoredCandidate {
    pub fn row(&self) -> RowIndex {
        self.candidate.row
    }
}

pub struct GoalScorer {
    catalog: Arc<FoodCatalog>,
    distance_weight: f64,
    contribution_weight: f64,
}

impl GoalScorer {
    pub fn new(catalog: Arc<FoodCatalog>) -> Self {
        Self {
            catalog,
            distance_weight: 0.4,
            contribution_weight: 0.6,
        }
    }

    /// Override the axis weights (defaults: 0.4 distance, 0.6 contribution)
    pub fn with_weights(mut self, distance_weight: f64, contribution_weight: f64) -> Self {
        self.distance_weight = distance_weight;
        self.contribution_weight = contribution_weight;
        self
    }

    /// Weighted grams a food brings towards the remaining budget.
    fn contribution(&self, row: RowIndex, context: &GoalContext) -> f64 {
        let total = context.total_remaining_g();
        let Some(record) = self.catalog.record(row) else {
            return 0.0;
        };
        if total <= 0.0 {
            return 0.0;
        }
        Macro::ALL
            .iter()
            .map(|&m| record.grams(m) * (context.remaining.grams(m) / total))
            .sum()
    }

    /// Score every candidate and sort ascending by combined score, ties by
    /// row index.
    pub fn score(&self, candidates: &[Candidate], context: &GoalContext) -> Vec<ScoredCandidate> {
        let contributions: Vec<f64> = candidates
            .par_iter()
            .map(|c| self.contribution(c.row, context))
            .collect();

        let max_distance = candidates.iter().map(|c| c.distance).fold(0.0, f64::max);
        let max_contribution = contributions.iter().copied().fold(0.0, f64::max);

        let mut scored: Vec<ScoredCandidate> = candidates
            .iter()
            .zip(contributions)
            .map(|(candidate, contribution)| {
                let distance_norm = if max_distance > 0.0 {
                    candidate.distance / max_distance
                } else {
                    candidate.distance
                };
                let contribution_norm = if max_contribution > 0.0 {
                    contribution / max_contribution
                } else {
                    contribution
                };
                let score = self.distance_weight * distance_norm
                    + self.contribution_weight * (1.0 - contribution_norm);
                ScoredCandidate {
                    candidate: candidate.clone(),
                    contribution,
                    distance_norm,
                    contribution_norm,
                    score,
                }
            })
            .collect();

        scored.sort_by(|a, b| a.score.total_cmp(&b.score).then_with(|| a.row().cmp(&b.row())));
        scored
    }
}

/// Pick the final `n` rows from a score-sorted list.
///
/// When at least `n` of the scored rows are in `suitable`, the best `n`
/// suitable rows win. Otherwise the best `n` of all scored rows are
/// returned, suitable or not.
pub fn select(
    scored: Vec<ScoredCandidate>,
    suitable: &HashSet<RowIndex>,
    n: usize,
) -> Vec<ScoredCandidate> {
    let suitable_count = scored.iter().filter(|s| suitable.contains(&s.row())).count();
    if suitable_count >= n {
        scored
            .into_iter()
            .filter(|s| suitable.contains(&s.row()))
            .take(n)
            .collect()
    } else {
        scored.into_iter().take(n).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::catalog;
    use data_loader::MacroTarget;
    use sources::CandidateSource;

    fn candidates() -> Vec<Candidate> {
        vec![
            Candidate::new(0, CandidateSource::Cluster, 0.0),
            Candidate::new(2, CandidateSource::Cluster, 0.5),
            Candidate::new(4, CandidateSource::Cluster, 0.25),
        ]
    }

    fn protein_context() -> GoalContext {
        GoalContext::new(MacroTarget::new(500.0, 80.0, 10.0, 10.0))
    }

    fn rows(scored: &[ScoredCandidate]) -> Vec<usize> {
        scored.iter().map(|s| s.row()).collect()
    }

    #[test]
    fn test_scores_combine_both_axes() {
        let scorer = GoalScorer::new(catalog());
        let scored = scorer.score(&candidates(), &protein_context());

        assert_eq!(rows(&scored), vec![0, 4, 2]);
        // Chicken: closest and the largest contribution
        assert!(scored[0].score.abs() < 1e-12);
        assert!((scored[0].contribution - 33.0).abs() < 1e-9);
        // Cheese: 0.4 * 0.5 + 0.6 * (1 - 19/33)
        assert!((scored[1].score - (0.2 + 0.6 * (14.0 / 33.0))).abs() < 1e-9);
        // Rice: 0.4 * 1 + 0.6 * (1 - 8.5/33)
        assert!((scored[2].score - (0.4 + 0.6 * (24.5 / 33.0))).abs() < 1e-9);
    }

    #[test]
    fn test_zero_max_distance_skips_normalization() {
        let scorer = GoalScorer::new(catalog());
        let candidates: Vec<Candidate> = [2, 0]
            .into_iter()
            .map(|row| Candidate::new(row, CandidateSource::Cluster, 0.0))
            .collect();
        let scored = scorer.score(&candidates, &protein_context());
        assert_eq!(rows(&scored), vec![0, 2]);
        assert!(scored.iter().all(|s| s.distance_norm == 0.0));
    }

    #[test]
    fn test_equal_scores_break_by_row() {
        let scorer = GoalScorer::new(catalog()).with_weights(1.0, 0.0);
        let candidates = vec![
            Candidate::new(4, CandidateSource::Cluster, 0.3),
            Candidate::new(1, CandidateSource::Cluster, 0.3),
        ];
        let scored = scorer.score(&candidates, &protein_context());
        assert_eq!(rows(&scored), vec![1, 4]);
    }

    #[test]
    fn test_select_prefers_suitable_rows() {
        let scored = GoalScorer::new(catalog()).score(&candidates(), &protein_context());
        let suitable: HashSet<usize> = [2, 4].into_iter().collect();

        let selected = select(scored, &suitable, 2);
        assert_eq!(rows(&selected), vec![4, 2]);
    }

    #[test]
    fn test_select_falls_back_to_all_scored() {
        let scored = GoalScorer::new(catalog()).score(&candidates(), &protein_context());
        let suitable: HashSet<usize> = [2, 4].into_iter().collect();

        let selected = select(scored, &suitable, 3);
        assert_eq!(rows(&selected), vec![0, 4, 2]);
    }

    #[test]
    fn test_select_zero() {
        let scored = GoalScorer::new(catalog()).score(&candidates(), &protein_context());
        assert!(select(scored, &HashSet::new(), 0).is_empty());
    }
}
