//! # Recommendation Engine
//!
//! Owns the trained catalog and answers the two queries:
//!
//! **Similar foods**
//! 1. Resolve the name (exact, then substring)
//! 2. Over-fetch nearest neighbours, drop the food itself
//! 3. Same category first, then distance; truncate to `n`
//!
//! **Goal-aligned foods**
//! 1. Map the remaining budget to a cluster
//! 2. Drop near-empty foods (the scored set)
//! 3. With daily goals, mark suitable foods (satisfied/scarce macros)
//! 4. Score by distance and contribution
//! 5. Best `n` suitable foods, or best `n` overall when too few are suitable
//!
//! Queries are pure reads over immutable state. The engine is `Send +
//! Sync` and meant to be shared behind an `Arc`.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use data_loader::{FoodRecord, FoodTable, MacroTarget, MatchKind, RowIndex};
use models::FeatureSpace;
use pipeline::filters::{MacroDensityFilter, SatisfiedMacroFilter, ScarceMacroFilter};
use pipeline::{select, Filter, FilterPipeline, GoalScorer, ScoredCandidate};
use sources::{
    Candidate, CandidateSource, ClusterSource, ClusterSummary, FoodCatalog, GoalContext,
    NeighborSource,
};

use crate::config::EngineConfig;
use crate::error::Result;

/// One recommended food.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoodRecommendation {
    pub row: RowIndex,
    /// The full record, including its cluster id
    pub food: FoodRecord,
    /// Distance for similar foods, combined score for goal-aligned foods;
    /// lower is better in both cases
    pub score: f64,
    pub source: CandidateSource,
    pub explanation: String,
}

/// Dataset and model statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineStats {
    pub foods: usize,
    pub categories: usize,
    pub dropped_rows: usize,
    pub clusters: usize,
    pub feature_space: FeatureSpace,
}

pub struct RecommendationEngine {
    catalog: Arc<FoodCatalog>,
    config: EngineConfig,
    neighbors: NeighborSource,
    clusters: ClusterSource,
    density_filter: MacroDensityFilter,
    suitability: FilterPipeline,
    scorer: GoalScorer,
}

impl RecommendationEngine {
    /// Load the dataset at `path` and train every model.
    pub fn new(path: &Path, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let table = FoodTable::load_from_file(path)?;
        Self::from_table(table, config)
    }

    /// Train every model on an already loaded table.
    pub fn from_table(table: FoodTable, config: EngineConfig) -> Result<Self> {
        let start = Instant::now();
        config.validate()?;

        let catalog = Arc::new(FoodCatalog::build(
            table,
            config.feature_space,
            &config.kmeans(),
        )?);

        let neighbors =
            NeighborSource::new(catalog.clone()).with_overfetch_factor(config.overfetch_factor);
        let clusters = ClusterSource::new(catalog.clone());
        let density_filter = MacroDensityFilter::new(catalog.clone(), config.min_macro_density_g);
        let suitability = FilterPipeline::new()
            .add_filter(SatisfiedMacroFilter::new(
                catalog.clone(),
                config.satisfied_completion,
                config.satisfied_ratio_cap,
            ))
            .add_filter(ScarceMacroFilter::new(
                catalog.clone(),
                config.scarce_remaining_g,
                config.scarce_ratio_cap,
            ));
        let scorer = GoalScorer::new(catalog.clone())
            .with_weights(config.distance_weight, config.contribution_weight);

        info!(
            "Recommendation engine ready: {} foods, {} clusters, built in {:.2?}",
            catalog.len(),
            config.n_clusters,
            start.elapsed()
        );

        Ok(Self {
            catalog,
            config,
            neighbors,
            clusters,
            density_filter,
            suitability,
            scorer,
        })
    }

    pub fn catalog(&self) -> &Arc<FoodCatalog> {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn stats(&self) -> EngineStats {
        let (foods, categories, dropped_rows) = self.catalog.table().counts();
        EngineStats {
            foods,
            categories,
            dropped_rows,
            clusters: self.catalog.clusters().n_clusters(),
            feature_space: self.config.feature_space,
        }
    }

    /// Foods with a macro profile close to `food_name`'s.
    ///
    /// An unknown name yields an empty list. The named food is never part
    /// of its own result.
    #[instrument(skip(self))]
    pub fn similar_foods(&self, food_name: &str, n: usize) -> Vec<FoodRecommendation> {
        let start = Instant::now();
        if n == 0 {
            return Vec::new();
        }
        let Some((row, kind)) = self.catalog.resolve_name(food_name) else {
            info!("No food matches '{}'", food_name);
            return Vec::new();
        };
        if kind != MatchKind::Exact {
            debug!("'{}' resolved by substring to row {}", food_name, row);
        }

        let mut candidates = self.neighbors.get_candidates(row, n);
        candidates.truncate(n);

        let recommendations: Vec<FoodRecommendation> = candidates
            .iter()
            .filter_map(|c| self.similar_recommendation(c))
            .collect();

        info!(
            "Found {} foods similar to '{}' in {:.2?}",
            recommendations.len(),
            food_name,
            start.elapsed()
        );
        recommendations
    }

    /// Foods that fit what is left of today's budget.
    ///
    /// `goals` enables the suitability filters. A budget with no protein,
    /// fat or carbohydrate left, or any negative or non-finite value,
    /// yields an empty list.
    #[instrument(skip(self))]
    pub fn goal_aligned_foods(
        &self,
        remaining: &MacroTarget,
        goals: Option<&MacroTarget>,
        n: usize,
    ) -> Vec<FoodRecommendation> {
        let start = Instant::now();
        if n == 0 {
            return Vec::new();
        }
        if !remaining.is_valid() || goals.is_some_and(|g| !g.is_valid()) {
            warn!("Rejecting malformed macro budget {:?} / goals {:?}", remaining, goals);
            return Vec::new();
        }

        let mut context = GoalContext::new(*remaining);
        if let Some(goals) = goals {
            context = context.with_goals(*goals);
        }

        if remaining.total_macros_g() <= 0.0 {
            debug!("Remaining budget has no macros left");
            return Vec::new();
        }
        let Some(found) = self.clusters.get_candidates(remaining) else {
            warn!("Remaining budget {:?} could not be placed in a cluster", remaining);
            return Vec::new();
        };
        if found.candidates.is_empty() {
            debug!("Cluster {} has no members", found.cluster);
            return Vec::new();
        }

        let dense = match self.density_filter.apply(found.candidates, &context) {
            Ok(dense) => dense,
            Err(e) => {
                warn!("Density filtering failed: {:#}", e);
                return Vec::new();
            }
        };
        if dense.is_empty() {
            debug!("No food in cluster {} passes the density filter", found.cluster);
            return Vec::new();
        }

        let suitable = self.suitable_rows(&dense, &context);
        let scored = self.scorer.score(&dense, &context);
        let selected = select(scored, &suitable, n);

        let recommendations: Vec<FoodRecommendation> = selected
            .iter()
            .filter_map(|s| self.goal_recommendation(s))
            .collect();

        info!(
            "Selected {} goal-aligned foods from cluster {} ({} dense, {} suitable) in {:.2?}",
            recommendations.len(),
            found.cluster,
            dense.len(),
            suitable.len(),
            start.elapsed()
        );
        recommendations
    }

    /// Ranked local name search.
    pub fn search(&self, query: &str, limit: usize) -> Vec<(&FoodRecord, MatchKind)> {
        self.catalog
            .table()
            .search(query, limit)
            .into_iter()
            .filter_map(|(row, kind)| Some((self.catalog.record(row)?, kind)))
            .collect()
    }

    pub fn cluster_summaries(&self) -> Vec<ClusterSummary> {
        self.catalog.cluster_summaries()
    }

    /// Rows passing the suitability filters; every dense row without goals.
    fn suitable_rows(&self, dense: &[Candidate], context: &GoalContext) -> HashSet<RowIndex> {
        if context.goals.is_none() {
            return dense.iter().map(|c| c.row).collect();
        }
        match self.suitability.apply(dense.to_vec(), context) {
            Ok(suitable) => suitable.iter().map(|c| c.row).collect(),
            Err(e) => {
                warn!("Suitability filtering failed, using every dense food: {:#}", e);
                dense.iter().map(|c| c.row).collect()
            }
        }
    }

    fn similar_recommendation(&self, candidate: &Candidate) -> Option<FoodRecommendation> {
        let food = self.catalog.record(candidate.row)?.clone();
        let explanation = if candidate.metadata.same_category {
            format!(
                "Same category ({}), macro distance {:.3}",
                food.category, candidate.distance
            )
        } else {
            format!("Similar macro profile, distance {:.3}", candidate.distance)
        };
        Some(FoodRecommendation {
            row: candidate.row,
            food,
            score: candidate.distance,
            source: candidate.source,
            explanation,
        })
    }

    fn goal_recommendation(&self, scored: &ScoredCandidate) -> Option<FoodRecommendation> {
        let candidate = &scored.candidate;
        let food = self.catalog.record(candidate.row)?.clone();
        let explanation = format!(
            "Score {:.3}: distance {:.3}, {:.1} g towards remaining macros",
            scored.score, candidate.distance, scored.contribution
        );
        Some(FoodRecommendation {
            row: candidate.row,
            food,
            score: scored.score,
            source: candidate.source,
            explanation,
        })
    }
}
