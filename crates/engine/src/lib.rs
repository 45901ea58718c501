//! Recommendation engine for macro-aware food suggestions.
//!
//! This crate ties the loader, models, candidate sources and pipeline
//! together behind [`RecommendationEngine`].

pub mod config;
pub mod engine;
pub mod error;

pub use config::EngineConfig;
pub use engine::{EngineStats, FoodRecommendation, RecommendationEngine};
pub use error::{EngineError, Result};
