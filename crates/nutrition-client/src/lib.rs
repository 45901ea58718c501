//! Client for the Swiss FSVO food composition API.
//!
//! This crate provides:
//! - [`NutritionLookup`], the seam between callers and any lookup service
//! - [`FsvoClient`], a `reqwest` implementation against the public API
//! - Tolerant payload parsing and query-similarity ranking
//!
//! The recommendation engine never calls this crate. Callers use a lookup
//! to log a meal by name, then pass the resolved food name or macros on.

pub mod client;
pub mod error;
pub mod payload;

pub use client::{best_match, FsvoClient, FsvoConfig, NutritionLookup};
pub use error::{LookupError, Result};
pub use payload::{parse_details, parse_search, rank_matches, similarity, FoodMatch};
