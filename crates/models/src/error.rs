//! Error types for model fitting.

use thiserror::Error;

/// Errors raised while fitting or applying a model.
///
/// Only construction can fail on data; once fitted, a model rejects input
/// solely on dimension mismatches.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Cannot fit a model on an empty feature matrix")]
    EmptyMatrix,

    #[error("Need at least {clusters} samples to build {clusters} clusters, got {samples}")]
    TooFewSamples { samples: usize, clusters: usize },

    #[error("Expected {expected} features, got {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
