use data_loader::DataLoadError;
use models::ModelError;
use thiserror::Error;

/// Errors that prevent an engine from being built.
///
/// Queries never fail; only construction does, and a failed construction
/// leaves no partial engine behind.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Failed to load dataset: {0}")]
    Data(#[from] DataLoadError),

    #[error("Failed to train models: {0}")]
    Model(#[from] ModelError),

    #[error("Invalid engine configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
