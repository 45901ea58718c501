use thiserror::Error;

/// Errors from the nutrition lookup service
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("Request to nutrition service failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Nutrition service returned status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Unexpected payload from nutrition service: {0}")]
    Payload(String),

    #[error("Food {id} is missing macro values: {}", .missing.join(", "))]
    MissingMacros { id: u64, missing: Vec<&'static str> },
}

pub type Result<T> = std::result::Result<T, LookupError>;
