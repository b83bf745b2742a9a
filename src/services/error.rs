// src/services/error.rs
use thiserror::Error;

/// Failures of the upstream data providers.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The provider answered, but had nothing for the ticker/range.
    #[error("no data found for {0}")]
    NoData(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("{0} is not configured")]
    MissingApiKey(&'static str),
    #[error("provider error: {0}")]
    Api(String),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected response: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FetchError>;
