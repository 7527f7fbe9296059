use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The query is empty or shorter than the configured minimum.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Catalog error: {0}")]
    Catalog(String),
}

pub type Result<T> = std::result::Result<T, Error>;
