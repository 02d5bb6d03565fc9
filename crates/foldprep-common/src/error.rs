use thiserror::Error;

#[derive(Debug, Error)]
pub enum FoldprepError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Dependency resolution error: {0}")]
    Dependency(String),

    #[error("Sample sheet error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FoldprepError>;
