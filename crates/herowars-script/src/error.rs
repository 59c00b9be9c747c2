//! Error types for herowars-script

use thiserror::Error;

/// Content loading error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Duplicate definition: {0}")]
    DuplicateDefinition(String),

    #[error("No behavior registered for hero directory '{0}'")]
    UnresolvedBehavior(String),

    #[error(transparent)]
    Core(#[from] herowars_core::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
