use thiserror::Error;

use crate::engine::EngineError;

#[derive(Debug, Error)]
pub enum TerjemahError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Translation engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Local pre-flight rejection of a submission attempt.
///
/// These never reach the network; each variant maps to one user-facing
/// message, surfaced in the order the checks run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no file provided.")]
    MissingDocument,

    #[error("authentication required.")]
    MissingSession,

    #[error("server quota exhausted; supply your own credential.")]
    QuotaExhausted,
}
