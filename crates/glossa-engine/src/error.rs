use glossa_ai::{InferenceError, RegistryError};
use glossa_core::record::UnknownTaskError;
use glossa_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Caller-supplied arguments violate a precondition; recoverable by
    /// retrying with valid input.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    UnknownTask(#[from] UnknownTaskError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
