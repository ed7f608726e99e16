use glossa_core::record::TaskKind;
use thiserror::Error;

/// A backend raised during invocation. Propagated to the caller without
/// retry; nothing is persisted for the failed call.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("backend invocation failed: {0}")]
    Invocation(String),

    #[error("backend output malformed: {0}")]
    Output(String),

    #[cfg(feature = "onnx")]
    #[error("onnx runtime error: {0}")]
    Ort(#[from] ort::Error),
}

#[derive(Debug, Error)]
pub enum RegistryError {
    /// Neither the preferred nor the fallback backend could be constructed
    /// for this task. Fatal for the task's operations until the process
    /// restarts; other tasks remain usable.
    #[error("no capability available for task {task}")]
    BackendUnavailable { task: TaskKind },
}
