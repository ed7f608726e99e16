//! The capability trait every inference backend implements.
//!
//! One capability serves one task. Model-backed and heuristic backends sit
//! behind the same trait so the registry can swap tiers without the caller
//! noticing.

use glossa_core::record::{TaskKind, TaskOutput};

use crate::InferenceError;

/// Optional invocation parameters.
///
/// Classification requires `candidate_labels`; the other tasks ignore them.
#[derive(Debug, Clone, Default)]
pub struct InvokeOptions {
    pub candidate_labels: Vec<String>,
}

impl InvokeOptions {
    pub fn with_labels(labels: &[String]) -> Self {
        Self {
            candidate_labels: labels.to_vec(),
        }
    }
}

/// A single-task inference backend.
pub trait Capability: Send + Sync {
    /// The task this capability serves.
    fn task(&self) -> TaskKind;

    /// Backend identifier for logs and diagnostics.
    fn name(&self) -> &str;

    /// Run inference on one text. The returned payload variant must match
    /// [`Capability::task`].
    fn invoke(&self, text: &str, opts: &InvokeOptions) -> Result<TaskOutput, InferenceError>;
}

impl std::fmt::Debug for dyn Capability + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capability")
            .field("task", &self.task())
            .field("name", &self.name())
            .finish()
    }
}
