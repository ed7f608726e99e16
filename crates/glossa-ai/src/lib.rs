//! Inference layer: the `Capability` trait, built-in heuristic backends,
//! ONNX-backed model backends (behind the `onnx` feature), and the per-task
//! registry with two-tier fallback.

mod capability;
pub use capability::{Capability, InvokeOptions};

mod error;
pub use error::{InferenceError, RegistryError};

mod heuristic;
pub use heuristic::{KeywordClassifier, LexiconSentiment, PatternNer};

mod registry;
pub use registry::{BackendConfig, Registry, RegistryBuilder, Tier};

#[cfg(feature = "onnx")]
mod embedder;
#[cfg(feature = "onnx")]
pub use embedder::Embedder;

#[cfg(feature = "onnx")]
mod semantic;
#[cfg(feature = "onnx")]
pub use semantic::{SemanticClassifier, SemanticSentiment};

#[cfg(feature = "onnx")]
mod token_ner;
#[cfg(feature = "onnx")]
pub use token_ner::TokenNer;
