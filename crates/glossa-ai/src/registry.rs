//! Per-task capability registry with two-tier fallback.
//!
//! Initialization is an explicit two-step attempt per task: construct the
//! preferred (model-backed) capability, and on failure construct the
//! built-in heuristic fallback. The produced registry is an immutable
//! snapshot; re-initialization builds a new one instead of mutating in
//! place. Each task's slot is wholly preferred or wholly fallback; a task
//! can never hold a mix of tiers.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use glossa_core::config::{DEFAULT_TIMEOUT, DevicePreference};
use glossa_core::record::TaskKind;
use tracing::{error, info, warn};

use crate::heuristic::{KeywordClassifier, LexiconSentiment, PatternNer};
use crate::{Capability, RegistryError};

/// Settings consumed at registry initialization.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub device: DevicePreference,
    /// Directory holding one ONNX model subdirectory per task, named after
    /// the final segment of the configured model identifier. `None`
    /// disables the preferred tier.
    pub model_dir: Option<PathBuf>,
    /// Pass-through timeout for backends that support one; the built-in
    /// backends do not enforce it.
    pub timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            device: DevicePreference::default(),
            model_dir: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Which tier a task's active capability came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Preferred,
    Fallback,
}

struct Slot {
    tier: Tier,
    backend: Arc<dyn Capability>,
}

/// Immutable snapshot of active capabilities, one per task.
pub struct Registry {
    slots: HashMap<TaskKind, Slot>,
}

impl Registry {
    /// Build a registry from configuration, resolving the device preference
    /// once and applying it uniformly.
    ///
    /// Fallback is per task: a preferred-construction failure for one task
    /// leaves the other tasks' tiers untouched. A task where both tiers
    /// fail is left unregistered and surfaces as
    /// [`RegistryError::BackendUnavailable`] on [`Registry::get`].
    pub fn initialize(config: &BackendConfig) -> Self {
        let device = config.device.resolve();
        info!(device = ?device, "initializing backend registry");

        let mut builder = RegistryBuilder::default();
        for task in TaskKind::ALL {
            match try_preferred(task, config, device) {
                Ok(backend) => {
                    info!(task = %task, backend = backend.name(), "preferred backend ready");
                    builder = builder.with_capability(task, Tier::Preferred, backend);
                }
                Err(err) => {
                    warn!(
                        task = %task,
                        "preferred backend construction failed, trying fallback: {err:#}"
                    );
                    match try_fallback(task) {
                        Ok(backend) => {
                            info!(task = %task, backend = backend.name(), "fallback backend ready");
                            builder = builder.with_capability(task, Tier::Fallback, backend);
                        }
                        Err(err) => {
                            error!(task = %task, "no backend available for task: {err:#}");
                        }
                    }
                }
            }
        }
        builder.build()
    }

    /// Assemble a registry from hand-picked capabilities (custom backends,
    /// tests).
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// The active capability for a task.
    pub fn get(&self, task: TaskKind) -> Result<&dyn Capability, RegistryError> {
        self.slots
            .get(&task)
            .map(|slot| slot.backend.as_ref())
            .ok_or(RegistryError::BackendUnavailable { task })
    }

    /// Which tier serves a task, if any backend is registered for it.
    pub fn tier(&self, task: TaskKind) -> Option<Tier> {
        self.slots.get(&task).map(|slot| slot.tier)
    }

    /// Registered tasks, in canonical task order.
    pub fn available_tasks(&self) -> Vec<TaskKind> {
        TaskKind::ALL
            .into_iter()
            .filter(|task| self.slots.contains_key(task))
            .collect()
    }
}

#[derive(Default)]
pub struct RegistryBuilder {
    slots: HashMap<TaskKind, Slot>,
}

impl RegistryBuilder {
    pub fn with_capability(
        mut self,
        task: TaskKind,
        tier: Tier,
        backend: Arc<dyn Capability>,
    ) -> Self {
        self.slots.insert(task, Slot { tier, backend });
        self
    }

    pub fn build(self) -> Registry {
        Registry { slots: self.slots }
    }
}

#[cfg(feature = "onnx")]
fn try_preferred(
    task: TaskKind,
    config: &BackendConfig,
    device: glossa_core::config::ResolvedDevice,
) -> anyhow::Result<Arc<dyn Capability>> {
    use anyhow::Context;

    use crate::{SemanticClassifier, SemanticSentiment, TokenNer};

    let root = config
        .model_dir
        .as_deref()
        .context("no model directory configured")?;
    let dir = root.join(model_dir_name(glossa_core::config::preferred_model(task)));

    let backend: Arc<dyn Capability> = match task {
        TaskKind::Classification => Arc::new(SemanticClassifier::load(&dir, device)?),
        TaskKind::Sentiment => Arc::new(SemanticSentiment::load(&dir, device)?),
        TaskKind::Ner => Arc::new(TokenNer::load(&dir, device)?),
    };
    Ok(backend)
}

#[cfg(not(feature = "onnx"))]
fn try_preferred(
    _task: TaskKind,
    _config: &BackendConfig,
    _device: glossa_core::config::ResolvedDevice,
) -> anyhow::Result<Arc<dyn Capability>> {
    anyhow::bail!("model-backed backends require the `onnx` feature")
}

fn try_fallback(task: TaskKind) -> anyhow::Result<Arc<dyn Capability>> {
    let backend: Arc<dyn Capability> = match task {
        TaskKind::Classification => Arc::new(KeywordClassifier),
        TaskKind::Sentiment => Arc::new(LexiconSentiment),
        TaskKind::Ner => Arc::new(PatternNer),
    };
    Ok(backend)
}

/// Final path segment of a model identifier, e.g.
/// `facebook/bart-large-mnli` → `bart-large-mnli`.
#[cfg(feature = "onnx")]
fn model_dir_name(model_id: &str) -> &str {
    model_id.rsplit('/').next().unwrap_or(model_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn without_models_every_task_lands_on_fallback() {
        // No model directory configured: the preferred tier cannot be
        // constructed, so each task must hold exactly the fallback.
        let registry = Registry::initialize(&BackendConfig::default());
        for task in TaskKind::ALL {
            assert_eq!(registry.tier(task), Some(Tier::Fallback), "task {task}");
            assert_eq!(registry.get(task).unwrap().task(), task);
        }
        assert_eq!(registry.available_tasks(), TaskKind::ALL.to_vec());
    }

    #[test]
    fn empty_registry_reports_backend_unavailable() {
        let registry = Registry::builder().build();
        let err = registry.get(TaskKind::Sentiment).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::BackendUnavailable {
                task: TaskKind::Sentiment
            }
        ));
        assert!(registry.available_tasks().is_empty());
    }

    #[test]
    fn builder_registers_single_task() {
        let registry = Registry::builder()
            .with_capability(TaskKind::Ner, Tier::Fallback, Arc::new(PatternNer))
            .build();
        assert!(registry.get(TaskKind::Ner).is_ok());
        assert!(registry.get(TaskKind::Classification).is_err());
        assert_eq!(registry.available_tasks(), vec![TaskKind::Ner]);
    }

    #[test]
    fn fallback_construction_is_infallible() {
        for task in TaskKind::ALL {
            assert!(try_fallback(task).is_ok());
        }
    }
}
