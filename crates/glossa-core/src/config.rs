//! Static configuration: model identifiers, supported languages, compute
//! device preference, and engine settings.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::record::TaskKind;

/// The fixed set of supported language codes. Static configuration, not
/// derived from stored data.
pub const SUPPORTED_LANGUAGES: &[&str] = &[
    "en", "es", "fr", "de", "it", "pt", "ru", "zh", "ja", "ko",
];

/// Language placeholder used when no detection has been performed.
pub const AUTO_DETECTED: &str = "auto-detected";

/// Maximum text length (in tokenizer units) fed to a backend.
pub const MAX_TEXT_LENGTH: usize = 512;

/// Default backend timeout. Pass-through setting for backends that support
/// one; not enforced by the pipeline itself.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Model identifiers for tasks the pipeline never invokes. Kept for parity
/// with deployment configuration.
pub const TRANSLATION_MODEL: &str = "facebook/mbart-large-50-many-to-many-mmt";
pub const SUMMARIZATION_MODEL: &str = "facebook/mbart-large-50-many-to-many-mmt";

/// English display name for a supported language code.
pub fn language_name(code: &str) -> Option<&'static str> {
    let name = match code {
        "en" => "English",
        "es" => "Spanish",
        "fr" => "French",
        "de" => "German",
        "it" => "Italian",
        "pt" => "Portuguese",
        "ru" => "Russian",
        "zh" => "Chinese",
        "ja" => "Japanese",
        "ko" => "Korean",
        _ => return None,
    };
    Some(name)
}

/// Preferred model identifier for a task.
pub fn preferred_model(task: TaskKind) -> &'static str {
    match task {
        TaskKind::Classification => "facebook/bart-large-mnli",
        TaskKind::Sentiment => "cardiffnlp/twitter-xlm-roberta-base-sentiment",
        TaskKind::Ner => "xlm-roberta-large-finetuned-conll03-english",
    }
}

/// Simpler model identifier associated with a task's fallback tier. Kept
/// for parity with deployment configuration; the built-in fallback
/// backends run without model files.
pub fn fallback_model(task: TaskKind) -> &'static str {
    match task {
        TaskKind::Classification => "facebook/bart-large-mnli",
        TaskKind::Sentiment => "distilbert-base-uncased-finetuned-sst-2-english",
        TaskKind::Ner => "dbmdz/bert-large-cased-finetuned-conll03-english",
    }
}

/// Caller preference for the compute device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevicePreference {
    /// Pick an accelerator when the environment advertises one.
    #[default]
    Auto,
    Cpu,
    Accelerator,
}

/// The device actually applied, resolved once at registry initialization
/// and uniform across the active capability set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedDevice {
    Cpu,
    Accelerator,
}

impl DevicePreference {
    /// Resolve the preference against the environment. `Auto` selects the
    /// accelerator only when `CUDA_VISIBLE_DEVICES` is set and non-empty.
    pub fn resolve(self) -> ResolvedDevice {
        match self {
            Self::Cpu => ResolvedDevice::Cpu,
            Self::Accelerator => ResolvedDevice::Accelerator,
            Self::Auto => match std::env::var("CUDA_VISIBLE_DEVICES") {
                Ok(v) if !v.is_empty() => ResolvedDevice::Accelerator,
                _ => ResolvedDevice::Cpu,
            },
        }
    }
}

/// Engine-level settings shared by the registry and the record store.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Backing document for the record store.
    pub db_path: PathBuf,
    pub device: DevicePreference,
    /// Directory holding ONNX model subdirectories. `None` disables the
    /// preferred model-backed tier entirely.
    pub model_dir: Option<PathBuf>,
    /// Pass-through timeout handed to backends.
    pub timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("glossa_db.json"),
            device: DevicePreference::default(),
            model_dir: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_supported_language_has_a_name() {
        for code in SUPPORTED_LANGUAGES {
            assert!(language_name(code).is_some(), "missing name for {code}");
        }
        assert_eq!(language_name("xx"), None);
    }

    #[test]
    fn each_task_has_both_model_tiers() {
        for task in TaskKind::ALL {
            assert!(!preferred_model(task).is_empty());
            assert!(!fallback_model(task).is_empty());
        }
    }

    #[test]
    fn explicit_device_preferences_resolve_as_given() {
        assert_eq!(DevicePreference::Cpu.resolve(), ResolvedDevice::Cpu);
        assert_eq!(
            DevicePreference::Accelerator.resolve(),
            ResolvedDevice::Accelerator
        );
    }
}
