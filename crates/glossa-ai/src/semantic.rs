//! Embedding-similarity backends: zero-shot classification against label
//! prompts and prototype-anchored sentiment.
//!
//! Both ride on [`Embedder`]: candidate labels (or polarity anchors) are
//! embedded alongside the input text, and cosine similarity plays the role
//! a dedicated classification head would.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use glossa_core::config::{MAX_TEXT_LENGTH, ResolvedDevice};
use glossa_core::record::{SentimentRating, TaskKind, TaskOutput};
use tracing::info;

use crate::embedder::normalize;
use crate::{Capability, Embedder, InferenceError, InvokeOptions};

const POSITIVE_ANCHORS: &[&str] = &[
    "I love this.",
    "This is wonderful.",
    "What a great experience.",
];
const NEGATIVE_ANCHORS: &[&str] = &[
    "I hate this.",
    "This is terrible.",
    "What an awful experience.",
];

/// Fail preferred-tier construction when the resolved device has no
/// execution provider in this build.
pub(crate) fn ensure_device(device: ResolvedDevice) -> anyhow::Result<()> {
    anyhow::ensure!(
        device == ResolvedDevice::Cpu,
        "accelerator execution provider not available in this build"
    );
    Ok(())
}

fn lock(embedder: &Mutex<Embedder>) -> Result<MutexGuard<'_, Embedder>, InferenceError> {
    embedder
        .lock()
        .map_err(|_| InferenceError::Invocation("embedder lock poisoned".into()))
}

fn invocation(err: anyhow::Error) -> InferenceError {
    InferenceError::Invocation(format!("{err:#}"))
}

fn softmax(xs: &[f32]) -> Vec<f32> {
    let max = xs.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = xs.iter().map(|x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Zero-shot classification by cosine similarity between the text embedding
/// and one prompt embedding per candidate label, softmax-normalized so the
/// scores sum to 1.0, emitted in descending order.
pub struct SemanticClassifier {
    embedder: Mutex<Embedder>,
    name: String,
}

impl SemanticClassifier {
    pub fn load(model_dir: &Path, device: ResolvedDevice) -> anyhow::Result<Self> {
        ensure_device(device)?;
        let embedder = Embedder::load(model_dir, MAX_TEXT_LENGTH)?;
        info!(model_dir = %model_dir.display(), "semantic classifier ready");
        Ok(Self {
            embedder: Mutex::new(embedder),
            name: format!("semantic-classifier:{}", dir_label(model_dir)),
        })
    }
}

impl Capability for SemanticClassifier {
    fn task(&self) -> TaskKind {
        TaskKind::Classification
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn invoke(&self, text: &str, opts: &InvokeOptions) -> Result<TaskOutput, InferenceError> {
        if opts.candidate_labels.is_empty() {
            return Err(InferenceError::Invocation(
                "classification requires candidate labels".into(),
            ));
        }

        let mut embedder = lock(&self.embedder)?;
        let text_vec = embedder.embed(text).map_err(invocation)?;

        let prompts: Vec<String> = opts
            .candidate_labels
            .iter()
            .map(|label| format!("This text is about {label}."))
            .collect();
        let prompt_refs: Vec<&str> = prompts.iter().map(String::as_str).collect();
        let prompt_vecs = embedder.embed_batch(&prompt_refs).map_err(invocation)?;

        let sims: Vec<f32> = prompt_vecs.iter().map(|v| dot(v, &text_vec)).collect();
        let scores = softmax(&sims);

        let mut ranked: Vec<(String, f32)> = opts
            .candidate_labels
            .iter()
            .cloned()
            .zip(scores)
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        let (labels, scores) = ranked.into_iter().unzip();
        Ok(TaskOutput::Classification { labels, scores })
    }
}

/// Sentiment by similarity to fixed positive/negative prototype anchors,
/// embedded once at load time.
pub struct SemanticSentiment {
    embedder: Mutex<Embedder>,
    positive: Vec<f32>,
    negative: Vec<f32>,
    name: String,
}

impl SemanticSentiment {
    pub fn load(model_dir: &Path, device: ResolvedDevice) -> anyhow::Result<Self> {
        ensure_device(device)?;
        let mut embedder = Embedder::load(model_dir, MAX_TEXT_LENGTH)?;

        let positive = anchor_centroid(&mut embedder, POSITIVE_ANCHORS)?;
        let negative = anchor_centroid(&mut embedder, NEGATIVE_ANCHORS)?;

        info!(model_dir = %model_dir.display(), "semantic sentiment ready");
        Ok(Self {
            embedder: Mutex::new(embedder),
            positive,
            negative,
            name: format!("semantic-sentiment:{}", dir_label(model_dir)),
        })
    }
}

impl Capability for SemanticSentiment {
    fn task(&self) -> TaskKind {
        TaskKind::Sentiment
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn invoke(&self, text: &str, _opts: &InvokeOptions) -> Result<TaskOutput, InferenceError> {
        let mut embedder = lock(&self.embedder)?;
        let text_vec = embedder.embed(text).map_err(invocation)?;

        let scores = softmax(&[dot(&self.positive, &text_vec), dot(&self.negative, &text_vec)]);
        let (label, score) = if scores[0] >= scores[1] {
            ("POSITIVE", scores[0])
        } else {
            ("NEGATIVE", scores[1])
        };

        Ok(TaskOutput::Sentiment {
            ratings: vec![SentimentRating {
                label: label.to_string(),
                score,
            }],
        })
    }
}

/// Mean of the anchor embeddings, re-normalized to unit length.
fn anchor_centroid(embedder: &mut Embedder, anchors: &[&str]) -> anyhow::Result<Vec<f32>> {
    let vectors = embedder.embed_batch(anchors)?;
    anyhow::ensure!(!vectors.is_empty(), "no anchor embeddings produced");

    let dim = vectors[0].len();
    let mut centroid = vec![0.0f32; dim];
    for vector in &vectors {
        for (c, &v) in centroid.iter_mut().zip(vector) {
            *c += v;
        }
    }
    for c in &mut centroid {
        *c /= vectors.len() as f32;
    }
    normalize(&mut centroid);
    Ok(centroid)
}

fn dir_label(model_dir: &Path) -> String {
    model_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| model_dir.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn softmax_sums_to_one_and_preserves_order() {
        let scores = softmax(&[2.0, 1.0, 0.5]);
        assert!((scores.iter().sum::<f32>() - 1.0).abs() < 1e-6);
        assert!(scores[0] > scores[1] && scores[1] > scores[2]);
    }

    #[test]
    fn softmax_is_stable_for_large_inputs() {
        let scores = softmax(&[1000.0, 999.0]);
        assert!(scores.iter().all(|s| s.is_finite()));
        assert!(scores[0] > scores[1]);
    }

    #[test]
    fn device_gate_rejects_accelerator() {
        assert!(ensure_device(ResolvedDevice::Accelerator).is_err());
        assert!(ensure_device(ResolvedDevice::Cpu).is_ok());
    }
}
