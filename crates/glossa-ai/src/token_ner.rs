//! Token-classification NER on ONNX Runtime.
//!
//! Runs a HuggingFace token-classification export (`model.onnx`,
//! `tokenizer.json`, `config.json`), picks the arg-max label per token, and
//! merges BIO-tagged subword runs into entity spans.

use std::path::Path;
use std::sync::Mutex;

use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;
use tracing::info;

use glossa_core::config::{MAX_TEXT_LENGTH, ResolvedDevice};
use glossa_core::record::{EntitySpan, TaskKind, TaskOutput};

use crate::semantic::ensure_device;
use crate::{Capability, InferenceError, InvokeOptions};

pub struct TokenNer {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    /// Label names indexed by class id, from the model's `config.json`.
    labels: Vec<String>,
    /// Whether the model takes a `token_type_ids` input (BERT-style
    /// exports declare `type_vocab_size > 1`, RoBERTa-style ones don't).
    feed_type_ids: bool,
    name: String,
}

impl TokenNer {
    pub fn load(model_dir: &Path, device: ResolvedDevice) -> anyhow::Result<Self> {
        ensure_device(device)?;

        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let config_path = model_dir.join("config.json");
        anyhow::ensure!(model_path.exists(), "model.onnx not found in {model_dir:?}");
        anyhow::ensure!(
            tokenizer_path.exists(),
            "tokenizer.json not found in {model_dir:?}"
        );
        anyhow::ensure!(
            config_path.exists(),
            "config.json not found in {model_dir:?}"
        );

        let raw = std::fs::read_to_string(&config_path)?;
        let (labels, feed_type_ids) = parse_label_map(&raw)?;

        let session = Session::builder()?.commit_from_file(&model_path)?;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("load tokenizer: {e}"))?;
        tokenizer
            .with_truncation(Some(tokenizers::TruncationParams {
                max_length: MAX_TEXT_LENGTH,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("set truncation: {e}"))?;

        info!(
            labels = labels.len(),
            model = %model_path.display(),
            "loaded token-classification model"
        );
        let name = model_dir
            .file_name()
            .map(|n| format!("token-ner:{}", n.to_string_lossy()))
            .unwrap_or_else(|| "token-ner".to_string());
        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            labels,
            feed_type_ids,
            name,
        })
    }
}

impl Capability for TokenNer {
    fn task(&self) -> TaskKind {
        TaskKind::Ner
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn invoke(&self, text: &str, _opts: &InvokeOptions) -> Result<TaskOutput, InferenceError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| InferenceError::Invocation(format!("tokenize: {e}")))?;

        let ids = encoding.get_ids();
        let mask = encoding.get_attention_mask();
        let offsets = encoding.get_offsets();
        let seq_len = ids.len();
        if seq_len == 0 {
            return Ok(TaskOutput::Entities { spans: Vec::new() });
        }

        let shape = [1i64, seq_len as i64];
        let to_i64 = |xs: &[u32]| {
            xs.iter()
                .map(|&v| i64::from(v))
                .collect::<Vec<_>>()
                .into_boxed_slice()
        };

        let mut session = self
            .session
            .lock()
            .map_err(|_| InferenceError::Invocation("session lock poisoned".into()))?;
        let outputs = if self.feed_type_ids {
            session.run(ort::inputs![
                "input_ids" => Tensor::from_array((shape, to_i64(ids)))?,
                "attention_mask" => Tensor::from_array((shape, to_i64(mask)))?,
                "token_type_ids" => Tensor::from_array((shape, to_i64(encoding.get_type_ids())))?,
            ])?
        } else {
            session.run(ort::inputs![
                "input_ids" => Tensor::from_array((shape, to_i64(ids)))?,
                "attention_mask" => Tensor::from_array((shape, to_i64(mask)))?,
            ])?
        };

        // Logits: [1, seq, num_labels].
        let (out_shape, logits) = outputs[0].try_extract_tensor::<f32>()?;
        let dims: &[i64] = out_shape;
        let num_labels = self.labels.len();
        if dims.len() != 3 || dims[0] != 1 || dims[2] as usize != num_labels {
            return Err(InferenceError::Output(format!(
                "unexpected logits shape {dims:?}, expected [1, _, {num_labels}]"
            )));
        }
        let out_seq = (dims[1] as usize).min(seq_len);

        let mut spans = Vec::new();
        let mut current: Option<SpanAccum> = None;

        for token in 0..out_seq {
            if mask[token] == 0 {
                continue;
            }
            let (start, end) = offsets[token];
            if start == end {
                // Special token.
                continue;
            }

            let row = &logits[token * num_labels..(token + 1) * num_labels];
            let (class, prob) = argmax_prob(row);
            let label = &self.labels[class];
            if label == "O" {
                finish(text, current.take(), &mut spans);
                continue;
            }

            let (begins, tag) = split_tag(label);
            match current.as_mut() {
                Some(span) if !begins && span.tag == tag && token == span.last_token + 1 => {
                    span.end = end;
                    span.scores.push(prob);
                    span.last_token = token;
                }
                _ => {
                    finish(text, current.take(), &mut spans);
                    current = Some(SpanAccum {
                        tag: tag.to_string(),
                        start,
                        end,
                        scores: vec![prob],
                        last_token: token,
                    });
                }
            }
        }
        finish(text, current.take(), &mut spans);

        Ok(TaskOutput::Entities { spans })
    }
}

struct SpanAccum {
    tag: String,
    start: usize,
    end: usize,
    scores: Vec<f32>,
    last_token: usize,
}

fn finish(text: &str, span: Option<SpanAccum>, spans: &mut Vec<EntitySpan>) {
    let Some(span) = span else { return };
    // Offsets index the original text; skip a span whose range does not
    // land on valid boundaries rather than panic on a slice.
    let Some(word) = text.get(span.start..span.end) else {
        return;
    };
    if word.is_empty() {
        return;
    }
    let score = span.scores.iter().sum::<f32>() / span.scores.len() as f32;
    spans.push(EntitySpan {
        entity: span.tag,
        word: word.to_string(),
        score,
    });
}

/// Arg-max class and its softmax probability, in one pass.
fn argmax_prob(row: &[f32]) -> (usize, f32) {
    let mut best = 0;
    for (i, &v) in row.iter().enumerate() {
        if v > row[best] {
            best = i;
        }
    }
    let max = row[best];
    let sum: f32 = row.iter().map(|v| (v - max).exp()).sum();
    (best, 1.0 / sum)
}

/// Split a BIO label into (begins-new-span, bare tag).
fn split_tag(label: &str) -> (bool, &str) {
    if let Some(tag) = label.strip_prefix("B-") {
        (true, tag)
    } else if let Some(tag) = label.strip_prefix("I-") {
        (false, tag)
    } else {
        (false, label)
    }
}

/// Parse `id2label` (and the `token_type_ids` requirement) out of a
/// HuggingFace `config.json`.
fn parse_label_map(raw: &str) -> anyhow::Result<(Vec<String>, bool)> {
    let config: serde_json::Value = serde_json::from_str(raw)?;
    let id2label = config
        .get("id2label")
        .and_then(|v| v.as_object())
        .ok_or_else(|| anyhow::anyhow!("config.json has no id2label map"))?;

    let mut labels = vec![String::new(); id2label.len()];
    for (id, label) in id2label {
        let index: usize = id
            .parse()
            .map_err(|_| anyhow::anyhow!("non-numeric label id {id:?}"))?;
        let name = label
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("label for id {id} is not a string"))?;
        anyhow::ensure!(index < labels.len(), "label id {index} out of range");
        labels[index] = name.to_string();
    }

    let feed_type_ids = config
        .get("type_vocab_size")
        .and_then(|v| v.as_u64())
        .is_some_and(|n| n > 1);

    Ok((labels, feed_type_ids))
}
