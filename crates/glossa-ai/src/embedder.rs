//! Sentence-embedding pipeline on ONNX Runtime.
//!
//! Loads a sentence-transformers export (`model.onnx` + `tokenizer.json`)
//! and produces mean-pooled, L2-normalized vectors for cosine similarity.

use std::path::Path;

use ort::session::Session;
use ort::value::Tensor;
use tokenizers::{Encoding, Tokenizer};
use tracing::info;

/// Mean-pooled sentence embedder.
pub struct Embedder {
    session: Session,
    tokenizer: Tokenizer,
    dim: usize,
}

impl Embedder {
    /// Load an embedding model from a directory containing `model.onnx` and
    /// `tokenizer.json`. `max_length` caps tokenization per input.
    pub fn load(model_dir: &Path, max_length: usize) -> anyhow::Result<Self> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");

        anyhow::ensure!(model_path.exists(), "model.onnx not found in {model_dir:?}");
        anyhow::ensure!(
            tokenizer_path.exists(),
            "tokenizer.json not found in {model_dir:?}"
        );

        let session = Session::builder()?.commit_from_file(&model_path)?;
        let dim = embedding_dim(session.outputs()[0].dtype()).unwrap_or(384);

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("load tokenizer: {e}"))?;
        tokenizer
            .with_truncation(Some(tokenizers::TruncationParams {
                max_length,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("set truncation: {e}"))?;
        tokenizer.with_padding(Some(tokenizers::PaddingParams::default()));

        info!(dim, model = %model_path.display(), "loaded embedding model");
        Ok(Self {
            session,
            tokenizer,
            dim,
        })
    }

    /// Embedding dimensionality.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Embed one text, returning a unit-norm vector.
    pub fn embed(&mut self, text: &str) -> anyhow::Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text])?;
        Ok(vectors.pop().unwrap_or_default())
    }

    /// Embed a batch of texts, one unit-norm vector per input.
    pub fn embed_batch(&mut self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| anyhow::anyhow!("tokenize: {e}"))?;

        let batch = encodings.len();
        let seq_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0);
        let shape = [batch as i64, seq_len as i64];

        let input_ids = flatten(&encodings, seq_len, Encoding::get_ids);
        let attention_mask = flatten(&encodings, seq_len, Encoding::get_attention_mask);
        let token_type_ids = flatten(&encodings, seq_len, Encoding::get_type_ids);

        let outputs = self.session.run(ort::inputs![
            "input_ids" => Tensor::from_array((shape, input_ids.into_boxed_slice()))?,
            "attention_mask" => Tensor::from_array((shape, attention_mask.clone().into_boxed_slice()))?,
            "token_type_ids" => Tensor::from_array((shape, token_type_ids.into_boxed_slice()))?,
        ])?;

        // Token embeddings: [batch, seq, dim].
        let (out_shape, data) = outputs[0].try_extract_tensor::<f32>()?;
        let dims: &[i64] = out_shape;
        anyhow::ensure!(
            dims.len() == 3 && dims[0] as usize == batch && dims[2] as usize == self.dim,
            "unexpected output shape {dims:?}, expected [{batch}, _, {}]",
            self.dim
        );
        let out_seq_len = dims[1] as usize;

        let vectors = (0..batch)
            .map(|row| {
                let mut pooled =
                    mean_pool(data, &attention_mask, row, seq_len, out_seq_len, self.dim);
                normalize(&mut pooled);
                pooled
            })
            .collect();
        Ok(vectors)
    }
}

/// Flatten one per-token field of a batch of encodings into a row-major
/// `[batch, seq_len]` buffer, zero-padded to `seq_len`.
fn flatten(
    encodings: &[Encoding],
    seq_len: usize,
    field: impl Fn(&Encoding) -> &[u32],
) -> Vec<i64> {
    let mut flat = vec![0i64; encodings.len() * seq_len];
    for (row, encoding) in encodings.iter().enumerate() {
        let offset = row * seq_len;
        for (col, &value) in field(encoding).iter().enumerate() {
            flat[offset + col] = i64::from(value);
        }
    }
    flat
}

/// Attention-masked mean over one row of `[batch, seq, dim]` token
/// embeddings.
fn mean_pool(
    data: &[f32],
    attention_mask: &[i64],
    row: usize,
    mask_seq_len: usize,
    out_seq_len: usize,
    dim: usize,
) -> Vec<f32> {
    let mut pooled = vec![0.0f32; dim];
    let mut count = 0.0f32;

    for token in 0..out_seq_len {
        if attention_mask[row * mask_seq_len + token] == 0 {
            continue;
        }
        let offset = (row * out_seq_len + token) * dim;
        for (p, &v) in pooled.iter_mut().zip(&data[offset..offset + dim]) {
            *p += v;
        }
        count += 1.0;
    }

    if count > 0.0 {
        for p in &mut pooled {
            *p /= count;
        }
    }
    pooled
}

/// L2-normalize in place.
pub(crate) fn normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// Embedding dimension from the model's first output type: the last
/// dimension of the token-embedding tensor.
fn embedding_dim(output_type: &ort::value::ValueType) -> Option<usize> {
    match output_type {
        ort::value::ValueType::Tensor { shape, .. } => shape
            .last()
            .and_then(|&d| if d > 0 { Some(d as usize) } else { None }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_produces_unit_vectors() {
        let mut v = vec![3.0, 4.0];
        normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn normalize_leaves_zero_vector_alone() {
        let mut v = vec![0.0, 0.0];
        normalize(&mut v);
        assert_eq!(v, vec![0.0, 0.0]);
    }

    #[test]
    fn mean_pool_respects_attention_mask() {
        // One row, two tokens of dim 2, second token masked out.
        let data = [1.0, 2.0, 100.0, 100.0];
        let mask = [1i64, 0];
        let pooled = mean_pool(&data, &mask, 0, 2, 2, 2);
        assert_eq!(pooled, vec![1.0, 2.0]);
    }
}
