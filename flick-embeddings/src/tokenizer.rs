//! Tokenizer wrapper producing padded, truncated batches for BERT models.

use crate::error::{EmbeddingError, Result};
use std::path::Path;
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};

/// A `tokenizer.json` tokenizer configured to pad every batch to its
/// longest member and cut inputs at the model's position limit.
pub struct SentenceTokenizer {
    tokenizer: Tokenizer,
}

/// One tokenized batch, row-major, `rows * seq_len` entries per field.
#[derive(Debug, Clone)]
pub struct TokenBatch {
    pub input_ids: Vec<u32>,
    pub attention_mask: Vec<u32>,
    pub token_type_ids: Vec<u32>,
    pub rows: usize,
    pub seq_len: usize,
}

impl SentenceTokenizer {
    /// Load a tokenizer file and set padding and truncation.
    pub fn from_file(path: impl AsRef<Path>, max_length: usize) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(EmbeddingError::Tokenizer {
                message: format!("Tokenizer file not found: {}", path.display()),
            });
        }
        Self::configure(Tokenizer::from_file(path)?, max_length)
    }

    fn configure(mut tokenizer: Tokenizer, max_length: usize) -> Result<Self> {
        let pad_token = tokenizer
            .get_padding()
            .map(|p| (p.pad_id, p.pad_token.clone()))
            .unwrap_or_else(|| (0, "[PAD]".to_string()));

        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::BatchLongest,
            pad_id: pad_token.0,
            pad_token: pad_token.1,
            ..Default::default()
        }));
        tokenizer.with_truncation(Some(TruncationParams {
            max_length,
            ..Default::default()
        }))?;

        Ok(Self { tokenizer })
    }

    pub fn vocab_size(&self) -> usize {
        self.tokenizer.get_vocab_size(true)
    }

    /// Tokenize `texts` into a single padded batch.
    pub fn encode_batch(&self, texts: &[&str]) -> Result<TokenBatch> {
        if texts.is_empty() {
            return Err(EmbeddingError::EmptyInput);
        }

        let encodings = self.tokenizer.encode_batch(texts.to_vec(), true)?;
        let rows = encodings.len();
        let seq_len = encodings.first().map_or(0, |e| e.get_ids().len());

        let mut batch = TokenBatch {
            input_ids: Vec::with_capacity(rows * seq_len),
            attention_mask: Vec::with_capacity(rows * seq_len),
            token_type_ids: Vec::with_capacity(rows * seq_len),
            rows,
            seq_len,
        };
        for encoding in &encodings {
            batch.input_ids.extend_from_slice(encoding.get_ids());
            batch.attention_mask.extend_from_slice(encoding.get_attention_mask());
            batch.token_type_ids.extend_from_slice(encoding.get_type_ids());
        }

        Ok(batch)
    }
}
