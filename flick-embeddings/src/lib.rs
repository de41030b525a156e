//! Flick Embeddings - sentence embedding inference.
//!
//! Wraps a BERT encoder from `candle-transformers` in the
//! sentence-transformers pipeline (tokenize, encode, mean-pool over real
//! tokens, L2-normalise) and exposes it as a [`flick_core::EmbeddingModel`].
//!
//! Models are resolved from a local directory or fetched from the Hugging
//! Face hub:
//!
//! ```rust,no_run
//! use flick_core::EmbeddingModel;
//! use flick_embeddings::SentenceModel;
//!
//! # async fn demo() -> flick_embeddings::Result<()> {
//! let model = SentenceModel::resolve(flick_embeddings::DEFAULT_MODEL).await?;
//! let vector = model.embed("A heist that goes wrong in 1970s Boston").unwrap();
//! assert_eq!(vector.len(), 384);
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all)]

mod error;
mod hub;
mod model;
mod tokenizer;

pub use error::{EmbeddingError, Result};
pub use model::{ModelConfig, ModelFiles, SentenceModel};
pub use tokenizer::{SentenceTokenizer, TokenBatch};

/// Embedding model used when none is configured.
pub const DEFAULT_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Output dimension of [`DEFAULT_MODEL`].
pub const DEFAULT_EMBEDDING_DIM: usize = 384;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(DEFAULT_EMBEDDING_DIM, 384);
        assert!(DEFAULT_MODEL.starts_with("sentence-transformers/"));
    }
}
