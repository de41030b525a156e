//! Vector storage for the movie corpus.
//!
//! Provides:
//! - An exact flat L2 index ([`FlatL2Index`])
//! - The persisted store: index, metadata table and manifest ([`VectorStore`])
//! - The offline index build ([`build_index`])
//!
//! Row `i` of the index always describes row `i` of the metadata table.

mod builder;
mod index;
mod store;

pub use builder::{build_index, BuildProgress};
pub use index::{FlatL2Index, Neighbor};
pub use store::{StoreManifest, VectorStore, INDEX_FILE, MANIFEST_FILE, METADATA_FILE};

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Tensor error: {0}")]
    Tensor(#[from] candle_core::Error),

    /// A vector does not have the index dimension.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Index, metadata and manifest disagree.
    #[error("Inconsistent vector store: {0}")]
    Inconsistent(String),

    /// The store was built with a different embedding model.
    #[error(
        "Vector store was built with embedding model '{stored}' but '{configured}' is configured; rebuild the index or change the model"
    )]
    ModelMismatch { stored: String, configured: String },

    #[error("Embedding failed: {0}")]
    Embedding(#[from] flick_core::EmbeddingError),

    /// Nothing left to index after formatting.
    #[error("No movies to index")]
    EmptyCorpus,
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        StoreError::Json {
            path: path.into(),
            source,
        }
    }
}
