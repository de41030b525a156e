//! Retrieval and explanation.
//!
//! [`Recommender`] turns a free-text description into the nearest movies of
//! a [`VectorStore`](crate::storage::VectorStore). [`Explainer`] hands those
//! movies to a chat model and returns its narrative.

mod explainer;
mod prompts;
mod recommender;

pub use explainer::{
    extract_answer, Explainer, Explanation, DEFAULT_REASONING_MARKER, MISSING_ANSWER_MESSAGE,
};
pub use prompts::{build_user_prompt, SYSTEM_PROMPT};
pub use recommender::{RecommendationResult, Recommender};

use thiserror::Error;

use crate::storage::StoreError;

pub type Result<T> = std::result::Result<T, RecommendError>;

#[derive(Error, Debug)]
pub enum RecommendError {
    /// Requested result count is not a positive integer.
    #[error("Number of recommendations must be a positive integer, got {0}")]
    InvalidTopN(i64),

    #[error("Movie description must not be empty")]
    EmptyQuery,

    /// Store and embedding model cannot be used together.
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Embedding failed: {0}")]
    Embedding(#[from] flick_core::EmbeddingError),

    #[error("Formatting failed: {0}")]
    Format(#[from] flick_core::CoreError),

    #[error("Language model failed: {0}")]
    Chat(#[from] flick_core::ChatError),
}

impl RecommendError {
    /// True when the caller supplied bad input rather than the system failing.
    pub fn is_user_error(&self) -> bool {
        matches!(self, RecommendError::InvalidTopN(_) | RecommendError::EmptyQuery)
    }
}
