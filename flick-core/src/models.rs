//! Model seams shared by the indexer, the recommender and the explainer.
//!
//! The traits live here rather than next to their users so the model crates
//! (`flick-embeddings`, `flick-llm`) can implement them without depending on
//! the server crate.

use serde::{Deserialize, Serialize};

/// Error type for embedding operations.
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    /// Model not loaded or initialized
    #[error("model not loaded: {0}")]
    ModelNotLoaded(String),

    /// Failed to generate embedding
    #[error("embedding failed: {0}")]
    EmbeddingFailed(String),

    #[error("{0}")]
    Other(String),
}

pub type EmbeddingResult<T> = std::result::Result<T, EmbeddingError>;

/// A model that maps text to fixed-length vectors.
///
/// Index and queries must be encoded by the same model; [`model_name`] is
/// what the vector store records to check that.
///
/// [`model_name`]: EmbeddingModel::model_name
pub trait EmbeddingModel: Send + Sync {
    /// Generate an embedding vector for the given text.
    fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>>;

    /// Generate embeddings for multiple texts, one vector per input in order.
    ///
    /// Default implementation calls `embed` for each text.
    fn embed_batch(&self, texts: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    /// Get the dimension of the embedding vectors.
    fn dimension(&self) -> usize;

    /// Get the model name/identifier.
    fn model_name(&self) -> &str;
}

/// Error type for chat generation.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("model not loaded: {0}")]
    ModelNotLoaded(String),

    /// The rendered prompt does not leave room in the context window.
    #[error("prompt of {prompt_tokens} tokens does not fit a context window of {context_window}")]
    ContextOverflow {
        prompt_tokens: usize,
        context_window: usize,
    },

    #[error("generation failed: {0}")]
    GenerationFailed(String),
}

pub type ChatResult<T> = std::result::Result<T, ChatError>;

/// Speaker of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Token budget for a single generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationBudget {
    /// Prompt plus completion tokens the model may hold.
    pub context_window: usize,
    /// Upper bound on generated tokens.
    pub max_tokens: usize,
}

impl GenerationBudget {
    /// Tokens reserved for the instructions and the user description.
    pub const BASE_CONTEXT: usize = 1000;
    /// Context tokens per listed movie.
    pub const CONTEXT_PER_ITEM: usize = 500;
    /// Completion tokens per listed movie.
    pub const TOKENS_PER_ITEM: usize = 100;

    /// Budget for a prompt listing `items` movies.
    pub fn for_items(items: usize) -> Self {
        Self {
            context_window: Self::BASE_CONTEXT + Self::CONTEXT_PER_ITEM * items,
            max_tokens: Self::TOKENS_PER_ITEM * items,
        }
    }
}

/// A conversational text generator.
pub trait ChatModel: Send + Sync {
    /// Generate the assistant reply to `messages`.
    fn chat(&self, messages: &[ChatMessage], budget: GenerationBudget) -> ChatResult<String>;

    fn model_name(&self) -> &str;
}
