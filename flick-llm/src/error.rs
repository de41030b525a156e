//! Error types for flick-llm.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LlmError>;

#[derive(Error, Debug)]
pub enum LlmError {
    /// GGUF or tokenizer file absent.
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// The GGUF file could not be parsed or describes an unsupported model.
    #[error("Failed to load {}: {message}", path.display())]
    Load { path: PathBuf, message: String },

    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    /// No chat template configured and none recognised in the GGUF metadata.
    #[error("Cannot determine a chat template for {}; set one explicitly", path.display())]
    UnknownTemplate { path: PathBuf },

    #[error("Prompt of {prompt_tokens} tokens does not fit a context window of {context_window}")]
    ContextOverflow {
        prompt_tokens: usize,
        context_window: usize,
    },

    #[error("Inference error: {0}")]
    Inference(#[from] candle_core::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<tokenizers::Error> for LlmError {
    fn from(err: tokenizers::Error) -> Self {
        LlmError::Tokenizer(err.to_string())
    }
}

impl From<LlmError> for flick_core::ChatError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::ContextOverflow {
                prompt_tokens,
                context_window,
            } => flick_core::ChatError::ContextOverflow {
                prompt_tokens,
                context_window,
            },
            LlmError::FileNotFound { .. }
            | LlmError::Load { .. }
            | LlmError::UnknownTemplate { .. } => {
                flick_core::ChatError::ModelNotLoaded(err.to_string())
            }
            other => flick_core::ChatError::GenerationFailed(other.to_string()),
        }
    }
}
