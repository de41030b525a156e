//! Error types for flick-embeddings.

use thiserror::Error;

/// Result type alias for flick-embeddings operations.
pub type Result<T> = std::result::Result<T, EmbeddingError>;

/// Errors raised while loading or running a sentence embedding model.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// Neither a local directory nor a hub repository matched the identifier.
    #[error("Model not found: {path}")]
    ModelNotFound {
        /// Directory or repository that was looked up.
        path: String,
    },

    /// A model file could not be fetched from the Hugging Face hub.
    #[error("Failed to download {file} from {repo}: {message}")]
    Download {
        /// Repository id.
        repo: String,
        /// File within the repository.
        file: String,
        /// Underlying hub error.
        message: String,
    },

    /// Tokenizer file missing or unusable.
    #[error("Tokenizer error: {message}")]
    Tokenizer {
        /// Description of the tokenizer error.
        message: String,
    },

    /// `config.json` could not be read or describes an unsupported model.
    #[error("Invalid model configuration: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Weights missing or not matching the configuration.
    #[error("Failed to load model weights: {message}")]
    Weights {
        /// Description of the weight loading error.
        message: String,
    },

    /// An empty batch was passed to the model.
    #[error("Empty input: at least one text must be provided")]
    EmptyInput,

    /// Candle tensor operation error.
    #[error("Tensor error: {0}")]
    Tensor(#[from] candle_core::Error),

    /// IO error reading model files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<tokenizers::Error> for EmbeddingError {
    fn from(err: tokenizers::Error) -> Self {
        EmbeddingError::Tokenizer {
            message: err.to_string(),
        }
    }
}

impl From<EmbeddingError> for flick_core::EmbeddingError {
    fn from(err: EmbeddingError) -> Self {
        match err {
            EmbeddingError::ModelNotFound { .. }
            | EmbeddingError::Download { .. }
            | EmbeddingError::Config { .. }
            | EmbeddingError::Weights { .. } => {
                flick_core::EmbeddingError::ModelNotLoaded(err.to_string())
            }
            other => flick_core::EmbeddingError::EmbeddingFailed(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EmbeddingError::Download {
            repo: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            file: "config.json".to_string(),
            message: "offline".to_string(),
        };
        assert!(err.to_string().contains("all-MiniLM-L6-v2"));
        assert!(err.to_string().contains("config.json"));
    }

    #[test]
    fn test_conversion_to_core_error() {
        let err: flick_core::EmbeddingError = EmbeddingError::ModelNotFound {
            path: "/models/minilm".to_string(),
        }
        .into();
        assert!(matches!(err, flick_core::EmbeddingError::ModelNotLoaded(_)));

        let err: flick_core::EmbeddingError = EmbeddingError::EmptyInput.into();
        assert!(matches!(err, flick_core::EmbeddingError::EmbeddingFailed(_)));
    }
}
