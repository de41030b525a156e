//! Model resolution: local directories first, the Hugging Face hub otherwise.

use crate::error::{EmbeddingError, Result};
use crate::model::{ModelFiles, SentenceModel};
use hf_hub::api::tokio::Api;
use std::path::Path;
use tracing::info;

impl SentenceModel {
    /// Download (or reuse the cached copy of) a hub repository and load it.
    pub async fn from_hub(repo_id: &str) -> Result<Self> {
        info!("Fetching {} from the Hugging Face hub", repo_id);

        let api = Api::new().map_err(|e| EmbeddingError::Download {
            repo: repo_id.to_string(),
            file: String::new(),
            message: e.to_string(),
        })?;
        let repo = api.model(repo_id.to_string());
        let repo = &repo;

        let fetch = move |file: &'static str| {
            async move {
                repo.get(file).await.map_err(|e| EmbeddingError::Download {
                    repo: repo_id.to_string(),
                    file: file.to_string(),
                    message: e.to_string(),
                })
            }
        };

        let files = ModelFiles {
            config: fetch(ModelFiles::CONFIG).await?,
            tokenizer: fetch(ModelFiles::TOKENIZER).await?,
            weights: fetch(ModelFiles::WEIGHTS).await?,
        };

        let name = repo_id.to_string();
        tokio_blocking(move || SentenceModel::from_files(&files, name)).await
    }

    /// Load `identifier` as a local directory when one exists, as a hub
    /// repository id otherwise.
    ///
    /// The identifier is kept as the model name, so an index built from
    /// `sentence-transformers/all-MiniLM-L6-v2` must be queried with the same
    /// identifier.
    pub async fn resolve(identifier: &str) -> Result<Self> {
        if Path::new(identifier).is_dir() {
            let files = ModelFiles::in_dir(identifier);
            let name = identifier.to_string();
            return tokio_blocking(move || SentenceModel::from_files(&files, name)).await;
        }
        if !looks_like_repo_id(identifier) {
            return Err(EmbeddingError::ModelNotFound {
                path: identifier.to_string(),
            });
        }
        Self::from_hub(identifier).await
    }
}

/// `owner/name` or a bare `name`, without path separators beyond one slash.
fn looks_like_repo_id(identifier: &str) -> bool {
    let parts: Vec<&str> = identifier.split('/').collect();
    !identifier.is_empty()
        && parts.len() <= 2
        && parts.iter().all(|p| {
            !p.is_empty()
                && *p != "."
                && *p != ".."
                && p.chars().all(|c| c.is_ascii_alphanumeric() || "-_.".contains(c))
        })
}

async fn tokio_blocking<F>(load: F) -> Result<SentenceModel>
where
    F: FnOnce() -> Result<SentenceModel> + Send + 'static,
{
    tokio::task::spawn_blocking(load)
        .await
        .map_err(|e| EmbeddingError::Weights {
            message: format!("model loading task failed: {}", e),
        })?
}
