//! Shared application state for the server.

use flick_core::{ChatError, ChatModel, ChatResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::OnceCell;
use tracing::info;

use crate::recommend::{Recommender, DEFAULT_REASONING_MARKER};

/// Builds the chat model. Runs on a blocking thread.
pub type ChatLoader = Arc<dyn Fn() -> ChatResult<Arc<dyn ChatModel>> + Send + Sync>;

/// Lazily loaded language model, initialised at most once.
pub struct LlmHandle {
    cell: OnceCell<Arc<dyn ChatModel>>,
    loader: Option<ChatLoader>,
    loads: AtomicUsize,
}

impl LlmHandle {
    pub fn new(loader: ChatLoader) -> Self {
        Self {
            cell: OnceCell::new(),
            loader: Some(loader),
            loads: AtomicUsize::new(0),
        }
    }

    /// A handle with no model behind it; every request reports it.
    pub fn disabled() -> Self {
        Self {
            cell: OnceCell::new(),
            loader: None,
            loads: AtomicUsize::new(0),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.loader.is_some()
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }

    /// Number of times the loader has run.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// The model, loading it on first use. Concurrent callers wait for the
    /// same load; a failed load is retried by the next caller.
    pub async fn get(&self) -> ChatResult<Arc<dyn ChatModel>> {
        let model = self
            .cell
            .get_or_try_init(|| async {
                let loader = self.loader.clone().ok_or_else(|| {
                    ChatError::ModelNotLoaded("no language model configured".to_string())
                })?;
                self.loads.fetch_add(1, Ordering::SeqCst);

                let started = Instant::now();
                let model = tokio::task::spawn_blocking(move || loader())
                    .await
                    .map_err(|e| ChatError::ModelNotLoaded(format!("loader task failed: {}", e)))??;
                info!(
                    "Language model {} ready in {:.2}s",
                    model.model_name(),
                    started.elapsed().as_secs_f64()
                );
                Ok::<_, ChatError>(model)
            })
            .await?;
        Ok(Arc::clone(model))
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Retrieval over the loaded store
    pub recommender: Recommender,
    /// Language model for narrative recommendations
    pub llm: Arc<LlmHandle>,
    /// Marker closing the model's reasoning block
    pub reasoning_marker: String,
}

impl AppState {
    pub fn new(recommender: Recommender, llm: LlmHandle) -> Self {
        Self {
            recommender,
            llm: Arc::new(llm),
            reasoning_marker: DEFAULT_REASONING_MARKER.to_string(),
        }
    }

    pub fn with_reasoning_marker(mut self, marker: impl Into<String>) -> Self {
        self.reasoning_marker = marker.into();
        self
    }
}
