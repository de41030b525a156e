//! Command implementations for the Flick CLI
//!
//! Each command module provides a `run` function that executes the command logic.
//! Loading helpers shared by several commands live here.

pub mod clean;
pub mod explain;
pub mod index;
pub mod recommend;
pub mod serve;
pub mod status;

use anyhow::{bail, Context, Result};
use clap::Args;
use dialoguer::Input;
use flick_core::ChatModel;
use flick_embeddings::SentenceModel;
use flick_llm::{GgufChatModel, LlmSettings};
use flick_server::{Recommender, VectorStore};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::config::FlickConfig;

/// Where the store and the embedding model come from.
#[derive(Args, Debug, Clone, Default)]
pub struct RetrievalArgs {
    /// Embedding model: Hugging Face repo id or local directory
    #[arg(short, long, env = "FLICK_EMBEDDING_MODEL")]
    pub model: Option<String>,

    /// Vector store directory
    #[arg(long, env = "FLICK_STORE_DIR")]
    pub store_dir: Option<PathBuf>,
}

impl RetrievalArgs {
    pub fn model(&self, config: &FlickConfig) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| config.embeddings.model.clone())
    }

    pub fn store_dir(&self, config: &FlickConfig) -> PathBuf {
        self.store_dir
            .clone()
            .unwrap_or_else(|| config.store.directory.clone())
    }
}

/// Where the language model comes from.
#[derive(Args, Debug, Clone, Default)]
pub struct LlmArgs {
    /// Quantized GGUF checkpoint
    #[arg(long = "llm", env = "FLICK_LLM_PATH")]
    pub model_path: Option<PathBuf>,

    /// tokenizer.json for the checkpoint
    #[arg(long = "llm-tokenizer", env = "FLICK_LLM_TOKENIZER")]
    pub tokenizer_path: Option<PathBuf>,
}

impl LlmArgs {
    /// Settings for the configured checkpoint, `None` when there is none.
    pub fn settings(&self, config: &FlickConfig) -> Result<Option<LlmSettings>> {
        let Some(model_path) = self
            .model_path
            .clone()
            .or_else(|| config.llm.model_path.clone())
        else {
            return Ok(None);
        };
        config
            .llm
            .settings(model_path, self.tokenizer_path.clone())
            .map(Some)
    }
}

/// Open the vector store and the embedding model it was built with.
pub async fn load_recommender(args: &RetrievalArgs, config: &FlickConfig) -> Result<Recommender> {
    let store_dir = args.store_dir(config);
    let model = args.model(config);

    let store = VectorStore::load(&store_dir).with_context(|| {
        format!(
            "Failed to open the vector store in {} (run 'flick index' first)",
            store_dir.display()
        )
    })?;
    store.ensure_model(&model)?;

    let embedder = SentenceModel::resolve(&model)
        .await
        .with_context(|| format!("Failed to load embedding model {}", model))?;

    Ok(Recommender::new(store, Arc::new(embedder))?)
}

/// Load the chat model on a blocking thread.
pub async fn load_chat_model(settings: LlmSettings) -> Result<Arc<dyn ChatModel>> {
    let start = Instant::now();
    let path = settings.model_path.display().to_string();
    let model = tokio::task::spawn_blocking(move || GgufChatModel::load(settings))
        .await
        .context("Language model loader panicked")?
        .with_context(|| format!("Failed to load language model {}", path))?;
    info!(
        "Language model ready ({} template) in {:.1}s",
        model.template(),
        start.elapsed().as_secs_f32()
    );
    Ok(Arc::new(model))
}

/// Use `query`, or ask for one on an interactive terminal.
pub fn query_or_prompt(query: Option<String>) -> Result<String> {
    if let Some(query) = query {
        return Ok(query);
    }
    if !std::io::stdin().is_terminal() {
        bail!("No query given. Pass it as an argument.");
    }
    let query: String = Input::new()
        .with_prompt("Describe the movie you want to watch")
        .validate_with(|input: &String| {
            if input.trim().is_empty() {
                Err("Please enter a description")
            } else {
                Ok(())
            }
        })
        .interact_text()?;
    Ok(query)
}

/// Use `num`, or ask for one on an interactive terminal.
pub fn count_or_prompt(num: Option<usize>) -> Result<usize> {
    if let Some(num) = num {
        return Ok(num);
    }
    if !std::io::stdin().is_terminal() {
        bail!("No result count given. Pass it with -n.");
    }
    let num: usize = Input::new()
        .with_prompt("How many movies")
        .default(5)
        .validate_with(|n: &usize| {
            if *n == 0 {
                Err("Enter a positive number")
            } else {
                Ok(())
            }
        })
        .interact_text()?;
    Ok(num)
}
