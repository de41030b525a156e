//! Serve command - the web front end
//!
//! Opens the vector store and embedding model up front. The language model
//! is loaded on the first LLM request unless `--preload-llm` is given.

use anyhow::{Context, Result};
use colored::Colorize;
use flick_core::{ChatError, ChatModel};
use flick_llm::GgufChatModel;
use flick_server::{AppState, ChatLoader, LlmHandle};
use std::sync::Arc;
use tracing::info;

use super::{load_recommender, LlmArgs, RetrievalArgs};
use crate::config::FlickConfig;

pub async fn run(
    host: Option<String>,
    port: Option<u16>,
    preload_llm: bool,
    retrieval: RetrievalArgs,
    llm: LlmArgs,
    config: &FlickConfig,
) -> Result<()> {
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);
    let preload = preload_llm || config.server.preload_llm;

    let addr = tokio::net::lookup_host((host.as_str(), port))
        .await
        .with_context(|| format!("Failed to resolve {}:{}", host, port))?
        .next()
        .with_context(|| format!("No address found for {}:{}", host, port))?;

    let recommender = load_recommender(&retrieval, config).await?;
    let movies = recommender.store().len();
    let model = recommender.embedder().model_name().to_string();

    let settings = llm.settings(config)?;
    let llm_label = settings
        .as_ref()
        .map(|s| s.model_path.display().to_string());
    let handle = match settings {
        Some(settings) => {
            let loader: ChatLoader = Arc::new(move || {
                info!("Loading language model {}", settings.model_path.display());
                GgufChatModel::load(settings.clone())
                    .map(|model| Arc::new(model) as Arc<dyn ChatModel>)
                    .map_err(ChatError::from)
            });
            LlmHandle::new(loader)
        }
        None => LlmHandle::disabled(),
    };

    let state = AppState::new(recommender, handle)
        .with_reasoning_marker(config.llm.reasoning_marker.clone());

    // Print startup banner
    println!();
    println!("  {} Flick v{}", "▲".cyan(), env!("CARGO_PKG_VERSION"));
    println!();
    println!("  {} {}", "→".green(), format!("http://{}", addr).cyan());
    println!();
    println!("  {} {} movies embedded with {}", "◆".yellow(), movies, model);
    let llm_line = match &llm_label {
        Some(path) if preload => format!("Language model {} (preloaded)", path),
        Some(path) => format!("Language model {} (loaded on first use)", path),
        None => "Language model not configured".to_string(),
    };
    println!("  {} {}", "◆".yellow(), llm_line);
    println!();
    println!("  {}", "Endpoints:".dimmed());
    println!("    GET  /                        Landing page");
    println!("    GET  /health                  Health check");
    println!("    GET  /recommend_movies        Similarity search form");
    println!("    GET  /recommend_movies_llm    Explained recommendations form");
    println!();
    println!("  Press {} to stop", "Ctrl+C".yellow());
    println!();

    flick_server::serve(state, addr, preload).await
}
