//! Web front end.
//!
//! An axum server with a landing page and two forms:
//! - `/recommend_movies`: nearest movies as a table
//! - `/recommend_movies_llm`: the same movies explained by the language model

mod http;
pub mod pages;
mod state;

pub use http::{create_router, RecommendForm};
pub use state::{AppState, ChatLoader, LlmHandle};

use anyhow::{Context, Result};
use std::net::SocketAddr;
use tracing::info;

/// Serve until Ctrl-C. With `preload_llm` the language model is loaded
/// before the listener opens.
pub async fn serve(state: AppState, addr: SocketAddr, preload_llm: bool) -> Result<()> {
    if preload_llm && state.llm.is_configured() {
        state
            .llm
            .get()
            .await
            .context("Failed to preload the language model")?;
    }

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on http://{}", listener.local_addr()?);

    let llm = state.llm.clone();
    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if llm.is_loaded() {
        info!("Releasing the language model");
    }
    drop(llm);
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
