//! Flick Server - retrieval, explanation and the web front end.
//!
//! This library provides:
//! - Storage: the flat L2 index, the persisted vector store and the index build
//! - Recommend: nearest-neighbour retrieval and the LLM explainer
//! - Server: the axum front end

pub mod recommend;
pub mod server;
pub mod storage;

pub use recommend::{
    Explainer, Explanation, RecommendError, RecommendationResult, Recommender,
    MISSING_ANSWER_MESSAGE,
};
pub use server::{create_router, serve, AppState, ChatLoader, LlmHandle};
pub use storage::{build_index, FlatL2Index, StoreError, StoreManifest, VectorStore};
