use flick_core::{EmbeddingModel, MovieRecord};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use super::{RecommendError, Result};
use crate::storage::{StoreError, VectorStore};

/// A retrieved movie and its squared L2 distance from the query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationResult {
    /// Row of the movie in the store.
    pub position: usize,
    pub movie: MovieRecord,
    pub distance: f32,
}

/// Nearest-neighbour retrieval over a loaded store.
///
/// The store and embedder are shared; a `Recommender` is cheap to clone and
/// safe to use from several threads.
#[derive(Clone)]
pub struct Recommender {
    store: Arc<VectorStore>,
    embedder: Arc<dyn EmbeddingModel>,
}

impl Recommender {
    /// Pair a store with the model that will encode queries.
    ///
    /// Fails when the model is not the one the store was built with, or its
    /// vectors have a different dimension.
    pub fn new(store: VectorStore, embedder: Arc<dyn EmbeddingModel>) -> Result<Self> {
        store.ensure_model(embedder.model_name())?;
        if embedder.dimension() != store.index().dimension() {
            return Err(StoreError::DimensionMismatch {
                expected: store.index().dimension(),
                actual: embedder.dimension(),
            }
            .into());
        }
        Ok(Self {
            store: Arc::new(store),
            embedder,
        })
    }

    pub fn store(&self) -> &VectorStore {
        &self.store
    }

    pub fn embedder(&self) -> &Arc<dyn EmbeddingModel> {
        &self.embedder
    }

    /// Up to `top_n` movies nearest to `query`, nearest first.
    pub fn recommend(&self, query: &str, top_n: usize) -> Result<Vec<RecommendationResult>> {
        if top_n == 0 {
            return Err(RecommendError::InvalidTopN(0));
        }
        if query.trim().is_empty() {
            return Err(RecommendError::EmptyQuery);
        }

        let vector = self.embedder.embed(query)?;
        let hits = self.store.index().search(&vector, top_n)?;
        debug!("Query matched {} movies", hits.len());

        hits.into_iter()
            .map(|hit| {
                let movie = self.store.movie(hit.position).ok_or_else(|| {
                    StoreError::Inconsistent(format!("no metadata for row {}", hit.position))
                })?;
                Ok(RecommendationResult {
                    position: hit.position,
                    movie: movie.clone(),
                    distance: hit.distance,
                })
            })
            .collect()
    }
}
