//! Offline index build: format, embed, index.

use flick_core::{format_corpus, EmbeddingModel, MovieRecord};
use std::time::Instant;
use tracing::{debug, info};

use super::index::FlatL2Index;
use super::store::VectorStore;
use super::{Result, StoreError};

/// Progress of an index build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildProgress {
    pub embedded: usize,
    pub total: usize,
}

/// Embed every formattable movie with `embedder` and build the store.
///
/// Rows that fail to format are skipped before embedding so index and
/// metadata stay aligned. Any embedding failure aborts the build.
pub fn build_index<F>(
    records: Vec<MovieRecord>,
    embedder: &dyn EmbeddingModel,
    batch_size: usize,
    mut progress: F,
) -> Result<VectorStore>
where
    F: FnMut(BuildProgress),
{
    let start = Instant::now();
    let corpus = format_corpus(records);
    if corpus.is_empty() {
        return Err(StoreError::EmptyCorpus);
    }
    info!(
        "Embedding {} movies with {} ({} skipped)",
        corpus.len(),
        embedder.model_name(),
        corpus.skipped
    );

    let dimension = embedder.dimension();
    let mut index = FlatL2Index::new(dimension);
    let total = corpus.len();
    let batch_size = batch_size.max(1);

    for batch in corpus.texts.chunks(batch_size) {
        let texts: Vec<&str> = batch.iter().map(String::as_str).collect();
        let vectors = embedder.embed_batch(&texts)?;
        if vectors.len() != texts.len() {
            return Err(StoreError::Inconsistent(format!(
                "embedder returned {} vectors for {} texts",
                vectors.len(),
                texts.len()
            )));
        }
        for vector in &vectors {
            index.add(vector)?;
        }

        debug!("Embedded {}/{}", index.len(), total);
        progress(BuildProgress {
            embedded: index.len(),
            total,
        });
    }

    let store = VectorStore::new(index, corpus.records, embedder.model_name(), corpus.skipped)?;
    info!(
        "Index built: {} vectors of dim {} in {:.2}s",
        store.len(),
        dimension,
        start.elapsed().as_secs_f64()
    );
    Ok(store)
}
