//! On-disk vector store: index, metadata table and manifest.

use candle_core::{Device, Tensor};
use chrono::{DateTime, Utc};
use flick_core::MovieRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::{debug, info};

use super::index::FlatL2Index;
use super::{Result, StoreError};

/// Embedding matrix, one `[count, dimension]` f32 tensor in safetensors.
pub const INDEX_FILE: &str = "movies.index";
/// Metadata table in index order, JSON.
pub const METADATA_FILE: &str = "movies_metadata.json";
pub const MANIFEST_FILE: &str = "manifest.json";

const EMBEDDINGS_TENSOR: &str = "embeddings";

/// Describes how a store was built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreManifest {
    pub embedding_model: String,
    pub dimension: usize,
    pub count: usize,
    /// Rows left out because they could not be formatted.
    #[serde(default)]
    pub skipped_rows: usize,
    pub created_at: DateTime<Utc>,
}

/// Index and metadata, position-aligned.
#[derive(Debug, Clone)]
pub struct VectorStore {
    index: FlatL2Index,
    metadata: Vec<MovieRecord>,
    manifest: StoreManifest,
}

impl VectorStore {
    /// Assemble a store. The index and metadata must have the same length.
    pub fn new(
        index: FlatL2Index,
        metadata: Vec<MovieRecord>,
        embedding_model: impl Into<String>,
        skipped_rows: usize,
    ) -> Result<Self> {
        let manifest = StoreManifest {
            embedding_model: embedding_model.into(),
            dimension: index.dimension(),
            count: index.len(),
            skipped_rows,
            created_at: Utc::now(),
        };
        Self::from_parts(index, metadata, manifest)
    }

    fn from_parts(
        index: FlatL2Index,
        metadata: Vec<MovieRecord>,
        manifest: StoreManifest,
    ) -> Result<Self> {
        if index.len() != metadata.len() {
            return Err(StoreError::Inconsistent(format!(
                "index holds {} vectors but metadata holds {} movies",
                index.len(),
                metadata.len()
            )));
        }
        if manifest.count != index.len() || manifest.dimension != index.dimension() {
            return Err(StoreError::Inconsistent(format!(
                "manifest describes {} x {} but index is {} x {}",
                manifest.count,
                manifest.dimension,
                index.len(),
                index.dimension()
            )));
        }
        Ok(Self {
            index,
            metadata,
            manifest,
        })
    }

    pub fn index(&self) -> &FlatL2Index {
        &self.index
    }

    pub fn metadata(&self) -> &[MovieRecord] {
        &self.metadata
    }

    pub fn manifest(&self) -> &StoreManifest {
        &self.manifest
    }

    pub fn movie(&self, position: usize) -> Option<&MovieRecord> {
        self.metadata.get(position)
    }

    pub fn len(&self) -> usize {
        self.metadata.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty()
    }

    /// Fail unless the store was built with `configured`.
    pub fn ensure_model(&self, configured: &str) -> Result<()> {
        if self.manifest.embedding_model != configured {
            return Err(StoreError::ModelMismatch {
                stored: self.manifest.embedding_model.clone(),
                configured: configured.to_string(),
            });
        }
        Ok(())
    }

    /// Write the store into `dir`, creating it if needed. The manifest is
    /// written last.
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;

        let index_path = dir.join(INDEX_FILE);
        let matrix = Tensor::from_slice(
            self.index.as_flat(),
            (self.index.len(), self.index.dimension()),
            &Device::Cpu,
        )?;
        let tensors = HashMap::from([(EMBEDDINGS_TENSOR.to_string(), matrix)]);
        candle_core::safetensors::save(&tensors, &index_path)?;
        debug!("Index written to {}", index_path.display());

        write_json(&dir.join(METADATA_FILE), &self.metadata)?;
        write_json(&dir.join(MANIFEST_FILE), &self.manifest)?;

        info!(
            "Vector store saved to {} ({} movies, dim {})",
            dir.display(),
            self.len(),
            self.index.dimension()
        );
        Ok(())
    }

    /// Read a store written by [`save`](Self::save) and check that its three
    /// parts agree.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let manifest: StoreManifest = read_json(&dir.join(MANIFEST_FILE))?;

        let index_path = dir.join(INDEX_FILE);
        if !index_path.is_file() {
            return Err(StoreError::io(
                &index_path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "index file missing"),
            ));
        }
        let tensors = candle_core::safetensors::load(&index_path, &Device::Cpu)?;
        let matrix = tensors.get(EMBEDDINGS_TENSOR).ok_or_else(|| {
            StoreError::Inconsistent(format!(
                "{} has no '{}' tensor",
                index_path.display(),
                EMBEDDINGS_TENSOR
            ))
        })?;
        let (_, dimension) = matrix.dims2()?;
        let data = matrix.flatten_all()?.to_vec1::<f32>()?;
        let index = FlatL2Index::from_flat(dimension, data)?;

        let metadata: Vec<MovieRecord> = read_json(&dir.join(METADATA_FILE))?;

        let store = Self::from_parts(index, metadata, manifest)?;
        info!(
            "Loaded vector store from {} ({} movies, model {})",
            dir.display(),
            store.len(),
            store.manifest.embedding_model
        );
        Ok(store)
    }

    /// Read only the manifest, without loading vectors.
    pub fn read_manifest(dir: impl AsRef<Path>) -> Result<StoreManifest> {
        read_json(&dir.as_ref().join(MANIFEST_FILE))
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).map_err(|e| StoreError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, value).map_err(|e| StoreError::json(path, e))?;
    std::io::Write::flush(&mut writer).map_err(|e| StoreError::io(path, e))
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let file = File::open(path).map_err(|e| StoreError::io(path, e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| StoreError::json(path, e))
}
