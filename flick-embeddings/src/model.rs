//! BERT sentence embedding model.

use crate::error::{EmbeddingError, Result};
use crate::tokenizer::{SentenceTokenizer, TokenBatch};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{
    BertModel, Config as BertConfig, HiddenAct, PositionEmbeddingType,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// The subset of a Hugging Face `config.json` needed to build the encoder.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    pub hidden_size: usize,
    pub num_attention_heads: usize,
    pub num_hidden_layers: usize,
    pub intermediate_size: usize,
    pub vocab_size: usize,
    pub max_position_embeddings: usize,
    #[serde(default = "default_hidden_act")]
    pub hidden_act: String,
    #[serde(default)]
    pub hidden_dropout_prob: f64,
    #[serde(default = "default_type_vocab_size")]
    pub type_vocab_size: usize,
    #[serde(default = "default_layer_norm_eps")]
    pub layer_norm_eps: f64,
    #[serde(default)]
    pub pad_token_id: usize,
}

fn default_hidden_act() -> String {
    "gelu".to_string()
}

fn default_type_vocab_size() -> usize {
    2
}

fn default_layer_norm_eps() -> f64 {
    1e-12
}

impl ModelConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| EmbeddingError::Config {
            message: format!("{}: {}", path.display(), e),
        })
    }

    fn activation(&self) -> Result<HiddenAct> {
        match self.hidden_act.as_str() {
            "gelu" => Ok(HiddenAct::Gelu),
            "gelu_new" | "gelu_approximate" | "gelu_pytorch_tanh" => Ok(HiddenAct::GeluApproximate),
            "relu" => Ok(HiddenAct::Relu),
            other => Err(EmbeddingError::Config {
                message: format!("unsupported activation '{}'", other),
            }),
        }
    }

    fn to_bert_config(&self) -> Result<BertConfig> {
        Ok(BertConfig {
            vocab_size: self.vocab_size,
            hidden_size: self.hidden_size,
            num_hidden_layers: self.num_hidden_layers,
            num_attention_heads: self.num_attention_heads,
            intermediate_size: self.intermediate_size,
            hidden_act: self.activation()?,
            hidden_dropout_prob: self.hidden_dropout_prob,
            max_position_embeddings: self.max_position_embeddings,
            type_vocab_size: self.type_vocab_size,
            initializer_range: 0.02,
            layer_norm_eps: self.layer_norm_eps,
            pad_token_id: self.pad_token_id,
            position_embedding_type: PositionEmbeddingType::Absolute,
            use_cache: false,
            classifier_dropout: None,
            model_type: None,
        })
    }
}

/// Paths of the three files a sentence model is built from.
#[derive(Debug, Clone)]
pub struct ModelFiles {
    pub config: PathBuf,
    pub tokenizer: PathBuf,
    pub weights: PathBuf,
}

impl ModelFiles {
    pub const CONFIG: &'static str = "config.json";
    pub const TOKENIZER: &'static str = "tokenizer.json";
    pub const WEIGHTS: &'static str = "model.safetensors";

    /// The standard file layout inside a model directory.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            config: dir.join(Self::CONFIG),
            tokenizer: dir.join(Self::TOKENIZER),
            weights: dir.join(Self::WEIGHTS),
        }
    }
}

/// Sentence-transformers style encoder: BERT, mean pooling over real
/// tokens, then L2 normalisation.
pub struct SentenceModel {
    model: BertModel,
    tokenizer: SentenceTokenizer,
    config: ModelConfig,
    device: Device,
    name: String,
}

impl SentenceModel {
    /// Load a model from a directory holding `config.json`,
    /// `tokenizer.json` and `model.safetensors`.
    pub fn load(model_dir: impl AsRef<Path>) -> Result<Self> {
        let model_dir = model_dir.as_ref();
        if !model_dir.is_dir() {
            return Err(EmbeddingError::ModelNotFound {
                path: model_dir.display().to_string(),
            });
        }
        Self::from_files(&ModelFiles::in_dir(model_dir), model_dir.display().to_string())
    }

    /// Build a model from explicit file paths. `name` is what
    /// [`flick_core::EmbeddingModel::model_name`] reports.
    pub fn from_files(files: &ModelFiles, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let started = Instant::now();
        info!("Loading embedding model {}", name);

        let config = ModelConfig::from_file(&files.config)?;
        debug!(
            "Model config: hidden_size={}, layers={}",
            config.hidden_size, config.num_hidden_layers
        );

        let tokenizer =
            SentenceTokenizer::from_file(&files.tokenizer, config.max_position_embeddings)?;
        debug!("Tokenizer vocab size: {}", tokenizer.vocab_size());

        let device = select_device();
        debug!("Using device: {:?}", device);

        if !files.weights.exists() {
            return Err(EmbeddingError::Weights {
                message: format!("weights file not found: {}", files.weights.display()),
            });
        }
        let data = std::fs::read(&files.weights)?;
        let tensors = candle_core::safetensors::load_buffer(&data, &device).map_err(|e| {
            EmbeddingError::Weights {
                message: format!("{}: {}", files.weights.display(), e),
            }
        })?;
        let vb = VarBuilder::from_tensors(tensors, DType::F32, &device);
        let model = BertModel::load(vb, &config.to_bert_config()?).map_err(|e| {
            EmbeddingError::Weights {
                message: format!("BERT weights do not match config: {}", e),
            }
        })?;

        info!(
            "Embedding model {} loaded in {:.2}s",
            name,
            started.elapsed().as_secs_f64()
        );
        Ok(Self {
            model,
            tokenizer,
            config,
            device,
            name,
        })
    }

    /// Encode a batch of texts, one normalised vector per text, in order.
    pub fn encode(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let batch = self.tokenizer.encode_batch(texts)?;
        debug!("Encoding {} texts, {} tokens each", batch.rows, batch.seq_len);

        let (input_ids, attention_mask, token_type_ids) = self.to_tensors(batch)?;
        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;

        let pooled = mean_pool(&hidden, &attention_mask)?;
        let normalized = l2_normalize(&pooled)?;
        Ok(normalized.to_vec2::<f32>()?)
    }

    pub fn embedding_dim(&self) -> usize {
        self.config.hidden_size
    }

    fn to_tensors(&self, batch: TokenBatch) -> Result<(Tensor, Tensor, Tensor)> {
        let shape = (batch.rows, batch.seq_len);
        Ok((
            Tensor::from_vec(batch.input_ids, shape, &self.device)?,
            Tensor::from_vec(batch.attention_mask, shape, &self.device)?,
            Tensor::from_vec(batch.token_type_ids, shape, &self.device)?,
        ))
    }
}

fn select_device() -> Device {
    #[cfg(feature = "cuda")]
    {
        if let Ok(device) = Device::new_cuda(0) {
            return device;
        }
    }

    #[cfg(feature = "metal")]
    {
        if let Ok(device) = Device::new_metal(0) {
            return device;
        }
    }

    Device::Cpu
}

/// Average of the token states where the mask is set.
fn mean_pool(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let mask = attention_mask.to_dtype(DType::F32)?.unsqueeze(2)?;
    let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
    let counts = mask.sum(1)?.affine(1.0, 1e-9)?;
    Ok(summed.broadcast_div(&counts)?)
}

fn l2_normalize(vectors: &Tensor) -> Result<Tensor> {
    let norms = vectors.sqr()?.sum_keepdim(1)?.sqrt()?.affine(1.0, 1e-12)?;
    Ok(vectors.broadcast_div(&norms)?)
}

impl flick_core::EmbeddingModel for SentenceModel {
    fn embed(&self, text: &str) -> flick_core::EmbeddingResult<Vec<f32>> {
        self.encode(&[text])?
            .pop()
            .ok_or_else(|| flick_core::EmbeddingError::EmbeddingFailed("empty output".to_string()))
    }

    fn embed_batch(&self, texts: &[&str]) -> flick_core::EmbeddingResult<Vec<Vec<f32>>> {
        Ok(self.encode(texts)?)
    }

    fn dimension(&self) -> usize {
        self.embedding_dim()
    }

    fn model_name(&self) -> &str {
        &self.name
    }
}
