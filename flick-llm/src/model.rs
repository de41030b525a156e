//! Quantized llama-family chat model loaded from a GGUF file.

use candle_core::quantized::gguf_file;
use candle_core::{Device, Tensor};
use candle_transformers::generation::LogitsProcessor;
use candle_transformers::models::quantized_llama::ModelWeights;
use flick_core::{ChatMessage, ChatModel, ChatResult, GenerationBudget};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Instant;
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

use crate::error::{LlmError, Result};
use crate::template::ChatTemplate;

/// Longest sequence the quantized llama rotary tables cover.
pub const MAX_SEQUENCE_LENGTH: usize = 4096;

/// How a [`GgufChatModel`] is located and sampled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmSettings {
    pub model_path: PathBuf,
    pub tokenizer_path: PathBuf,
    /// `None` reads the template from the GGUF metadata.
    pub template: Option<ChatTemplate>,
    /// `0.0` means greedy decoding.
    pub temperature: f64,
    pub top_p: Option<f64>,
    pub seed: u64,
    pub repeat_penalty: f32,
    pub repeat_last_n: usize,
}

impl LlmSettings {
    pub const DEFAULT_TEMPERATURE: f64 = 0.2;
    pub const DEFAULT_TOP_P: f64 = 0.95;
    pub const DEFAULT_SEED: u64 = 299_792_458;

    pub fn new(model_path: impl Into<PathBuf>, tokenizer_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            tokenizer_path: tokenizer_path.into(),
            template: None,
            temperature: Self::DEFAULT_TEMPERATURE,
            top_p: Some(Self::DEFAULT_TOP_P),
            seed: Self::DEFAULT_SEED,
            repeat_penalty: 1.1,
            repeat_last_n: 64,
        }
    }

    pub fn with_template(mut self, template: ChatTemplate) -> Self {
        self.template = Some(template);
        self
    }
}

/// A local chat model.
///
/// Weights are loaded once. Every [`ChatModel::chat`] call works on its own
/// clone of them (the quantized tensors are shared, only the KV cache is
/// per-call), so concurrent requests never see each other's state.
pub struct GgufChatModel {
    weights: ModelWeights,
    tokenizer: Tokenizer,
    template: ChatTemplate,
    stop_ids: Vec<u32>,
    trained_context: usize,
    settings: LlmSettings,
    device: Device,
    name: String,
}

impl GgufChatModel {
    pub fn load(settings: LlmSettings) -> Result<Self> {
        let started = Instant::now();
        info!("Loading the model from {}", settings.model_path.display());

        for path in [&settings.model_path, &settings.tokenizer_path] {
            if !path.is_file() {
                return Err(LlmError::FileNotFound { path: path.clone() });
            }
        }

        let device = select_device();
        let load_error = |message: String| LlmError::Load {
            path: settings.model_path.clone(),
            message,
        };

        let mut file = std::fs::File::open(&settings.model_path)?;
        let content = gguf_file::Content::read(&mut file).map_err(|e| load_error(e.to_string()))?;

        let architecture = metadata_string(&content, "general.architecture").unwrap_or_default();
        if architecture != "llama" {
            return Err(load_error(format!(
                "unsupported architecture '{}', expected llama",
                architecture
            )));
        }

        let template = match settings.template {
            Some(template) => template,
            None => metadata_string(&content, "tokenizer.chat_template")
                .as_deref()
                .and_then(ChatTemplate::detect)
                .ok_or_else(|| LlmError::UnknownTemplate {
                    path: settings.model_path.clone(),
                })?,
        };

        let trained_context = content
            .metadata
            .get("llama.context_length")
            .and_then(|v| v.to_u32().ok())
            .map_or(MAX_SEQUENCE_LENGTH, |n| n as usize)
            .min(MAX_SEQUENCE_LENGTH);
        let gguf_eos = content
            .metadata
            .get("tokenizer.ggml.eos_token_id")
            .and_then(|v| v.to_u32().ok());

        let weights = ModelWeights::from_gguf(content, &mut file, &device)
            .map_err(|e| load_error(e.to_string()))?;

        let tokenizer = Tokenizer::from_file(&settings.tokenizer_path)?;
        let mut stop_ids: Vec<u32> = template
            .stop_tokens()
            .iter()
            .filter_map(|token| tokenizer.token_to_id(token))
            .collect();
        stop_ids.extend(gguf_eos);
        stop_ids.sort_unstable();
        stop_ids.dedup();
        if stop_ids.is_empty() {
            warn!(
                "No stop token found for the {} template; generation runs to max_tokens",
                template
            );
        }

        let name = settings
            .model_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| settings.model_path.display().to_string());

        info!(
            "Model loaded in {:.2} seconds on {}",
            started.elapsed().as_secs_f64(),
            if device.is_cpu() { "CPU" } else { "GPU" }
        );
        debug!(
            "template={}, context={}, stop_ids={:?}",
            template, trained_context, stop_ids
        );

        Ok(Self {
            weights,
            tokenizer,
            template,
            stop_ids,
            trained_context,
            settings,
            device,
            name,
        })
    }

    pub fn template(&self) -> ChatTemplate {
        self.template
    }

    /// Generate a completion for an already rendered prompt.
    pub fn generate(&self, prompt: &str, budget: GenerationBudget) -> Result<String> {
        let started = Instant::now();
        let context_window = budget.context_window.min(self.trained_context);

        let prompt_tokens = self.tokenizer.encode(prompt, false)?.get_ids().to_vec();
        if prompt_tokens.len() >= context_window {
            return Err(LlmError::ContextOverflow {
                prompt_tokens: prompt_tokens.len(),
                context_window,
            });
        }
        let max_tokens = budget.max_tokens.min(context_window - prompt_tokens.len());
        debug!(
            "Performing inference: {} prompt tokens, up to {} new tokens",
            prompt_tokens.len(),
            max_tokens
        );

        let mut weights = self.weights.clone();
        let temperature = (self.settings.temperature > 0.0).then_some(self.settings.temperature);
        let mut sampler =
            LogitsProcessor::new(self.settings.seed, temperature, self.settings.top_p);

        let mut all_tokens = prompt_tokens.clone();
        let mut generated: Vec<u32> = Vec::with_capacity(max_tokens);
        let mut input = Tensor::new(prompt_tokens.as_slice(), &self.device)?.unsqueeze(0)?;
        let mut position = 0;

        while generated.len() < max_tokens {
            let logits = weights.forward(&input, position)?.squeeze(0)?;
            let logits = self.penalize(&logits, &all_tokens)?;
            position += input.dim(1)?;

            let next = sampler.sample(&logits)?;
            if self.stop_ids.contains(&next) {
                break;
            }
            generated.push(next);
            all_tokens.push(next);
            input = Tensor::new(&[next], &self.device)?.unsqueeze(0)?;
        }

        let text = self.tokenizer.decode(&generated, false)?;
        info!(
            "LLM inference completed in {:.2} seconds ({} tokens)",
            started.elapsed().as_secs_f64(),
            generated.len()
        );
        Ok(text)
    }

    fn penalize(&self, logits: &Tensor, context: &[u32]) -> Result<Tensor> {
        if self.settings.repeat_penalty == 1.0 {
            return Ok(logits.clone());
        }
        let start = context.len().saturating_sub(self.settings.repeat_last_n);
        Ok(candle_transformers::utils::apply_repeat_penalty(
            logits,
            self.settings.repeat_penalty,
            &context[start..],
        )?)
    }
}

impl ChatModel for GgufChatModel {
    fn chat(&self, messages: &[ChatMessage], budget: GenerationBudget) -> ChatResult<String> {
        let prompt = self.template.render(messages);
        Ok(self.generate(&prompt, budget)?)
    }

    fn model_name(&self) -> &str {
        &self.name
    }
}

fn metadata_string(content: &gguf_file::Content, key: &str) -> Option<String> {
    content
        .metadata
        .get(key)
        .and_then(|v| v.to_string().ok())
        .cloned()
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_settings_defaults() {
        let settings = LlmSettings::new("models/r1.gguf", "models/tokenizer.json");
        assert_eq!(settings.template, None);
        assert_eq!(settings.temperature, LlmSettings::DEFAULT_TEMPERATURE);
        assert_eq!(settings.top_p, Some(0.95));

        let settings = settings.with_template(ChatTemplate::DeepSeek);
        assert_eq!(settings.template, Some(ChatTemplate::DeepSeek));
    }

    #[test]
    fn test_load_missing_model() {
        let err = GgufChatModel::load(LlmSettings::new("/no/model.gguf", "/no/tokenizer.json"))
            .err()
            .unwrap();
        assert!(matches!(err, LlmError::FileNotFound { ref path } if path.ends_with("model.gguf")));
    }

    #[test]
    fn test_load_missing_tokenizer() {
        let dir = tempdir().unwrap();
        let model = dir.path().join("model.gguf");
        fs::write(&model, b"GGUF").unwrap();

        let err = GgufChatModel::load(LlmSettings::new(&model, dir.path().join("tokenizer.json")))
            .err()
            .unwrap();
        assert!(matches!(
            err,
            LlmError::FileNotFound { ref path } if path.ends_with("tokenizer.json")
        ));
    }

    #[test]
    fn test_load_rejects_non_gguf() {
        let dir = tempdir().unwrap();
        let model = dir.path().join("model.gguf");
        let tokenizer = dir.path().join("tokenizer.json");
        fs::write(&model, b"definitely not a gguf file").unwrap();
        fs::write(&tokenizer, b"{}").unwrap();

        let err = GgufChatModel::load(LlmSettings::new(&model, &tokenizer))
            .err()
            .unwrap();
        assert!(matches!(err, LlmError::Load { .. }));
    }
}
