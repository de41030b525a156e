//! Flick configuration loading from `.flickrc.toml`.
//!
//! Configuration is optional. Every setting has a default, and command-line
//! flags or `FLICK_*` environment variables override what the file says.
//!
//! # Example Configuration
//!
//! ```toml
//! [dataset]
//! raw_csv = "data/movie_dataset.csv"
//! cleaned_csv = "data/cleaned_movie_dataset.csv"
//!
//! [embeddings]
//! model = "sentence-transformers/all-MiniLM-L6-v2"
//! batch_size = 32
//!
//! [store]
//! directory = "vector_store"
//!
//! [llm]
//! model_path = "models/DeepSeek-R1-Distill-Qwen-1.5B-Q4_K_M.gguf"
//! tokenizer_path = "models/tokenizer.json"
//! template = "deepseek"
//!
//! [server]
//! host = "127.0.0.1"
//! port = 5000
//!
//! [output]
//! format = "table"
//! color = true
//! ```

use flick_llm::{ChatTemplate, LlmSettings};
use flick_server::recommend::DEFAULT_REASONING_MARKER;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = ".flickrc.toml";

/// Root configuration structure loaded from `.flickrc.toml`.
///
/// All sections are optional and will use defaults if not specified.
#[derive(Debug, Deserialize, Default)]
pub struct FlickConfig {
    /// Raw and cleaned CSV locations.
    #[serde(default)]
    pub dataset: DatasetConfig,

    /// Sentence embedding model used for indexing and queries.
    #[serde(default)]
    pub embeddings: EmbeddingsConfig,

    /// Where the vector store lives.
    #[serde(default)]
    pub store: StoreConfig,

    /// Local language model for explanations.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Web front end.
    #[serde(default)]
    pub server: ServerConfig,

    /// Output formatting preferences.
    #[serde(default)]
    pub output: OutputSettings,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// CSV as downloaded, input to `flick clean`.
    pub raw_csv: PathBuf,
    /// Output of `flick clean`, input to `flick index`.
    pub cleaned_csv: PathBuf,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            raw_csv: PathBuf::from("data/movie_dataset.csv"),
            cleaned_csv: PathBuf::from("data/cleaned_movie_dataset.csv"),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EmbeddingsConfig {
    /// Hugging Face repo id or a local directory with
    /// `config.json`, `tokenizer.json` and `model.safetensors`.
    pub model: String,
    /// Texts embedded per forward pass while indexing.
    pub batch_size: usize,
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            model: flick_embeddings::DEFAULT_MODEL.to_string(),
            batch_size: 32,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub directory: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("vector_store"),
        }
    }
}

/// Language model settings.
///
/// Without `model_path` the explain command and the LLM page report the
/// model as unavailable.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Quantized GGUF checkpoint.
    pub model_path: Option<PathBuf>,

    /// `tokenizer.json` matching the checkpoint.
    ///
    /// Defaults to `tokenizer.json` next to the checkpoint.
    pub tokenizer_path: Option<PathBuf>,

    /// `chatml`, `llama3` or `deepseek`. Detected from the checkpoint when unset.
    pub template: Option<String>,

    pub temperature: f64,
    pub top_p: Option<f64>,
    pub seed: u64,

    /// Text after which the model's final answer starts.
    pub reasoning_marker: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            tokenizer_path: None,
            template: None,
            temperature: LlmSettings::DEFAULT_TEMPERATURE,
            top_p: Some(LlmSettings::DEFAULT_TOP_P),
            seed: LlmSettings::DEFAULT_SEED,
            reasoning_marker: DEFAULT_REASONING_MARKER.to_string(),
        }
    }
}

impl LlmConfig {
    /// Build model settings for `model_path`, falling back to the
    /// configured tokenizer or a `tokenizer.json` beside the checkpoint.
    pub fn settings(
        &self,
        model_path: PathBuf,
        tokenizer_path: Option<PathBuf>,
    ) -> anyhow::Result<LlmSettings> {
        let tokenizer_path = tokenizer_path
            .or_else(|| self.tokenizer_path.clone())
            .unwrap_or_else(|| {
                model_path
                    .parent()
                    .unwrap_or_else(|| Path::new("."))
                    .join("tokenizer.json")
            });

        let mut settings = LlmSettings::new(model_path, tokenizer_path);
        if let Some(name) = &self.template {
            let template: ChatTemplate = name.parse().map_err(anyhow::Error::msg)?;
            settings = settings.with_template(template);
        }
        settings.temperature = self.temperature;
        settings.top_p = self.top_p;
        settings.seed = self.seed;
        Ok(settings)
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Load the language model before accepting requests.
    pub preload_llm: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            preload_llm: false,
        }
    }
}

/// Output formatting preferences.
///
/// Command-line flags (e.g., `--format json`) override these settings.
#[derive(Debug, Deserialize, Default)]
pub struct OutputSettings {
    /// Default output format for CLI commands.
    ///
    /// Valid values: `table`, `json`
    /// Default: `table`
    #[serde(default)]
    pub format: Option<String>,

    /// Whether to use colored output.
    ///
    /// Defaults to `true` when stdout is a TTY.
    #[serde(default)]
    pub color: Option<bool>,
}

impl FlickConfig {
    /// Load configuration from `path`, or from `.flickrc.toml` in the
    /// working directory when no path is given.
    ///
    /// A missing default file is not an error. Unreadable or unparsable files
    /// are logged as warnings and defaults are used.
    pub fn load(path: Option<&Path>) -> Self {
        let (config_path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(CONFIG_FILE), false),
        };

        if !config_path.exists() {
            if explicit {
                tracing::warn!(
                    "Config file {} not found, using defaults",
                    config_path.display()
                );
            }
            return Self::default();
        }

        match std::fs::read_to_string(&config_path) {
            Ok(content) => match Self::parse(&content) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}", config_path.display(), e);
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", config_path.display(), e);
            }
        }
        Self::default()
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Get the default output format from config.
    pub fn default_format(&self) -> Option<&str> {
        self.output.format.as_deref()
    }

    /// Get the color setting from config.
    pub fn use_color(&self) -> Option<bool> {
        self.output.color
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = FlickConfig::default();
        assert_eq!(config.store.directory, PathBuf::from("vector_store"));
        assert_eq!(config.embeddings.batch_size, 32);
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.llm.reasoning_marker, "</think>");
        assert!(config.llm.model_path.is_none());
    }

    #[test]
    fn test_partial_sections_keep_defaults() {
        let config = FlickConfig::parse(
            r#"
            [server]
            port = 8080

            [embeddings]
            model = "models/minilm"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.embeddings.model, "models/minilm");
        assert_eq!(config.embeddings.batch_size, 32);
    }

    #[test]
    fn test_invalid_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[server\nport = ").unwrap();

        let config = FlickConfig::load(Some(&path));
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn test_llm_settings_default_tokenizer_beside_checkpoint() {
        let config = LlmConfig::default();
        let settings = config
            .settings(PathBuf::from("models/chat.gguf"), None)
            .unwrap();
        assert_eq!(settings.tokenizer_path, PathBuf::from("models/tokenizer.json"));
        assert!(settings.template.is_none());
    }

    #[test]
    fn test_llm_settings_reject_unknown_template() {
        let config = LlmConfig {
            template: Some("alpaca".to_string()),
            ..LlmConfig::default()
        };
        assert!(config.settings(PathBuf::from("m.gguf"), None).is_err());
    }
}
