//! Status command - show the vector store and configuration consistency
//!
//! Reads only the store manifest, so it is fast and needs no model.

use anyhow::Result;
use colored::Colorize;
use flick_server::{StoreManifest, VectorStore};
use serde::Serialize;
use std::path::PathBuf;

use crate::config::{FlickConfig, CONFIG_FILE};
use crate::output::{key_value, Output, OutputConfig, OutputFormat, TableDisplay};

/// Status information for a Flick setup.
#[derive(Debug, Serialize)]
pub struct StatusInfo {
    /// Whether `.flickrc.toml` exists in the working directory
    pub config_exists: bool,
    pub store_dir: String,
    /// Manifest of the store, if one was found
    pub manifest: Option<StoreManifest>,
    /// Embedding model the configuration asks for
    pub configured_model: String,
    /// True when the store was built with the configured model
    pub model_matches: bool,
    pub llm_model: Option<String>,
    /// Recommended next action
    pub next_action: Option<String>,
    pub message: String,
}

impl TableDisplay for StatusInfo {
    fn to_table(&self, config: &OutputConfig) -> String {
        let mut lines = Vec::new();

        let headline = match (&self.manifest, self.model_matches) {
            (Some(_), true) => "Flick Status: Ready".green().bold(),
            (Some(_), false) => "Flick Status: Model mismatch".red().bold(),
            (None, _) => "Flick Status: Not indexed".yellow().bold(),
        };
        lines.push(headline.to_string());

        let mut pairs = vec![("Store", self.store_dir.clone())];
        if let Some(manifest) = &self.manifest {
            pairs.push(("Movies", manifest.count.to_string()));
            pairs.push(("Skipped rows", manifest.skipped_rows.to_string()));
            pairs.push(("Dimension", manifest.dimension.to_string()));
            pairs.push(("Built with", manifest.embedding_model.clone()));
            pairs.push((
                "Built at",
                manifest.created_at.format("%Y-%m-%d %H:%M UTC").to_string(),
            ));
        }
        pairs.push(("Configured", self.configured_model.clone()));
        pairs.push((
            "LLM",
            self.llm_model
                .clone()
                .unwrap_or_else(|| "not configured".to_string()),
        ));
        pairs.push((
            "Config",
            if self.config_exists { "Yes" } else { "No" }.to_string(),
        ));
        lines.push(key_value(&pairs, config));

        lines.push(self.message.clone());
        if let Some(action) = &self.next_action {
            lines.push(format!("{}: {}", "Next action".yellow(), action));
        }

        lines.join("\n")
    }
}

pub fn run(
    store_dir: Option<PathBuf>,
    model: Option<String>,
    config: &FlickConfig,
    format: OutputFormat,
) -> Result<()> {
    let store_dir = store_dir.unwrap_or_else(|| config.store.directory.clone());
    let configured_model = model.unwrap_or_else(|| config.embeddings.model.clone());

    let status = status(store_dir, configured_model, config);
    Output::new(status, format).render()
}

fn status(store_dir: PathBuf, configured_model: String, config: &FlickConfig) -> StatusInfo {
    let manifest = VectorStore::read_manifest(&store_dir);
    let mut next_action = None;

    let (manifest, model_matches, message) = match manifest {
        Ok(manifest) => {
            let matches = manifest.embedding_model == configured_model;
            let message = if matches {
                "Vector store ready.".to_string()
            } else {
                next_action = Some("flick index".to_string());
                format!(
                    "The store was built with {} but {} is configured. Rebuild it or change [embeddings].model.",
                    manifest.embedding_model, configured_model
                )
            };
            (Some(manifest), matches, message)
        }
        Err(e) => {
            tracing::debug!("No usable manifest in {}: {}", store_dir.display(), e);
            next_action = Some("flick clean && flick index".to_string());
            (
                None,
                false,
                format!("No vector store found in {}.", store_dir.display()),
            )
        }
    };

    StatusInfo {
        config_exists: PathBuf::from(CONFIG_FILE).exists(),
        store_dir: store_dir.display().to_string(),
        manifest,
        configured_model,
        model_matches,
        llm_model: config
            .llm
            .model_path
            .as_ref()
            .map(|p| p.display().to_string()),
        next_action,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::tempdir;

    fn write_manifest(dir: &std::path::Path, model: &str) {
        let manifest = StoreManifest {
            embedding_model: model.to_string(),
            dimension: 384,
            count: 3,
            skipped_rows: 1,
            created_at: Utc::now(),
        };
        std::fs::write(
            dir.join(flick_server::storage::MANIFEST_FILE),
            serde_json::to_string(&manifest).unwrap(),
        )
        .unwrap();
    }

    #[test]
    fn test_missing_store_suggests_indexing() {
        let dir = tempdir().unwrap();
        let info = status(
            dir.path().join("nowhere"),
            "m".to_string(),
            &FlickConfig::default(),
        );
        assert!(info.manifest.is_none());
        assert!(!info.model_matches);
        assert_eq!(info.next_action.as_deref(), Some("flick clean && flick index"));
    }

    #[test]
    fn test_model_mismatch_is_reported() {
        let dir = tempdir().unwrap();
        write_manifest(dir.path(), "model-a");

        let info = status(
            dir.path().to_path_buf(),
            "model-b".to_string(),
            &FlickConfig::default(),
        );
        assert!(!info.model_matches);
        assert!(info.message.contains("model-a"));

        let info = status(
            dir.path().to_path_buf(),
            "model-a".to_string(),
            &FlickConfig::default(),
        );
        assert!(info.model_matches);
        assert_eq!(info.manifest.unwrap().count, 3);
    }
}
