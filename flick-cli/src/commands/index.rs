//! Index command - embed the cleaned dataset and persist the vector store

use anyhow::{Context, Result};
use colored::Colorize;
use flick_core::read_records;
use flick_embeddings::SentenceModel;
use flick_server::build_index;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;

use crate::config::FlickConfig;
use crate::output::{key_value, Output, OutputConfig, OutputFormat, TableDisplay};

#[derive(Debug, Serialize)]
pub struct IndexResult {
    pub input: String,
    pub store_dir: String,
    pub embedding_model: String,
    pub dimension: usize,
    pub movies: usize,
    pub skipped_rows: usize,
    pub duration_ms: u64,
}

impl TableDisplay for IndexResult {
    fn to_table(&self, config: &OutputConfig) -> String {
        let table = key_value(
            &[
                ("Dataset", self.input.clone()),
                ("Store", self.store_dir.clone()),
                ("Model", self.embedding_model.clone()),
                ("Dimension", self.dimension.to_string()),
                ("Movies", self.movies.to_string()),
                ("Skipped", self.skipped_rows.to_string()),
            ],
            config,
        );
        format!(
            "{}\n{}\n{}",
            "Vector store written".green().bold(),
            table,
            format!("({:.1}s)", self.duration_ms as f64 / 1000.0).dimmed()
        )
    }
}

pub async fn run(
    input: Option<PathBuf>,
    model: Option<String>,
    store_dir: Option<PathBuf>,
    batch_size: Option<usize>,
    config: &FlickConfig,
    format: OutputFormat,
) -> Result<()> {
    let start = Instant::now();
    let input = input.unwrap_or_else(|| config.dataset.cleaned_csv.clone());
    let model = model.unwrap_or_else(|| config.embeddings.model.clone());
    let store_dir = store_dir.unwrap_or_else(|| config.store.directory.clone());
    let batch_size = batch_size.unwrap_or(config.embeddings.batch_size).max(1);

    let records = read_records(&input)
        .with_context(|| format!("Failed to read {} (run 'flick clean' first)", input.display()))?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.cyan} {msg}")?,
    );
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));
    spinner.set_message(format!("Loading embedding model {}", model));
    let embedder = SentenceModel::resolve(&model)
        .await
        .with_context(|| format!("Failed to load embedding model {}", model));
    spinner.finish_and_clear();
    let embedder = embedder?;

    let bar = ProgressBar::new(records.len() as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} movies ({eta})")?
            .progress_chars("=> "),
    );

    let progress = bar.clone();
    let store = tokio::task::spawn_blocking(move || {
        build_index(records, &embedder, batch_size, |p| {
            progress.set_length(p.total as u64);
            progress.set_position(p.embedded as u64);
        })
    })
    .await
    .context("Index build panicked")?;
    bar.finish_and_clear();
    let store = store.context("Failed to build the vector store")?;

    store
        .save(&store_dir)
        .with_context(|| format!("Failed to write the vector store to {}", store_dir.display()))?;

    let manifest = store.manifest();
    let result = IndexResult {
        input: input.display().to_string(),
        store_dir: store_dir.display().to_string(),
        embedding_model: manifest.embedding_model.clone(),
        dimension: manifest.dimension,
        movies: manifest.count,
        skipped_rows: manifest.skipped_rows,
        duration_ms: start.elapsed().as_millis() as u64,
    };
    Output::new(result, format).render()
}
