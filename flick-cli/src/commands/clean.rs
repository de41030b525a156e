//! Clean command - filter the raw dataset down to indexable movies

use anyhow::{Context, Result};
use colored::Colorize;
use flick_core::CleaningReport;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;

use crate::config::FlickConfig;
use crate::output::{key_value, Output, OutputConfig, OutputFormat, TableDisplay};

#[derive(Debug, Serialize)]
pub struct CleanResult {
    pub input: String,
    pub output: String,
    #[serde(flatten)]
    pub report: CleaningReport,
    pub duration_ms: u64,
}

impl TableDisplay for CleanResult {
    fn to_table(&self, config: &OutputConfig) -> String {
        let r = &self.report;
        let dropped = if r.columns_removed.is_empty() {
            "-".to_string()
        } else {
            r.columns_removed.join(", ")
        };

        let table = key_value(
            &[
                ("Input", self.input.clone()),
                ("Output", self.output.clone()),
                ("Shape before", format!("({}, {})", r.input_rows, r.input_columns)),
                ("Unreleased", r.unreleased_removed.to_string()),
                ("Columns dropped", dropped),
                ("Duplicates", r.duplicates_removed.to_string()),
                ("Incomplete", r.incomplete_removed.to_string()),
                ("Shape after", format!("({}, {})", r.output_rows, r.output_columns)),
            ],
            config,
        );

        format!(
            "{}\n{}\n{}",
            "Dataset cleaned".green().bold(),
            table,
            format!("({} ms)", self.duration_ms).dimmed()
        )
    }
}

pub fn run(
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    config: &FlickConfig,
    format: OutputFormat,
) -> Result<()> {
    let start = Instant::now();
    let input = input.unwrap_or_else(|| config.dataset.raw_csv.clone());
    let output = output.unwrap_or_else(|| config.dataset.cleaned_csv.clone());

    let report = flick_core::clean(&input, &output)
        .with_context(|| format!("Failed to clean {}", input.display()))?;

    let result = CleanResult {
        input: input.display().to_string(),
        output: output.display().to_string(),
        report,
        duration_ms: start.elapsed().as_millis() as u64,
    };
    Output::new(result, format).render()
}
