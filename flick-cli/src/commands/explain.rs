//! Explain command - recommendations narrated by the local language model

use anyhow::{Context, Result};
use colored::Colorize;
use flick_server::{Explainer, Explanation};
use serde::Serialize;
use std::time::Instant;

use super::recommend::{result_rows, RESULT_HEADERS};
use super::{
    count_or_prompt, load_chat_model, load_recommender, query_or_prompt, LlmArgs, RetrievalArgs,
};
use crate::config::FlickConfig;
use crate::output::{table, Output, OutputConfig, OutputFormat, TableDisplay};

#[derive(Debug, Serialize)]
pub struct ExplainResult {
    pub query: String,
    #[serde(flatten)]
    pub explanation: Explanation,
    pub duration_ms: u64,
}

impl TableDisplay for ExplainResult {
    fn to_table(&self, config: &OutputConfig) -> String {
        format!(
            "{} {}\n{}\n\n{}\n\n{}",
            "Closest to:".cyan().bold(),
            self.query,
            table(
                &RESULT_HEADERS,
                &result_rows(&self.explanation.recommendations),
                config
            ),
            self.explanation.narrative,
            format!("({:.1}s)", self.duration_ms as f64 / 1000.0).dimmed()
        )
    }
}

pub async fn run(
    query: Option<String>,
    num: Option<usize>,
    retrieval: RetrievalArgs,
    llm: LlmArgs,
    config: &FlickConfig,
    format: OutputFormat,
) -> Result<()> {
    let settings = llm.settings(config)?.context(
        "No language model configured. Set [llm].model_path in .flickrc.toml or FLICK_LLM_PATH.",
    )?;
    let query = query_or_prompt(query)?;
    let num = count_or_prompt(num)?;

    let recommender = load_recommender(&retrieval, config).await?;
    let chat = load_chat_model(settings).await?;
    let explainer =
        Explainer::new(recommender, chat).with_marker(config.llm.reasoning_marker.clone());

    let start = Instant::now();
    let description = query.clone();
    let explanation =
        tokio::task::spawn_blocking(move || explainer.recommend_and_explain(&description, num))
            .await??;

    let result = ExplainResult {
        query,
        explanation,
        duration_ms: start.elapsed().as_millis() as u64,
    };
    Output::new(result, format).render()
}
