//! Recommend command - movies nearest to a free-text description

use anyhow::Result;
use colored::Colorize;
use flick_server::RecommendationResult;
use serde::Serialize;
use std::time::Instant;

use super::{count_or_prompt, load_recommender, query_or_prompt, RetrievalArgs};
use crate::config::FlickConfig;
use crate::output::{table, truncate, Output, OutputConfig, OutputFormat, TableDisplay};

#[derive(Debug, Serialize)]
pub struct RecommendResult {
    pub query: String,
    pub results: Vec<RecommendationResult>,
    pub duration_ms: u64,
}

/// Rank, title, year and distance rows shared with `explain`.
pub fn result_rows(results: &[RecommendationResult]) -> Vec<Vec<String>> {
    results
        .iter()
        .enumerate()
        .map(|(rank, r)| {
            vec![
                (rank + 1).to_string(),
                truncate(&r.movie.title, 48),
                r.movie.release_year().unwrap_or("-").to_string(),
                format!("{:.4}", r.distance),
            ]
        })
        .collect()
}

pub const RESULT_HEADERS: [&str; 4] = ["#", "Title", "Year", "Distance"];

impl TableDisplay for RecommendResult {
    fn to_table(&self, config: &OutputConfig) -> String {
        format!(
            "{} {}\n{}\n{}",
            "Closest to:".cyan().bold(),
            self.query,
            table(&RESULT_HEADERS, &result_rows(&self.results), config),
            format!("({} ms)", self.duration_ms).dimmed()
        )
    }
}

pub async fn run(
    query: Option<String>,
    num: Option<usize>,
    retrieval: RetrievalArgs,
    config: &FlickConfig,
    format: OutputFormat,
) -> Result<()> {
    let query = query_or_prompt(query)?;
    let num = count_or_prompt(num)?;

    let recommender = load_recommender(&retrieval, config).await?;

    let start = Instant::now();
    let search_query = query.clone();
    let results =
        tokio::task::spawn_blocking(move || recommender.recommend(&search_query, num)).await??;

    let result = RecommendResult {
        query,
        results,
        duration_ms: start.elapsed().as_millis() as u64,
    };
    Output::new(result, format).render()
}

#[cfg(test)]
mod tests {
    use super::*;
    use flick_core::MovieRecord;

    fn result(title: &str, date: &str, distance: f32) -> RecommendationResult {
        RecommendationResult {
            position: 0,
            movie: MovieRecord {
                title: title.to_string(),
                release_date: date.to_string(),
                ..MovieRecord::default()
            },
            distance,
        }
    }

    #[test]
    fn test_rows_are_ranked_with_year_and_distance() {
        let rows = result_rows(&[
            result("Heat", "1995-12-15", 0.5),
            result("Ronin", "1998-09-25", 0.75),
        ]);
        assert_eq!(rows[0], vec!["1", "Heat", "1995", "0.5000"]);
        assert_eq!(rows[1][0], "2");
        assert_eq!(rows[1][3], "0.7500");
    }

    #[test]
    fn test_undated_movie_shows_placeholder_year() {
        let rows = result_rows(&[result("Thief", "", 1.0)]);
        assert_eq!(rows[0][2], "-");
    }
}
