//! Deterministic stand-ins for the embedding and chat models.

#![allow(dead_code)]

use flick_core::{
    ChatMessage, ChatModel, ChatResult, EmbeddingError, EmbeddingModel, EmbeddingResult,
    GenerationBudget, MovieRecord,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Maps a text to a fixed vector by its first line (the title for movie
/// texts, the whole query otherwise).
pub struct LookupEmbedder {
    pub name: String,
    pub vectors: HashMap<String, Vec<f32>>,
}

impl LookupEmbedder {
    pub fn new(name: &str, entries: &[(&str, [f32; 2])]) -> Self {
        Self {
            name: name.to_string(),
            vectors: entries
                .iter()
                .map(|(key, v)| (key.to_string(), v.to_vec()))
                .collect(),
        }
    }
}

impl EmbeddingModel for LookupEmbedder {
    fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        let key = text.lines().next().unwrap_or_default().trim();
        self.vectors
            .get(key)
            .cloned()
            .ok_or_else(|| EmbeddingError::EmbeddingFailed(format!("no vector for '{}'", key)))
    }

    fn dimension(&self) -> usize {
        2
    }

    fn model_name(&self) -> &str {
        &self.name
    }
}

/// Replies with a fixed text and counts calls.
pub struct CannedChat {
    pub reply: String,
    pub calls: AtomicUsize,
}

impl CannedChat {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            calls: AtomicUsize::new(0),
        }
    }
}

impl ChatModel for CannedChat {
    fn chat(&self, _messages: &[ChatMessage], _budget: GenerationBudget) -> ChatResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }

    fn model_name(&self) -> &str {
        "canned"
    }
}

pub fn movie(title: &str, year: &str) -> MovieRecord {
    MovieRecord {
        title: title.to_string(),
        tagline: format!("{} tagline", title),
        overview: format!("{} overview", title),
        genres: "Drama".to_string(),
        keywords: "keywords".to_string(),
        production_companies: r#"[{"name": "Studio", "id": 1}]"#.to_string(),
        production_countries: r#"[{"iso_3166_1": "US", "name": "United States of America"}]"#
            .to_string(),
        spoken_languages: r#"[{"iso_639_1": "en", "name": "English"}]"#.to_string(),
        cast: "Someone".to_string(),
        director: "Somebody".to_string(),
        release_date: format!("{}-06-01", year),
        runtime: "110.0".to_string(),
    }
}

/// Three movies on a plane; the query "q" sits at (1, 2).
pub fn three_movies() -> (Vec<MovieRecord>, LookupEmbedder) {
    let movies = vec![
        movie("Alpha", "1990"),
        movie("Bravo", "2001"),
        movie("Charlie", "2012"),
    ];
    let embedder = LookupEmbedder::new(
        "lookup-v1",
        &[
            ("Alpha", [0.0, 0.0]),
            ("Bravo", [1.0, 1.0]),
            ("Charlie", [4.0, 2.0]),
            ("q", [1.0, 2.0]),
        ],
    );
    (movies, embedder)
}
