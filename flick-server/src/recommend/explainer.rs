use flick_core::{ChatMessage, ChatModel, GenerationBudget};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use super::prompts::{build_user_prompt, SYSTEM_PROMPT};
use super::{RecommendationResult, Recommender, Result};

/// Closing tag of the reasoning block emitted by R1-style models.
pub const DEFAULT_REASONING_MARKER: &str = "</think>";

/// Returned when the model output has no reasoning marker.
pub const MISSING_ANSWER_MESSAGE: &str =
    "The language model did not produce a final answer. Please try again.";

/// Retrieval results plus the model's narrative about them.
#[derive(Debug, Clone, Serialize)]
pub struct Explanation {
    pub recommendations: Vec<RecommendationResult>,
    pub narrative: String,
}

/// Explains recommendations with a chat model.
#[derive(Clone)]
pub struct Explainer {
    recommender: Recommender,
    chat: Arc<dyn ChatModel>,
    marker: String,
}

impl Explainer {
    pub fn new(recommender: Recommender, chat: Arc<dyn ChatModel>) -> Self {
        Self {
            recommender,
            chat,
            marker: DEFAULT_REASONING_MARKER.to_string(),
        }
    }

    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    /// Ask the model why each of `recommendations` fits `description`.
    pub fn explain(
        &self,
        description: &str,
        recommendations: &[RecommendationResult],
    ) -> Result<String> {
        let messages = [
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(build_user_prompt(description, recommendations)?),
        ];
        let budget = GenerationBudget::for_items(recommendations.len());

        let started = Instant::now();
        let raw = self.chat.chat(&messages, budget)?;
        info!(
            "{} answered in {:.2}s",
            self.chat.model_name(),
            started.elapsed().as_secs_f64()
        );

        match extract_answer(&raw, &self.marker) {
            Some(answer) => Ok(answer.to_string()),
            None => {
                warn!("Model output has no '{}' marker", self.marker);
                Ok(MISSING_ANSWER_MESSAGE.to_string())
            }
        }
    }

    pub fn recommend_and_explain(&self, description: &str, top_n: usize) -> Result<Explanation> {
        let recommendations = self.recommender.recommend(description, top_n)?;
        let narrative = self.explain(description, &recommendations)?;
        Ok(Explanation {
            recommendations,
            narrative,
        })
    }
}

/// Text after the last `marker`, trimmed. `None` when the marker is absent.
pub fn extract_answer<'a>(raw: &'a str, marker: &str) -> Option<&'a str> {
    raw.rfind(marker).map(|at| raw[at + marker.len()..].trim())
}
