//! Prompt text for the recommendation narrative.

use flick_core::format_movie_with_distance;

use super::{RecommendationResult, Result};

pub const SYSTEM_PROMPT: &str = "You are an AI assistant that turns a user's \u{201c}ideal movie\u{201d} description plus a list of candidate films into a clear, structured set of recommendations.";

/// The user turn: the description, the candidates with their distances,
/// and the task.
pub fn build_user_prompt(
    description: &str,
    recommendations: &[RecommendationResult],
) -> Result<String> {
    let mut movies = String::new();
    for rec in recommendations {
        movies.push_str("\n\n");
        movies.push_str(&format_movie_with_distance(&rec.movie, rec.distance)?);
    }

    Ok(format!(
        "INPUT:

1. User's ideal movie description:
{description}

2. Top {n} closest movies:
{movies}

TASK:
For each movie in the list, in order of similarity (most similar first, smallest distance first):
1. Print the movie title on its own line.
2. On the next line, write a brief paragraph (2-4 sentences) explaining why this movie matches the user's tastes, referencing aspects of the user's description (themes, tone, setting, characters, etc.).
3. Then move to the next movie.
4. Don't print any additional text.
",
        n = recommendations.len(),
    ))
}
