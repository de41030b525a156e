//! Text rendering of movie records.
//!
//! The same rendering is used to build the embedding corpus and, with the
//! distance appended, to list candidates in the LLM prompt.

use std::fmt::Write as _;
use tracing::warn;

use crate::error::{CoreError, Result};
use crate::record::MovieRecord;

/// Render a movie as the text that gets embedded.
pub fn format_movie(movie: &MovieRecord) -> Result<String> {
    let companies = joined_names(movie, "production_companies", &movie.production_companies)?;
    let countries = joined_names(movie, "production_countries", &movie.production_countries)?;
    let languages = joined_names(movie, "spoken_languages", &movie.spoken_languages)?;
    let hours = runtime_hours(movie)?;

    let mut text = String::with_capacity(512 + movie.overview.len());
    // Writing to a String cannot fail.
    let _ = write!(
        text,
        "{title}\n\n{tagline}\n\n{overview}\n\n\
         Genres:- {genres}\n\
         Keywords:- {keywords}\n\
         Production Companies:- {companies}\n\
         Production Countries:- {countries}\n\
         Spoken Languages:- {languages}\n\
         Cast:- {cast}\n\
         Director:- {director}\n\
         Release Date:- {release_date}\n\
         Runtime:- {hours:.1} hours\n",
        title = movie.title,
        tagline = movie.tagline,
        overview = movie.overview,
        genres = movie.genres,
        keywords = movie.keywords,
        cast = movie.cast,
        director = movie.director,
        release_date = movie.release_date,
    );
    Ok(text)
}

/// Render a movie followed by its distance from a query.
pub fn format_movie_with_distance(movie: &MovieRecord, distance: f32) -> Result<String> {
    let mut text = format_movie(movie)?;
    let _ = writeln!(text, "\nDistance from the query: {}", distance);
    Ok(text)
}

fn joined_names(movie: &MovieRecord, field: &'static str, raw: &str) -> Result<String> {
    MovieRecord::parse_names(raw)
        .map(|names| names.join(", "))
        .map_err(|e| CoreError::MalformedField {
            field,
            title: movie.title.clone(),
            message: e.to_string(),
        })
}

/// Runtime in hours: whole minutes divided by 60. The `{:.1}` format
/// rounds the exact binary value, so `87` minutes renders as `1.4`.
fn runtime_hours(movie: &MovieRecord) -> Result<f64> {
    let malformed = |message: String| CoreError::MalformedField {
        field: "runtime",
        title: movie.title.clone(),
        message,
    };

    let minutes: f64 = movie
        .runtime
        .trim()
        .parse()
        .map_err(|e: std::num::ParseFloatError| malformed(e.to_string()))?;
    if !minutes.is_finite() || minutes < 0.0 {
        return Err(malformed(format!("invalid runtime {}", movie.runtime)));
    }

    Ok(minutes.trunc() / 60.0)
}

/// A formatted batch. `records[i]` is the movie `texts[i]` was rendered from.
#[derive(Debug, Clone, Default)]
pub struct FormattedCorpus {
    pub records: Vec<MovieRecord>,
    pub texts: Vec<String>,
    /// Rows that could not be formatted and were left out.
    pub skipped: usize,
}

impl FormattedCorpus {
    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }
}

/// Format every record, skipping (and logging) the ones that fail.
pub fn format_corpus(records: impl IntoIterator<Item = MovieRecord>) -> FormattedCorpus {
    let mut corpus = FormattedCorpus::default();

    for (row, movie) in records.into_iter().enumerate() {
        match format_movie(&movie) {
            Ok(text) => {
                corpus.texts.push(text);
                corpus.records.push(movie);
            }
            Err(e) => {
                warn!("Skipping row {}: {}", row, e);
                corpus.skipped += 1;
            }
        }
    }

    corpus
}
