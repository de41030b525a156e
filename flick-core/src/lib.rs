//! Flick core - movie records, dataset cleaning and corpus formatting.
//!
//! This crate holds everything in the pipeline that does not need a model:
//!
//! - **Records**: the cleaned movie metadata schema ([`MovieRecord`])
//! - **Cleaning**: turning the raw dataset into a complete, deduplicated CSV
//! - **Corpus**: the text each movie is embedded as
//! - **Models**: the [`EmbeddingModel`] and [`ChatModel`] seams implemented by
//!   `flick-embeddings` and `flick-llm`
//!
//! # Example
//!
//! ```no_run
//! use flick_core::{clean, format_corpus, read_records};
//!
//! let report = clean("data/movies.csv", "data/cleaned.csv")?;
//! println!("{} movies kept", report.output_rows);
//!
//! let corpus = format_corpus(read_records("data/cleaned.csv")?);
//! println!("{} texts ready to embed", corpus.len());
//! # Ok::<(), flick_core::CoreError>(())
//! ```

pub mod cleaner;
pub mod corpus;
pub mod error;
pub mod models;
pub mod record;

pub use cleaner::{clean, CleaningReport, DatasetCleaner};
pub use corpus::{format_corpus, format_movie, format_movie_with_distance, FormattedCorpus};
pub use error::{CoreError, Result};
pub use models::{
    ChatError, ChatMessage, ChatModel, ChatResult, EmbeddingError, EmbeddingModel,
    EmbeddingResult, GenerationBudget, Role,
};
pub use record::{read_records, MovieRecord, NamedEntity, DROPPED_COLUMNS, RETAINED_COLUMNS};
