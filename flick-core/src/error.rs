//! Error types for flick-core.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for flick-core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised while reading, cleaning or formatting the movie dataset.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The dataset file could not be opened or written.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File that was being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The CSV itself is malformed (ragged rows, bad quoting, invalid UTF-8).
    #[error("Malformed CSV in {path}: {source}")]
    Csv {
        /// File being parsed.
        path: PathBuf,
        /// Underlying CSV error.
        #[source]
        source: csv::Error,
    },

    /// A column the pipeline depends on is absent from the header row.
    #[error("Missing expected column '{column}' in {path}")]
    MissingColumn {
        /// Name of the absent column.
        column: String,
        /// File being parsed.
        path: PathBuf,
    },

    /// A field could not be interpreted while formatting a movie.
    #[error("Malformed field '{field}' for '{title}': {message}")]
    MalformedField {
        /// Column name.
        field: &'static str,
        /// Title of the offending movie.
        title: String,
        /// What went wrong.
        message: String,
    },
}

impl CoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CoreError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        CoreError::Csv {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::MissingColumn {
            column: "status".to_string(),
            path: PathBuf::from("/data/movies.csv"),
        };
        assert!(err.to_string().contains("status"));
        assert!(err.to_string().contains("/data/movies.csv"));

        let err = CoreError::MalformedField {
            field: "runtime",
            title: "Avatar".to_string(),
            message: "not a number".to_string(),
        };
        assert!(err.to_string().contains("runtime"));
        assert!(err.to_string().contains("Avatar"));
    }
}
