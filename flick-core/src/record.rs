//! Movie metadata records and the dataset schema.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{CoreError, Result};

/// Columns kept after cleaning, one per [`MovieRecord`] field.
pub const RETAINED_COLUMNS: &[&str] = &[
    "genres",
    "keywords",
    "overview",
    "production_companies",
    "production_countries",
    "release_date",
    "runtime",
    "spoken_languages",
    "tagline",
    "title",
    "cast",
    "director",
];

/// Columns removed by the cleaner: identifiers, language code, raw
/// popularity/vote/financial fields and crew.
pub const DROPPED_COLUMNS: &[&str] = &[
    "index",
    "homepage",
    "id",
    "original_language",
    "original_title",
    "status",
    "vote_count",
    "crew",
    "budget",
    "revenue",
    "vote_average",
    "popularity",
];

/// Release status a row must carry to survive cleaning.
pub const RELEASED_STATUS: &str = "Released";

/// One row of cleaned movie metadata.
///
/// The structured list fields (`production_companies`, `production_countries`,
/// `spoken_languages`) are kept exactly as they appear in the CSV, a JSON
/// encoded list of objects with a `name` key. They are parsed lazily by the
/// corpus formatter so a malformed row can be skipped without failing the
/// whole batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MovieRecord {
    pub title: String,
    pub tagline: String,
    pub overview: String,
    pub genres: String,
    pub keywords: String,
    pub production_companies: String,
    pub production_countries: String,
    pub spoken_languages: String,
    pub cast: String,
    pub director: String,
    pub release_date: String,
    /// Runtime in minutes as written in the dataset (e.g. `"162.0"`).
    pub runtime: String,
}

/// Element of a structured list field. Extra keys such as `id` or
/// `iso_3166_1` are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NamedEntity {
    pub name: String,
}

impl MovieRecord {
    /// Parse a JSON-encoded list of named entities.
    pub fn parse_names(raw: &str) -> std::result::Result<Vec<String>, serde_json::Error> {
        let entities: Vec<NamedEntity> = serde_json::from_str(raw)?;
        Ok(entities.into_iter().map(|e| e.name).collect())
    }

    /// Release year, when the release date starts with one.
    pub fn release_year(&self) -> Option<&str> {
        let year = self.release_date.get(..4)?;
        year.chars().all(|c| c.is_ascii_digit()).then_some(year)
    }
}

/// Read cleaned movie records from a CSV file.
///
/// Every retained column must be present in the header row; the order of
/// returned records equals the row order of the file.
pub fn read_records(path: impl AsRef<Path>) -> Result<Vec<MovieRecord>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path).map_err(|e| CoreError::csv(path, e))?;

    let headers = reader.headers().map_err(|e| CoreError::csv(path, e))?.clone();
    for column in RETAINED_COLUMNS {
        if !headers.iter().any(|h| h == *column) {
            return Err(CoreError::MissingColumn {
                column: column.to_string(),
                path: path.to_path_buf(),
            });
        }
    }

    let records = reader
        .deserialize()
        .collect::<std::result::Result<Vec<MovieRecord>, _>>()
        .map_err(|e| CoreError::csv(path, e))?;

    tracing::info!("Loaded {} movies from {}", records.len(), path.display());
    Ok(records)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::MovieRecord;

    /// A fully populated record modelled on the first row of the dataset.
    pub fn avatar() -> MovieRecord {
        MovieRecord {
            title: "Avatar".to_string(),
            tagline: "Enter the World of Pandora.".to_string(),
            overview: "In the 22nd century, a paraplegic Marine is dispatched to the moon Pandora."
                .to_string(),
            genres: "Action Adventure Fantasy Science Fiction".to_string(),
            keywords: "culture clash future space war".to_string(),
            production_companies: r#"[{"name": "Ingenious Film Partners", "id": 289}, {"name": "Twentieth Century Fox Film Corporation", "id": 306}]"#.to_string(),
            production_countries: r#"[{"iso_3166_1": "US", "name": "United States of America"}, {"iso_3166_1": "GB", "name": "United Kingdom"}]"#.to_string(),
            spoken_languages: r#"[{"iso_639_1": "en", "name": "English"}, {"iso_639_1": "es", "name": "Español"}]"#.to_string(),
            cast: "Sam Worthington Zoe Saldana Sigourney Weaver".to_string(),
            director: "James Cameron".to_string(),
            release_date: "2009-12-10".to_string(),
            runtime: "162.0".to_string(),
        }
    }
}
