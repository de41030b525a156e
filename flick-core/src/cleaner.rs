//! Dataset cleaning for the raw movie metadata CSV.
//!
//! The cleaner runs four steps in a fixed order:
//! 1. keep released movies only
//! 2. drop columns that are not needed downstream
//! 3. drop exact duplicate rows
//! 4. drop rows with a missing value
//!
//! Steps that have nothing to act on (no `status` column, drop-list columns
//! already gone) are no-ops, which makes cleaning idempotent.

use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{CoreError, Result};
use crate::record::{DROPPED_COLUMNS, RELEASED_STATUS, RETAINED_COLUMNS};

/// Field values read as missing, besides the empty string. Matched exactly,
/// so a whitespace-only field is a value.
pub const MISSING_MARKERS: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

fn is_missing(field: &str) -> bool {
    field.is_empty() || MISSING_MARKERS.contains(&field)
}

/// Summary of a cleaning run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleaningReport {
    pub input_rows: usize,
    pub input_columns: usize,
    pub unreleased_removed: usize,
    pub columns_removed: Vec<String>,
    pub duplicates_removed: usize,
    pub incomplete_removed: usize,
    pub output_rows: usize,
    pub output_columns: usize,
}

/// In-memory table being cleaned.
#[derive(Debug, Clone)]
pub struct DatasetCleaner {
    source: PathBuf,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl DatasetCleaner {
    /// Load a raw dataset.
    ///
    /// Fails on malformed CSV or when one of the retained columns is absent.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = csv::Reader::from_path(path).map_err(|e| CoreError::csv(path, e))?;

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| CoreError::csv(path, e))?
            .iter()
            .map(str::to_string)
            .collect();

        for column in RETAINED_COLUMNS {
            if !headers.iter().any(|h| h == column) {
                return Err(CoreError::MissingColumn {
                    column: column.to_string(),
                    path: path.to_path_buf(),
                });
            }
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| CoreError::csv(path, e))?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        info!("Dataset loaded from {}", path.display());
        Ok(Self {
            source: path.to_path_buf(),
            headers,
            rows,
        })
    }

    /// Current `(rows, columns)` shape.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.headers.len())
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Keep only rows whose `status` is `Released`. Returns the number of
    /// rows removed.
    pub fn remove_unreleased(&mut self) -> usize {
        let Some(status) = self.column_index("status") else {
            debug!("No status column in {}, skipping", self.source.display());
            return 0;
        };

        let before = self.rows.len();
        self.rows.retain(|row| row[status] == RELEASED_STATUS);
        let removed = before - self.rows.len();
        info!("Unreleased movies removed: {}", removed);
        removed
    }

    /// Drop every drop-list column present in the table. Returns the names
    /// of the columns removed.
    pub fn remove_unimportant_columns(&mut self) -> Vec<String> {
        let keep: Vec<bool> = self
            .headers
            .iter()
            .map(|h| !DROPPED_COLUMNS.contains(&h.as_str()))
            .collect();

        let removed: Vec<String> = self
            .headers
            .iter()
            .zip(&keep)
            .filter(|(_, keep)| !**keep)
            .map(|(h, _)| h.clone())
            .collect();

        if removed.is_empty() {
            return removed;
        }

        self.headers = retain_by_mask(std::mem::take(&mut self.headers), &keep);
        for row in &mut self.rows {
            *row = retain_by_mask(std::mem::take(row), &keep);
        }

        info!("Unimportant columns removed: {}", removed.join(", "));
        removed
    }

    /// Drop exact duplicate rows, keeping the first occurrence.
    pub fn remove_duplicate_rows(&mut self) -> usize {
        let before = self.rows.len();
        let mut seen = HashSet::with_capacity(before);
        self.rows.retain(|row| seen.insert(row.clone()));
        let removed = before - self.rows.len();
        info!("Duplicate rows removed: {}", removed);
        removed
    }

    /// Drop rows where any field is empty or a [`MISSING_MARKERS`] value.
    pub fn remove_missing_values(&mut self) -> usize {
        let before = self.rows.len();
        self.rows.retain(|row| !row.iter().any(|field| is_missing(field)));
        let removed = before - self.rows.len();
        info!("Rows with missing values removed: {}", removed);
        removed
    }

    /// Write the table to `path`.
    ///
    /// Data goes to a sibling temporary file first and is renamed into place,
    /// so a failed write never leaves a truncated output behind.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| CoreError::io(parent, e))?;
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "cleaned.csv".to_string());
        let tmp = path.with_file_name(format!(".{}.tmp", file_name));

        let result = self.write_to(&tmp);
        if let Err(e) = result {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }

        fs::rename(&tmp, path).map_err(|e| CoreError::io(path, e))
    }

    fn write_to(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path).map_err(|e| CoreError::csv(path, e))?;
        writer
            .write_record(&self.headers)
            .map_err(|e| CoreError::csv(path, e))?;
        for row in &self.rows {
            writer.write_record(row).map_err(|e| CoreError::csv(path, e))?;
        }
        writer.flush().map_err(|e| CoreError::io(path, e))
    }

    /// Run every cleaning step and write the result to `output`.
    pub fn run(mut self, output: impl AsRef<Path>) -> Result<CleaningReport> {
        let output = output.as_ref();
        let (input_rows, input_columns) = self.shape();
        info!(
            "Starting dataset cleaning, shape before: ({}, {})",
            input_rows, input_columns
        );

        let unreleased_removed = self.remove_unreleased();
        let columns_removed = self.remove_unimportant_columns();
        let duplicates_removed = self.remove_duplicate_rows();
        let incomplete_removed = self.remove_missing_values();

        self.write(output)?;

        let (output_rows, output_columns) = self.shape();
        info!(
            "Dataset cleaning completed, shape after: ({}, {}) -> {}",
            output_rows,
            output_columns,
            output.display()
        );

        Ok(CleaningReport {
            input_rows,
            input_columns,
            unreleased_removed,
            columns_removed,
            duplicates_removed,
            incomplete_removed,
            output_rows,
            output_columns,
        })
    }
}

fn retain_by_mask(values: Vec<String>, keep: &[bool]) -> Vec<String> {
    values
        .into_iter()
        .zip(keep)
        .filter_map(|(value, keep)| keep.then_some(value))
        .collect()
}

/// Clean the dataset at `input` and write it to `output`.
pub fn clean(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<CleaningReport> {
    DatasetCleaner::load(input)?.run(output)
}
