//! Output formatting for the Flick CLI
//!
//! Every command result renders either as a human-readable table or as
//! JSON for scripts. Colors and truncation follow the TTY unless overridden.

use clap::ValueEnum;
use serde::Serialize;
use std::io::IsTerminal;
use std::str::FromStr;
use tabled::{
    builder::Builder,
    settings::{object::Columns, style::Style, Alignment, Modify, Width},
};

/// Output format for CLI results
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table format (default)
    #[default]
    Table,
    /// JSON format for machine consumption
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: '{}'", s)),
        }
    }
}

/// Configuration for output rendering
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// Disable truncation of long values
    pub no_truncate: bool,
    /// Override terminal width (None = auto-detect)
    pub width: Option<usize>,
}

impl OutputConfig {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            no_truncate: false,
            width: None,
        }
    }

    /// Create an OutputConfig with automatic TTY detection
    ///
    /// Truncation is disabled when output is piped or redirected.
    pub fn auto_detect(format: OutputFormat) -> Self {
        Self {
            no_truncate: !std::io::stdout().is_terminal(),
            ..Self::new(format)
        }
    }

    /// Get the effective terminal width
    pub fn effective_width(&self) -> usize {
        self.width.unwrap_or_else(|| {
            terminal_size::terminal_size()
                .map(|(w, _)| w.0 as usize)
                .unwrap_or(80)
        })
    }

    pub fn should_truncate(&self) -> bool {
        !self.no_truncate
    }
}

/// Trait for command results that can be printed as a table
///
/// JSON output comes from the `Serialize` implementation.
pub trait TableDisplay: Serialize {
    fn to_table(&self, config: &OutputConfig) -> String;
}

/// Result wrapper that prints in the selected format
pub struct Output<T> {
    data: T,
    config: OutputConfig,
}

impl<T: TableDisplay> Output<T> {
    /// Create a new output wrapper with specified format
    pub fn new(data: T, format: OutputFormat) -> Self {
        Self {
            data,
            config: OutputConfig::auto_detect(format),
        }
    }

    /// Render the output to stdout
    pub fn render(&self) -> anyhow::Result<()> {
        println!("{}", self.render_to_string()?);
        Ok(())
    }

    /// Get the rendered string without printing
    pub fn render_to_string(&self) -> anyhow::Result<String> {
        Ok(match self.config.format {
            OutputFormat::Table => self.data.to_table(&self.config),
            OutputFormat::Json => serde_json::to_string_pretty(&self.data)?,
        })
    }
}

/// Create a rounded table from a header and rows of strings
pub fn table(headers: &[&str], rows: &[Vec<String>], config: &OutputConfig) -> String {
    if rows.is_empty() {
        return "(no results)".to_string();
    }

    let mut builder = Builder::default();
    builder.push_record(headers.iter().copied());
    for row in rows {
        builder.push_record(row.iter().map(String::as_str));
    }

    let mut table = builder.build();
    table.with(Style::rounded());
    if config.should_truncate() {
        table.with(Width::wrap(config.effective_width()));
    }
    table.to_string()
}

/// Format a two-column key/value table
pub fn key_value(pairs: &[(&str, String)], config: &OutputConfig) -> String {
    let mut builder = Builder::default();
    for (key, value) in pairs {
        builder.push_record([*key, value.as_str()]);
    }

    let mut table = builder.build();
    table.with(Style::rounded());
    table.with(Modify::new(Columns::first()).with(Alignment::right()));
    if config.should_truncate() {
        table.with(Width::wrap(config.effective_width()));
    }
    table.to_string()
}

/// Truncate a string to a maximum width with ellipsis
pub fn truncate(s: &str, max_width: usize) -> String {
    if s.chars().count() <= max_width {
        s.to_string()
    } else if max_width <= 3 {
        s.chars().take(max_width).collect()
    } else {
        let truncated: String = s.chars().take(max_width - 3).collect();
        format!("{}...", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Pair {
        name: String,
        score: f32,
    }

    impl TableDisplay for Pair {
        fn to_table(&self, config: &OutputConfig) -> String {
            key_value(
                &[("Name", self.name.clone()), ("Score", self.score.to_string())],
                config,
            )
        }
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 8), "hello...");
        assert_eq!(truncate("hello", 5), "hello");
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!("table".parse::<OutputFormat>(), Ok(OutputFormat::Table));
        assert!("csv".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_json_render_uses_serde() {
        let output = Output::new(
            Pair {
                name: "Heat".to_string(),
                score: 1.5,
            },
            OutputFormat::Json,
        );
        let rendered = output.render_to_string().unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["name"], "Heat");
    }

    #[test]
    fn test_table_lists_rows() {
        let config = OutputConfig {
            width: Some(120),
            ..OutputConfig::new(OutputFormat::Table)
        };
        let rendered = table(
            &["#", "Title"],
            &[vec!["1".to_string(), "Heat".to_string()]],
            &config,
        );
        assert!(rendered.contains("Title"));
        assert!(rendered.contains("Heat"));
        assert_eq!(table(&["#"], &[], &config), "(no results)");
    }
}
