//! Flick CLI - movie recommendations from a local dataset
//!
//! Cleans a movie CSV, embeds it into a vector store, answers similarity
//! queries and explains them with a local language model.

use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod output;

use commands::*;
use config::FlickConfig;
use output::OutputFormat;

/// Find movies by describing them.
///
/// Flick embeds every movie in a dataset and looks up the ones closest
/// to a free-text description, optionally asking a local language model
/// to explain the picks.
#[derive(Parser)]
#[command(name = "flick")]
#[command(author, version)]
#[command(about = "Find movies by describing them")]
#[command(propagate_version = true)]
#[command(next_help_heading = "Options")]
#[command(after_help = "Quick Start:
  flick clean                 Clean the raw dataset
  flick index                 Embed the cleaned dataset into the vector store
  flick recommend \"heist\"     Movies closest to a description
  flick explain \"heist\" -n 3  Same, explained by the language model
  flick serve                 Web front end on http://127.0.0.1:5000")]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Output format (overrides config default)
    #[arg(long, global = true, value_enum)]
    format: Option<OutputFormat>,

    /// Configuration file (defaults to ./.flickrc.toml)
    #[arg(long, global = true, env = "FLICK_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean the raw movie CSV
    Clean {
        /// Raw CSV (defaults to [dataset].raw_csv)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Cleaned CSV to write (defaults to [dataset].cleaned_csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Embed the cleaned dataset and write the vector store
    Index {
        /// Cleaned CSV (defaults to [dataset].cleaned_csv)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Embedding model: Hugging Face repo id or local directory
        #[arg(short, long, env = "FLICK_EMBEDDING_MODEL")]
        model: Option<String>,

        /// Vector store directory
        #[arg(long, env = "FLICK_STORE_DIR")]
        store_dir: Option<PathBuf>,

        /// Texts embedded per batch
        #[arg(short, long)]
        batch_size: Option<usize>,
    },

    /// Movies closest to a description
    #[command(visible_alias = "rec")]
    Recommend {
        /// What you want to watch (prompted for when omitted)
        query: Option<String>,

        /// Number of movies to return (prompted for when omitted)
        #[arg(short = 'n', long = "num")]
        num: Option<usize>,

        #[command(flatten)]
        retrieval: RetrievalArgs,
    },

    /// Movies closest to a description, explained by the language model
    Explain {
        /// What you want to watch (prompted for when omitted)
        query: Option<String>,

        /// Number of movies to consider (prompted for when omitted)
        #[arg(short = 'n', long = "num")]
        num: Option<usize>,

        #[command(flatten)]
        retrieval: RetrievalArgs,

        #[command(flatten)]
        llm: LlmArgs,
    },

    /// Run the web front end
    Serve {
        /// Address to bind (defaults to [server].host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind (defaults to [server].port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Load the language model before accepting requests
        #[arg(long)]
        preload_llm: bool,

        #[command(flatten)]
        retrieval: RetrievalArgs,

        #[command(flatten)]
        llm: LlmArgs,
    },

    /// Show the vector store and whether it matches the configuration
    #[command(visible_alias = "st")]
    Status {
        /// Vector store directory
        #[arg(long, env = "FLICK_STORE_DIR")]
        store_dir: Option<PathBuf>,

        /// Embedding model the store is expected to use
        #[arg(short, long, env = "FLICK_EMBEDDING_MODEL")]
        model: Option<String>,
    },
}

/// Set up tracing. `default_level` applies unless `RUST_LOG`, `--verbose`
/// or `--quiet` say otherwise.
fn setup_logging(verbose: bool, quiet: bool, default_level: &str) {
    let filter = if quiet {
        "error"
    } else if verbose {
        "debug,hyper=info,tokenizers=info"
    } else {
        default_level
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.command {
        Some(Commands::Serve { .. }) => "info",
        _ => "warn",
    };
    setup_logging(cli.verbose, cli.quiet, default_level);

    let config = FlickConfig::load(cli.config.as_deref());

    // Resolve output format: CLI flag > config default > Table
    let format = cli.format.unwrap_or_else(|| {
        config
            .default_format()
            .and_then(|f| f.parse().ok())
            .unwrap_or(OutputFormat::Table)
    });

    if let Some(use_color) = config.use_color() {
        colored::control::set_override(use_color);
    }

    let command = match cli.command {
        Some(cmd) => cmd,
        None => {
            let _ = Cli::command().print_help();
            println!();
            return Ok(());
        }
    };

    match command {
        Commands::Clean { input, output } => clean::run(input, output, &config, format),
        Commands::Index {
            input,
            model,
            store_dir,
            batch_size,
        } => index::run(input, model, store_dir, batch_size, &config, format).await,
        Commands::Recommend {
            query,
            num,
            retrieval,
        } => recommend::run(query, num, retrieval, &config, format).await,
        Commands::Explain {
            query,
            num,
            retrieval,
            llm,
        } => explain::run(query, num, retrieval, llm, &config, format).await,
        Commands::Serve {
            host,
            port,
            preload_llm,
            retrieval,
            llm,
        } => serve::run(host, port, preload_llm, retrieval, llm, &config).await,
        Commands::Status { store_dir, model } => status::run(store_dir, model, &config, format),
    }
}
