//! Integration tests for the Flick CLI
//!
//! Runs the built binary in isolated temp directories. Nothing here needs
//! an embedding or language model.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

// ============================================================================
// Test Utilities
// ============================================================================

/// Run flick with the given args in the specified directory
fn run_flick(dir: &Path, args: &[&str]) -> Output {
    flick_command(dir)
        .args(args)
        .output()
        .expect("Failed to execute flick command")
}

/// A flick command with no inherited FLICK_* settings
fn flick_command(dir: &Path) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_flick"));
    command
        .current_dir(dir)
        .env_remove("FLICK_CONFIG")
        .env_remove("FLICK_EMBEDDING_MODEL")
        .env_remove("FLICK_STORE_DIR")
        .env_remove("FLICK_LLM_PATH")
        .env_remove("FLICK_LLM_TOKENIZER")
        .env_remove("RUST_LOG");
    command
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn json(output: &Output) -> serde_json::Value {
    serde_json::from_str(&stdout(output))
        .unwrap_or_else(|e| panic!("Output should be valid JSON ({}): {}", e, stdout(output)))
}

const RAW_HEADER: &str = "index,budget,genres,homepage,id,keywords,original_language,original_title,overview,popularity,production_companies,production_countries,release_date,revenue,runtime,spoken_languages,status,tagline,title,vote_average,vote_count,cast,crew,director";

fn raw_row(index: u32, title: &str, status: &str, tagline: &str) -> String {
    format!(
        r#"{index},1000,Drama,,{index},heist,en,{title},"A crew, one last job.",1.5,"[{{""name"": ""Studio""}}]","[{{""iso_3166_1"": ""US"", ""name"": ""United States of America""}}]",1995-12-15,5000,170.0,"[{{""iso_639_1"": ""en"", ""name"": ""English""}}]",{status},{tagline},{title},7.9,100,Al Pacino,"[{{""name"": ""Crew""}}]",Michael Mann"#
    )
}

/// Raw dataset with one rumored, one incomplete and one duplicate movie
fn write_raw_dataset(dir: &Path) -> PathBuf {
    let data = dir.join("data");
    fs::create_dir_all(&data).unwrap();
    let rows = [
        raw_row(0, "Heat", "Released", "A Los Angeles crime saga"),
        raw_row(1, "Ronin", "Rumored", "Trust no one"),
        raw_row(2, "Thief", "Released", ""),
        raw_row(3, "Collateral", "Released", "It started like any other night"),
        raw_row(4, "Heat", "Released", "A Los Angeles crime saga"),
    ];
    let path = data.join("movie_dataset.csv");
    fs::write(&path, format!("{}\n{}\n", RAW_HEADER, rows.join("\n"))).unwrap();
    path
}

// ============================================================================
// Help and Version
// ============================================================================

#[test]
fn test_help_flag() {
    let temp_dir = TempDir::new().unwrap();
    let output = run_flick(temp_dir.path(), &["--help"]);

    assert!(output.status.success());
    let out = stdout(&output);
    for command in ["clean", "index", "recommend", "explain", "serve", "status"] {
        assert!(out.contains(command), "help should list {}: {}", command, out);
    }
}

#[test]
fn test_version_flag() {
    let temp_dir = TempDir::new().unwrap();
    let output = run_flick(temp_dir.path(), &["--version"]);

    assert!(output.status.success());
    assert!(stdout(&output).contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_no_command_prints_help() {
    let temp_dir = TempDir::new().unwrap();
    let output = run_flick(temp_dir.path(), &[]);

    assert!(output.status.success());
    assert!(stdout(&output).contains("Usage"));
}

// ============================================================================
// Clean Command
// ============================================================================

#[test]
fn test_clean_uses_configured_default_paths() {
    let temp_dir = TempDir::new().unwrap();
    write_raw_dataset(temp_dir.path());

    let output = run_flick(temp_dir.path(), &["clean", "--format", "json"]);
    assert!(output.status.success(), "clean failed: {}", stderr(&output));

    let report = json(&output);
    assert_eq!(report["input_rows"], 5);
    assert_eq!(report["unreleased_removed"], 1);
    assert_eq!(report["duplicates_removed"], 1);
    assert_eq!(report["incomplete_removed"], 1);
    assert_eq!(report["output_rows"], 2);

    let cleaned =
        fs::read_to_string(temp_dir.path().join("data/cleaned_movie_dataset.csv")).unwrap();
    assert!(cleaned.contains("Collateral"));
    assert!(!cleaned.contains("Ronin"));
    assert!(!cleaned.lines().next().unwrap().contains("status"));
}

#[test]
fn test_clean_table_output() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_raw_dataset(temp_dir.path());
    let out_path = temp_dir.path().join("clean.csv");

    let output = run_flick(
        temp_dir.path(),
        &[
            "clean",
            "--input",
            input.to_str().unwrap(),
            "--output",
            out_path.to_str().unwrap(),
        ],
    );

    assert!(output.status.success(), "clean failed: {}", stderr(&output));
    assert!(stdout(&output).contains("Dataset cleaned"));
    assert!(out_path.exists());
}

#[test]
fn test_clean_missing_column_fails() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("bad.csv");
    fs::write(&input, "title,overview\nHeat,Crime\n").unwrap();
    let out_path = temp_dir.path().join("clean.csv");

    let output = run_flick(
        temp_dir.path(),
        &[
            "clean",
            "-i",
            input.to_str().unwrap(),
            "-o",
            out_path.to_str().unwrap(),
        ],
    );

    assert!(!output.status.success());
    assert!(stderr(&output).contains("Failed to clean"));
    assert!(!out_path.exists());
}

// ============================================================================
// Status Command
// ============================================================================

#[test]
fn test_status_without_store() {
    let temp_dir = TempDir::new().unwrap();
    let output = run_flick(temp_dir.path(), &["status"]);

    assert!(output.status.success(), "status failed: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("Not indexed"), "got: {}", out);
    assert!(out.contains("flick index"));
}

#[test]
fn test_status_json_reads_config_file() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join(".flickrc.toml"),
        "[store]\ndirectory = \"stores/movies\"\n\n[embeddings]\nmodel = \"models/minilm\"\n",
    )
    .unwrap();

    let output = run_flick(temp_dir.path(), &["st", "--format", "json"]);
    assert!(output.status.success(), "status failed: {}", stderr(&output));

    let status = json(&output);
    assert_eq!(status["config_exists"], true);
    assert_eq!(status["store_dir"], "stores/movies");
    assert_eq!(status["configured_model"], "models/minilm");
    assert!(status["manifest"].is_null());
    assert_eq!(status["model_matches"], false);
}

#[test]
fn test_env_overrides_config_file_and_flag_overrides_env() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join(".flickrc.toml"),
        "[store]\ndirectory = \"from-file\"\n",
    )
    .unwrap();

    let output = flick_command(temp_dir.path())
        .env("FLICK_STORE_DIR", "from-env")
        .args(["status", "--format", "json"])
        .output()
        .unwrap();
    assert_eq!(json(&output)["store_dir"], "from-env");

    let output = flick_command(temp_dir.path())
        .env("FLICK_STORE_DIR", "from-env")
        .args(["status", "--format", "json", "--store-dir", "from-flag"])
        .output()
        .unwrap();
    assert_eq!(json(&output)["store_dir"], "from-flag");
}

#[test]
fn test_broken_config_falls_back_to_defaults() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join(".flickrc.toml"), "[store\ndirectory =").unwrap();

    let output = run_flick(temp_dir.path(), &["status", "--format", "json"]);
    assert!(output.status.success());
    assert_eq!(json(&output)["store_dir"], "vector_store");
    assert!(stderr(&output).contains("Failed to parse"));
}

// ============================================================================
// Retrieval Commands
// ============================================================================

#[test]
fn test_recommend_without_store_fails() {
    let temp_dir = TempDir::new().unwrap();
    let output = run_flick(temp_dir.path(), &["recommend", "a heist movie", "-n", "3"]);

    assert!(!output.status.success());
    assert!(
        stderr(&output).contains("flick index"),
        "got: {}",
        stderr(&output)
    );
}

#[test]
fn test_explain_without_llm_fails() {
    let temp_dir = TempDir::new().unwrap();
    let output = run_flick(temp_dir.path(), &["explain", "a heist movie", "-n", "3"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("No language model configured"));
}

#[test]
fn test_recommend_needs_query_when_not_interactive() {
    let temp_dir = TempDir::new().unwrap();
    let output = flick_command(temp_dir.path())
        .arg("recommend")
        .stdin(std::process::Stdio::null())
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(stderr(&output).contains("No query given"));
}
