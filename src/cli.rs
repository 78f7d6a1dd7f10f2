//! CLI mode implementation
//!
//! Provides the command-line interface for serving, searching, benchmarking
//! and importing the catalog

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// medsearch CLI
#[derive(Parser, Debug)]
#[command(name = "medsearch")]
#[command(about = "Medicine catalog search service", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output (no short flag to avoid conflicts)
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Config file (defaults to <config dir>/medsearch/config.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP search API
    Serve(ServeArgs),
    /// Run one query against the catalog
    Search(SearchArgs),
    /// Run a benchmark query file and write submission and timing files
    Bench(BenchArgs),
    /// Load a dataset directory and report what would be indexed
    Import(ImportArgs),
}

/// Serve command arguments
#[derive(Parser, Debug, Clone)]
pub struct ServeArgs {
    /// Directory of medicine JSON files
    #[arg(short = 'd', long, env = "MEDSEARCH_DATA")]
    pub data: Option<PathBuf>,

    /// Listen address (defaults to the configured bind, 127.0.0.1:8000)
    #[arg(short = 'b', long, env = "MEDSEARCH_BIND")]
    pub bind: Option<String>,
}

/// Search command arguments
#[derive(Parser, Debug, Clone)]
pub struct SearchArgs {
    /// Directory of medicine JSON files
    #[arg(short = 'd', long, env = "MEDSEARCH_DATA")]
    pub data: Option<PathBuf>,

    /// Query text
    #[arg(short = 'q', long)]
    pub query: String,

    /// prefix, substring, fulltext, fuzzy or unified
    #[arg(short = 's', long, default_value = "substring")]
    pub strategy: String,

    /// Maximum number of results
    #[arg(short = 'l', long)]
    pub limit: Option<usize>,

    /// Similarity threshold in [0, 1] (fuzzy and unified)
    #[arg(short = 't', long)]
    pub threshold: Option<f64>,

    /// Print the records as JSON instead of markdown
    #[arg(long)]
    pub json: bool,
}

/// Bench command arguments
#[derive(Parser, Debug, Clone)]
pub struct BenchArgs {
    /// Directory of medicine JSON files
    #[arg(short = 'd', long, env = "MEDSEARCH_DATA")]
    pub data: Option<PathBuf>,

    /// Benchmark query file
    #[arg(long, default_value = "dataset/benchmark_queries.json")]
    pub queries: PathBuf,

    /// Submission output file
    #[arg(short = 'o', long, default_value = "dataset/submission.json")]
    pub out: PathBuf,

    /// Timing output file
    #[arg(long, default_value = "benchmark_timings.json")]
    pub timings: PathBuf,

    /// Results per query
    #[arg(short = 'l', long, default_value_t = 10)]
    pub limit: usize,
}

/// Import command arguments
#[derive(Parser, Debug, Clone)]
pub struct ImportArgs {
    /// Directory of medicine JSON files
    #[arg(short = 'd', long, env = "MEDSEARCH_DATA")]
    pub data: Option<PathBuf>,
}
