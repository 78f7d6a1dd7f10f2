//! medsearch: medicine catalog search service & CLI
//!
//! Subcommands:
//! - `serve` - HTTP search API over an in-memory catalog
//! - `search` - run one query and print the matches
//! - `bench` - replay a benchmark query file into submission and timing files
//! - `import` - load a data directory and report what would be indexed
//!
//! Five strategies: prefix, substring, fulltext, fuzzy and unified.

mod catalog;
mod cli;
mod config;
mod error;
mod http;
mod search;
mod tools;

#[cfg(test)]
mod tests_end_to_end;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use error::SearchError;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version print to stdout and succeed
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    // Initialize logging based on verbosity flags; RUST_LOG wins
    let log_level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr) // Log to stderr to keep stdout clean
        .init();

    let result = run(cli).await;

    match result {
        Ok(Some(output)) => {
            println!("{}", output);
            Ok(())
        }
        Ok(None) => Ok(()),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(get_exit_code(&e));
        }
    }
}

async fn run(cli: Cli) -> Result<Option<String>> {
    let config = config::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve(args) => {
            execute_serve(args, config).await?;
            Ok(None)
        }
        Commands::Search(args) => tools::search::execute_search(args, &config).await.map(Some),
        Commands::Bench(args) => tools::bench::execute_bench(args, &config).await.map(Some),
        Commands::Import(args) => tools::import::execute_import(args, &config).map(Some),
    }
}

/// Execute serve command
async fn execute_serve(args: cli::ServeArgs, config: config::Config) -> Result<()> {
    let dir = tools::util::resolve_data_dir(args.data.as_deref(), &config);
    let engine = tools::util::load_engine(&dir, &config)?;
    let bind = args.bind.unwrap_or_else(|| config.server.bind.clone());

    info!(
        records = engine.store().len(),
        "Starting medsearch server on {}", bind
    );

    let request_timeout = Duration::from_millis(config.server.request_timeout_ms);
    http::serve(Arc::new(engine), request_timeout, &bind).await
}

/// Determine exit code based on error type
fn get_exit_code(err: &anyhow::Error) -> i32 {
    if let Some(search_err) = err.downcast_ref::<SearchError>() {
        return search_err.exit_code();
    }
    if err.downcast_ref::<catalog::StoreError>().is_some()
        || err.downcast_ref::<catalog::import::ImportError>().is_some()
    {
        return 2; // Catalog could not be read
    }
    5 // Other application errors
}
