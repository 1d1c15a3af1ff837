//! repofetch CLI entry point.
//!
//! Handles argument parsing, logging setup, and exit-code mapping:
//! 0 on success, 1 on operational failures (unresolvable input, absent
//! referents, unusable output directories), 2 on uncaught errors.

use anyhow::Result;
use clap::Parser;
use repofetch_cli::cli::Cli;
use repofetch_cli::core::user_friendly_error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG always wins; --debug raises the level when RUST_LOG is
    // unset; otherwise stay quiet so output is just the answers
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error"))
    } else if cli.debug() {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("off")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.execute().await {
        Ok(0) => Ok(()),
        Ok(code) => std::process::exit(code),
        Err(error) => {
            user_friendly_error(error).display();
            std::process::exit(2);
        }
    }
}
