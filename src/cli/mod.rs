//! Command-line interface for repofetch.
//!
//! Two subcommands:
//! - `resolve` - run a question through the resolver pipeline and print each
//!   answer, one per line
//! - `fetch` - resolve recursively, then materialize the final answer into
//!   an output directory
//!
//! Exit codes: 0 on success, 1 on operational failure (unresolvable input,
//! a referent proven absent, an unusable output directory), 2 on uncaught
//! errors.

mod fetch;
mod resolve;

use anyhow::Result;
use clap::{Parser, Subcommand};

pub use fetch::FetchCommand;
pub use resolve::ResolveCommand;

#[derive(Parser)]
#[command(
    name = "repofetch",
    version,
    about = "Resolve DOIs, dataset URLs and repository references into pinned, fetchable descriptors"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a question (URL or DOI) into descriptors
    Resolve(ResolveCommand),
    /// Resolve a question and fetch the result into a directory
    Fetch(FetchCommand),
}

impl Cli {
    /// Whether `--debug` was passed to the active subcommand. Needed before
    /// execution so logging can be configured first.
    #[must_use]
    pub fn debug(&self) -> bool {
        match &self.command {
            Commands::Resolve(cmd) => cmd.debug,
            Commands::Fetch(cmd) => cmd.debug,
        }
    }

    /// Run the selected subcommand, returning the process exit code.
    pub async fn execute(self) -> Result<i32> {
        match self.command {
            Commands::Resolve(cmd) => cmd.execute().await,
            Commands::Fetch(cmd) => cmd.execute().await,
        }
    }
}
