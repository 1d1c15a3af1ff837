//! The `fetch` subcommand.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::fetchers;
use crate::resolvers;

/// Resolve a question recursively and materialize the final answer.
#[derive(Args)]
pub struct FetchCommand {
    /// What should we try to fetch? A URL or DOI
    question: String,

    /// Where to put the fetched contents; must not exist yet, or be an
    /// empty directory
    output_dir: PathBuf,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl FetchCommand {
    pub async fn execute(self) -> Result<i32> {
        // Validate the output directory before any network work happens
        if self.output_dir.exists() {
            if self.output_dir.is_file() {
                eprintln!(
                    "{} should either not exist, or be an empty directory. Is a file",
                    self.output_dir.display()
                );
                return Ok(1);
            }
            let mut entries = std::fs::read_dir(&self.output_dir)
                .with_context(|| format!("Cannot read {}", self.output_dir.display()))?;
            if entries.next().is_some() {
                eprintln!(
                    "{} should either not exist, or be an empty directory. Is a non-empty directory",
                    self.output_dir.display()
                );
                return Ok(1);
            }
        } else {
            std::fs::create_dir_all(&self.output_dir)
                .with_context(|| format!("Cannot create {}", self.output_dir.display()))?;
        }

        let answers = resolvers::resolve(&self.question, true).await?;

        let Some(last_answer) = answers.last() else {
            eprintln!("Unable to resolve {}", self.question);
            return Ok(1);
        };
        let Some(repo) = last_answer.repo() else {
            // DoesNotExist: the question was understood, the referent is gone
            eprintln!("{last_answer}");
            return Ok(1);
        };

        fetchers::fetch(repo, &self.output_dir).await?;
        Ok(0)
    }
}
