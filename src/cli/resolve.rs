//! The `resolve` subcommand.

use anyhow::Result;
use clap::Args;

use crate::repos::serialize::to_json;
use crate::resolvers;

/// Resolve a question and print each answer, one per line.
#[derive(Args)]
pub struct ResolveCommand {
    /// What should we try to resolve? A URL or DOI
    question: String,

    /// Do not recurse, return after the first answer
    #[arg(long)]
    no_recurse: bool,

    /// Print answers as canonical JSON instead of the readable form
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl ResolveCommand {
    pub async fn execute(self) -> Result<i32> {
        let answers = resolvers::resolve(&self.question, !self.no_recurse).await?;

        if answers.is_empty() {
            println!("Unable to resolve {}", self.question);
            return Ok(1);
        }

        for answer in &answers {
            if self.json {
                println!("{}", to_json(answer)?);
            } else {
                println!("{answer}");
            }
        }

        // A proven-absent referent is an answer, but not a success
        if answers.last().is_some_and(crate::repos::Answer::is_does_not_exist) {
            return Ok(1);
        }
        Ok(0)
    }
}
