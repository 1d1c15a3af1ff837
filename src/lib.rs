//! repofetch - resolve opaque references to scholarly and source-code
//! artifacts into normalized, fetchable descriptors.
//!
//! A user hands us a URL, a DOI, or an already-structured descriptor; the
//! resolver pipeline repeatedly applies the most specific applicable
//! provider resolver until it arrives at something pinned - a git commit
//! SHA, a Zenodo record id, a Figshare article+version, a content-hashed
//! Drive folder. The fetcher catalog then knows how to materialize each of
//! those into a directory.
//!
//! # Core modules
//!
//! - [`repos`] - the descriptor catalog and answer-certainty type
//! - [`resolvers`] - provider resolvers, the dispatch registry, and the
//!   resolution loop
//! - [`fetchers`] - materialization routines per terminal descriptor kind
//! - [`git`] - system-git command builder
//! - [`utils`] - streaming HTTP, subprocess, hashing, and archive plumbing
//! - [`creds`] - embedded low-privilege credentials
//! - [`cli`] - the command-line front end
//! - [`core`] - error taxonomy and user-facing error display
//!
//! # Example
//!
//! ```rust,no_run
//! use repofetch_cli::resolvers::resolve;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let answers = resolve("https://zenodo.org/records/14007206", true).await?;
//! for answer in &answers {
//!     println!("{answer}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod core;
pub mod creds;
pub mod fetchers;
pub mod git;
pub mod repos;
pub mod resolvers;
pub mod utils;
