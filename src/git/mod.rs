//! Git operations via the system `git` binary.
//!
//! Uses system git (not libgit2) so repository access behaves exactly like
//! the user's own git: same credential helpers, same transport quirks, same
//! redirect handling. Every operation this crate needs is one of three
//! commands - `ls-remote`, a treeless clone, and a checkout - built through
//! [`command_builder::GitCommand`].

pub mod command_builder;

pub use command_builder::GitCommand;
