//! Type-safe git command builder for consistent command execution.
//!
//! A small fluent API over [`tokio::process::Command`] that centralizes
//! timeout management, output capture, and error shaping for the git
//! invocations this crate performs.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::process::Command;
use tokio::time::timeout;

use crate::core::error::RepofetchError;
use crate::utils::platform::{git_command, require_binary};
use crate::utils::process::ProcessOutput;

/// Builder for constructing and executing git commands.
///
/// Two execution modes:
/// - [`execute`](Self::execute) treats a nonzero exit as a structured error
///   with the command line, exit code, and both streams attached;
/// - [`execute_raw`](Self::execute_raw) hands the exit code and streams back
///   untouched, for callers that interpret failure themselves (the
///   immutable-git resolver pattern-matches `ls-remote` stderr).
///
/// Commands default to a 5 minute timeout.
pub struct GitCommand {
    args: Vec<String>,
    current_dir: Option<PathBuf>,
    timeout_duration: Duration,
}

impl GitCommand {
    /// `git ls-remote -- <repo> <ref>`.
    #[must_use]
    pub fn ls_remote(repo: &str, reference: &str) -> Self {
        Self::new(vec![
            "ls-remote".to_string(),
            "--".to_string(),
            repo.to_string(),
            reference.to_string(),
        ])
    }

    /// `git clone --filter=tree:0 --recurse-submodules <repo> <target>`.
    ///
    /// The treeless filter keeps clones small; submodules come along because
    /// dataset repositories use them for large-file storage more often than
    /// you'd hope.
    #[must_use]
    pub fn clone_treeless(repo: &str, target: &Path) -> Self {
        Self::new(vec![
            "clone".to_string(),
            "--filter=tree:0".to_string(),
            "--recurse-submodules".to_string(),
            repo.to_string(),
            target.to_string_lossy().into_owned(),
        ])
    }

    /// `git checkout <ref>`.
    #[must_use]
    pub fn checkout(reference: &str) -> Self {
        Self::new(vec!["checkout".to_string(), reference.to_string()])
    }

    fn new(args: Vec<String>) -> Self {
        Self { args, current_dir: None, timeout_duration: Duration::from_secs(300) }
    }

    /// Set the working directory for the command.
    #[must_use]
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Override the default 5 minute timeout.
    #[must_use]
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout_duration = duration;
        self
    }

    /// Run the command, returning exit code and captured streams without
    /// judging the exit code.
    pub async fn execute_raw(self) -> Result<ProcessOutput> {
        require_binary(git_command())?;

        let mut command = Command::new(git_command());
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }

        let seconds = self.timeout_duration.as_secs();
        let output = timeout(self.timeout_duration, command.output())
            .await
            .map_err(|_| RepofetchError::SubprocessTimeout {
                command: self.command_line(),
                seconds,
            })?
            .with_context(|| format!("Failed to execute {}", self.command_line()))?;

        Ok(ProcessOutput {
            code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// Run the command and require a zero exit.
    pub async fn execute(self) -> Result<ProcessOutput> {
        let command_line = self.command_line();
        let output = self.execute_raw().await?;
        if output.success() {
            Ok(output)
        } else {
            Err(RepofetchError::SubprocessFailed {
                command: command_line,
                code: output.code,
                stdout: output.stdout,
                stderr: output.stderr,
            }
            .into())
        }
    }

    fn command_line(&self) -> String {
        format!("{} {}", git_command(), self.args.join(" "))
    }
}
