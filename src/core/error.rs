//! Error handling for repofetch.
//!
//! Two layers:
//! - [`RepofetchError`] - strongly typed failure cases the code can match on
//! - [`ErrorContext`] - a display wrapper that adds a suggestion and details
//!   for CLI users
//!
//! `anyhow` carries errors between layers; resolvers attach context with
//! `.context(...)` and never catch transport failures themselves. Note that
//! a referent proven absent is *not* an error anywhere in this crate - that
//! outcome is the `DoesNotExist` answer value.

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The structured error type for repofetch operations.
#[derive(Error, Debug)]
pub enum RepofetchError {
    /// A required external binary (git, rclone) is not installed or not on
    /// PATH.
    #[error("'{name}' is not installed or not found in PATH")]
    BinaryNotFound { name: String },

    /// A subprocess exited nonzero in a way no caller recognized.
    #[error("Command '{command}' failed with exit code {code}\nstdout: {stdout}\nstderr: {stderr}")]
    SubprocessFailed { command: String, code: i32, stdout: String, stderr: String },

    /// A subprocess exceeded its allotted time.
    #[error("Command '{command}' timed out after {seconds} seconds")]
    SubprocessTimeout { command: String, seconds: u64 },

    /// A remote endpoint answered with a status we don't tolerate (404 is a
    /// negative signal handled by resolvers; everything else non-2xx lands
    /// here).
    #[error("Unexpected HTTP status {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    /// A remote endpoint answered 2xx but the body doesn't have the shape
    /// the provider's API promises.
    #[error("Malformed response from {url}: {reason}")]
    MalformedResponse { url: String, reason: String },

    /// The fetch output directory exists and is not an empty directory.
    #[error("{path} should either not exist, or be an empty directory")]
    OutputDirNotEmpty { path: String },

    /// A downloaded file claims an archive type we can't extract.
    #[error("Unsupported archive type: {mime_type}")]
    UnsupportedArchive { mime_type: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// User-facing wrapper pairing an error with a suggestion and details.
pub struct ErrorContext {
    pub error: anyhow::Error,
    pub suggestion: Option<String>,
    pub details: Option<String>,
}

impl ErrorContext {
    #[must_use]
    pub fn new(error: anyhow::Error) -> Self {
        Self { error, suggestion: None, details: None }
    }

    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr with color, including the suggestion when
    /// one is attached.
    pub fn display(&self) {
        eprintln!("{} {}", "Error:".red().bold(), self.error);
        if let Some(details) = &self.details {
            eprintln!("\n{details}");
        }
        if let Some(suggestion) = &self.suggestion {
            eprintln!("\n{} {}", "Suggestion:".yellow().bold(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;
        if let Some(details) = &self.details {
            write!(f, "\n{details}")?;
        }
        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }
        Ok(())
    }
}

/// Convert any error into a user-friendly [`ErrorContext`] with an
/// actionable suggestion where we have one.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    match error.downcast_ref::<RepofetchError>() {
        Some(RepofetchError::BinaryNotFound { name }) if name.starts_with("git") => {
            ErrorContext::new(error)
                .with_suggestion("Install git from https://git-scm.com/ and ensure it is in PATH")
                .with_details(
                    "Repository resolution and fetching shell out to the system git binary",
                )
        }
        Some(RepofetchError::BinaryNotFound { name }) if name.starts_with("rclone") => {
            ErrorContext::new(error)
                .with_suggestion(
                    "Install rclone from https://rclone.org/install/ - it is required for Google Drive folders",
                )
                .with_details(
                    "Google Drive folders are listed and copied through rclone under a built-in read-only identity",
                )
        }
        Some(RepofetchError::HttpStatus { url, .. }) => {
            let details = format!("The failing request was {url}");
            ErrorContext::new(error)
                .with_suggestion("The provider may be down or rate limiting; try again later")
                .with_details(details)
        }
        Some(RepofetchError::OutputDirNotEmpty { .. }) => ErrorContext::new(error)
            .with_suggestion("Pass a path that does not exist yet, or an empty directory"),
        _ => ErrorContext::new(error),
    }
}
